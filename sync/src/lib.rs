pub mod barrier;
/// Synchronization barrier engine for the cluster membership stack.
///
/// When cluster membership changes, or a targeted resync is requested,
/// every live node runs each registered service's recovery callbacks in
/// lock-step behind a distributed barrier before delivering normal traffic
/// for the new configuration. This crate provides:
///
/// - **Barrier Tracker**: per-round completion votes, one per member
/// - **Epoch Tracker**: the active ring id and cached member list
/// - **Service Registry**: ordered sync-capable services and the iterator
///   that walks them
/// - **Round Scheduler**: retry/poll tasks fired once per communication
///   round
/// - **Sync Engine**: the state machine driving announce, await, service
///   init/process/activate, and abort
///
/// ## State Machine
///
/// - **IDLE**: no synchronization episode in progress
/// - **ANNOUNCING**: retrying the barrier-start multicast each round
/// - **AWAITING VOTES**: barrier announced, collecting member arrivals
/// - **SERVICE RUNNING**: the active service's process phase is polled
///   each round
///
/// The engine is a single owned instance; every entry point takes
/// `&mut self` and is called serially from the transport's dispatch
/// context. There is no internal locking.
pub mod config;
pub mod engine;
pub mod epoch;
pub mod filter;
pub mod registry;
pub mod scheduler;
pub mod states;
pub mod transport;

pub use barrier::{BarrierTracker, BarrierVote};
pub use config::*;
pub use engine::{CompletionHook, RegisterError, RequestError, SyncEngine};
pub use epoch::EpochTracker;
pub use filter::{FilterError, FilterMode, SynchronyFilter};
pub use registry::{ProcessOutcome, ServiceRegistry, Synchronizable};
pub use scheduler::{EngineTask, RoundScheduler};
pub use states::SyncState;
pub use transport::{GroupTransport, TransportError};

#[cfg(test)]
mod tests;
