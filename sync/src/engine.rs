/// The sync state machine.
///
/// One engine instance exists per process, owned by the host and driven
/// serially by the transport's dispatch loop through three entry points:
/// configuration changes, message deliveries, and the once-per-round
/// scheduling tick. A synchronization episode walks every registered
/// sync-capable service in order: barrier announce, barrier await, service
/// init, process polls until done, then a further barrier whose completion
/// activates the service and selects the next one.
use primitives::{ConfigurationType, NodeId, RingId, SyncMessage};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::barrier::BarrierTracker;
use crate::config::SYNC_GROUP;
use crate::epoch::EpochTracker;
use crate::filter::{self, FilterError, FilterMode};
use crate::registry::{ProcessOutcome, ServiceRegistry};
use crate::scheduler::{EngineTask, RoundScheduler};
use crate::states::SyncState;
use crate::transport::{GroupTransport, TransportError};

/// Invoked when a synchronization episode runs the service sequence to
/// completion.
pub type CompletionHook = Box<dyn FnMut()>;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A synchronization is already in progress or a request is already
    /// outstanding. The caller may retry later.
    #[error("a synchronization is already in progress")]
    Busy,
}

/// What triggered the in-progress episode.
///
/// A resynchronization request may interrupt another requested episode,
/// but never a full-membership one.
#[derive(Debug)]
enum EpisodeKind {
    Full,
    Requested(String),
}

pub struct SyncEngine<T: GroupTransport> {
    transport: T,
    registry: ServiceRegistry,
    completed: CompletionHook,
    filter: FilterMode,
    state: SyncState,
    epoch: EpochTracker,
    barrier: BarrierTracker,
    scheduler: RoundScheduler,
    episode: Option<EpisodeKind>,
    /// Index of the service whose synchronization is underway.
    current: Option<usize>,
    /// Where the next service search starts.
    recovery_index: usize,
}

impl<T: GroupTransport> SyncEngine<T> {
    /// Join the sync group and build an engine with a filter resolved by
    /// name ("none" disables filtering; any other name fails).
    pub fn register(
        transport: T,
        registry: ServiceRegistry,
        completed: CompletionHook,
        filter_name: &str,
    ) -> Result<Self, RegisterError> {
        let filter = filter::load(filter_name)?;
        Self::register_with_filter(transport, registry, completed, filter)
    }

    /// Join the sync group and build an engine around a caller-supplied
    /// filter.
    pub fn register_with_filter(
        mut transport: T,
        registry: ServiceRegistry,
        completed: CompletionHook,
        filter: FilterMode,
    ) -> Result<Self, RegisterError> {
        transport.join(SYNC_GROUP)?;
        match &filter {
            FilterMode::None => info!("not using a virtual synchrony filter"),
            FilterMode::Plugin(plugin) => {
                info!(filter = plugin.name(), "using virtual synchrony filter");
            }
        }
        Ok(Self {
            transport,
            registry,
            completed,
            filter,
            state: SyncState::default(),
            epoch: EpochTracker::new(),
            barrier: BarrierTracker::new(),
            scheduler: RoundScheduler::new(),
            episode: None,
            current: None,
            recovery_index: 0,
        })
    }

    /// Current state machine phase.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Whether a synchronization episode is in progress.
    pub fn in_progress(&self) -> bool {
        self.episode.is_some()
    }

    /// Whether this node is designated primary.
    pub fn is_primary(&self) -> bool {
        match &self.filter {
            FilterMode::None => true,
            FilterMode::Plugin(plugin) => plugin.is_primary(),
        }
    }

    /// Schedule a resynchronization of the named service.
    ///
    /// The request is multicast on a later round tick, retried until the
    /// transport accepts it. Rejected while any synchronization is in
    /// progress or another request is outstanding.
    pub fn request(&mut self, name: &str) -> Result<(), RequestError> {
        if self.in_progress() || self.scheduler.request_armed() {
            return Err(RequestError::Busy);
        }
        self.scheduler.arm_request(name.to_owned());
        debug!(service = %name, "resynchronization request scheduled");
        Ok(())
    }

    /// Membership-configuration notification from the transport.
    ///
    /// Transitional configurations produce no action. A regular
    /// configuration aborts any in-progress episode, replaces the cached
    /// membership and ring id, and, with no filter configured, begins a
    /// round immediately; otherwise the filter's designation arrives via
    /// [`Self::on_primary_designation`].
    pub fn on_configuration_change(
        &mut self,
        configuration: ConfigurationType,
        members: &[NodeId],
        left: &[NodeId],
        joined: &[NodeId],
        ring_id: RingId,
    ) {
        if configuration != ConfigurationType::Regular {
            debug!(%ring_id, "ignoring transitional configuration");
            return;
        }
        if self.in_progress() {
            self.abort_active();
        }
        self.epoch.update(members, ring_id);
        info!(
            %ring_id,
            members = members.len(),
            left = left.len(),
            joined = joined.len(),
            "new membership configuration"
        );
        match &self.filter {
            FilterMode::None => self.on_primary_designation(members, true),
            FilterMode::Plugin(plugin) => {
                debug!(
                    filter = plugin.name(),
                    "awaiting primary designation from filter"
                );
            }
        }
    }

    /// Primary-component designation, either computed internally (no
    /// filter) or wired in from the synchrony filter by the host.
    pub fn on_primary_designation(&mut self, view: &[NodeId], designated: bool) {
        if !designated {
            info!(
                "this node is within the non-primary component \
                 and will not provide any services"
            );
            return;
        }
        info!("this node is within the primary component and will provide service");
        self.begin_round(view, EpisodeKind::Full);
    }

    /// Totally-ordered delivery from the sync group.
    pub fn on_deliver(&mut self, nodeid: NodeId, payload: &[u8], foreign_endian: bool) {
        let message = match SyncMessage::decode(payload, foreign_endian) {
            Ok(message) => message,
            Err(err) => {
                warn!(%nodeid, %err, "discarding undecodable sync message");
                return;
            }
        };
        match message {
            SyncMessage::BarrierStart { ring_id } => {
                self.handle_barrier_start(nodeid, ring_id);
            }
            SyncMessage::Request { ring_id, name } => {
                self.handle_sync_request(nodeid, ring_id, name);
            }
        }
    }

    /// Once-per-round scheduling tick from the transport.
    ///
    /// Fires the armed request task, then the armed engine task.
    pub fn on_round_tick(&mut self) {
        self.fire_request_task();
        self.fire_engine_task();
    }

    fn fire_request_task(&mut self) {
        let Some(name) = self.scheduler.request().map(str::to_owned) else {
            return;
        };
        let Some(ring_id) = self.epoch.ring_id() else {
            warn!(service = %name, "no active ring id, deferring resynchronization request");
            return;
        };
        let payload = SyncMessage::Request {
            ring_id,
            name: name.clone(),
        }
        .encode();
        match self.transport.multicast_joined(&payload) {
            Ok(()) => {
                self.scheduler.cancel_request();
                debug!(service = %name, "resynchronization request multicast");
            }
            Err(err) => {
                debug!(service = %name, %err, "request multicast deferred, retrying next round");
            }
        }
    }

    fn fire_engine_task(&mut self) {
        let Some(task) = self.scheduler.engine().cloned() else {
            return;
        };
        match task {
            EngineTask::Announce(ring_id) => {
                let payload = SyncMessage::BarrierStart { ring_id }.encode();
                match self.transport.multicast_joined(&payload) {
                    Ok(()) => {
                        self.scheduler.cancel_engine();
                        self.set_state(SyncState::AwaitingVotes);
                        debug!(%ring_id, "barrier start announced");
                    }
                    Err(err) => {
                        debug!(%ring_id, %err, "barrier announce deferred, retrying next round");
                    }
                }
            }
            EngineTask::Process(ring_id) => {
                // A tick armed under a superseded round must not touch the
                // service; the task is torn down when the next round begins.
                if self.epoch.ring_id() != Some(ring_id) {
                    return;
                }
                let Some(index) = self.current else {
                    self.scheduler.cancel_engine();
                    return;
                };
                let outcome = match self.registry.get_mut(index) {
                    Some(service) => service.process(),
                    None => {
                        self.scheduler.cancel_engine();
                        return;
                    }
                };
                if outcome == ProcessOutcome::Done {
                    debug!(
                        service = self.registry.name(index).unwrap_or_default(),
                        "local synchronization processing finished"
                    );
                    self.scheduler.cancel_engine();
                    self.start_announce(ring_id);
                }
            }
        }
    }

    fn handle_barrier_start(&mut self, nodeid: NodeId, ring_id: RingId) {
        if self.epoch.ring_id() != Some(ring_id) {
            debug!(%nodeid, %ring_id, "discarding barrier start from superseded round");
            return;
        }
        if self.episode.is_none() {
            debug!(%nodeid, "no synchronization in progress, ignoring barrier start");
            return;
        }

        if self.barrier.mark_completed(nodeid) {
            debug!(%nodeid, "barrier start received");
        } else {
            debug!(%nodeid, "barrier start from node outside the round");
        }
        if !self.barrier.is_complete() {
            return;
        }
        debug!("synchronization barrier completed");

        // The barrier confirms every node finished the current service's
        // local work; commit it, then move on.
        if let Some(index) = self.current.take() {
            if let Some(service) = self.registry.get_mut(index) {
                service.activate();
                debug!(service = service.name(), "committing synchronization");
            }
        }
        self.barrier.reset_votes();
        self.load_next_service(ring_id);
    }

    fn handle_sync_request(&mut self, nodeid: NodeId, ring_id: RingId, name: String) {
        if self.epoch.ring_id() != Some(ring_id) {
            debug!(%nodeid, %ring_id, "discarding sync request from superseded round");
            return;
        }
        match self.episode {
            Some(EpisodeKind::Full) => {
                warn!(
                    service = %name,
                    "ignoring resynchronization request during full synchronization"
                );
                return;
            }
            Some(EpisodeKind::Requested(_)) => self.abort_active(),
            None => {}
        }
        info!(service = %name, from = %nodeid, "resynchronization requested");
        let members = self.epoch.members().to_vec();
        self.begin_round(&members, EpisodeKind::Requested(name));
    }

    /// Start a synchronization episode: rebuild the vote table from the
    /// view list and arm the barrier announce for the active ring.
    fn begin_round(&mut self, view: &[NodeId], kind: EpisodeKind) {
        let Some(ring_id) = self.epoch.ring_id() else {
            warn!("no active ring id, cannot begin synchronization round");
            return;
        };
        if self.in_progress() {
            self.abort_active();
        }
        self.episode = Some(kind);
        self.recovery_index = 0;
        self.current = None;
        self.scheduler.cancel_engine();
        self.barrier.reset_from(view);
        debug!(%ring_id, members = view.len(), "beginning synchronization round");
        self.start_announce(ring_id);
    }

    fn start_announce(&mut self, ring_id: RingId) {
        self.set_state(SyncState::Announcing);
        self.scheduler.arm_engine(EngineTask::Announce(ring_id));
    }

    /// Select the next sync-capable service after the recovery index, or
    /// conclude the episode if none remain.
    fn load_next_service(&mut self, ring_id: RingId) {
        let target = match &self.episode {
            Some(EpisodeKind::Requested(name)) => Some(name.clone()),
            _ => None,
        };
        match self.registry.find_next(self.recovery_index, target.as_deref()) {
            Some(index) => {
                self.current = Some(index);
                self.recovery_index = index + 1;
                self.set_state(SyncState::ServiceRunning);
                if let Some(service) = self.registry.get_mut(index) {
                    debug!(service = service.name(), "synchronization actions starting");
                    service.init();
                }
                self.scheduler.arm_engine(EngineTask::Process(ring_id));
            }
            None => {
                self.episode = None;
                self.current = None;
                self.set_state(SyncState::Idle);
                info!("synchronization completed");
                (self.completed)();
            }
        }
    }

    /// Interrupt the in-progress episode.
    ///
    /// The active service's abort hook runs first (a no-op unless the
    /// service overrides it) and its pending activation is suppressed
    /// either way.
    fn abort_active(&mut self) {
        if let Some(index) = self.current.take() {
            if let Some(service) = self.registry.get_mut(index) {
                info!(service = service.name(), "aborting in-progress synchronization");
                service.abort();
            }
        }
        self.episode = None;
        self.scheduler.cancel_engine();
        self.set_state(SyncState::Idle);
    }

    fn set_state(&mut self, target: SyncState) {
        if self.state == target {
            return;
        }
        if !self.state.can_transition_to(target) {
            warn!(
                from = ?self.state,
                to = ?target,
                "invalid state transition attempted"
            );
            return;
        }
        self.state = target;
    }

    #[cfg(test)]
    pub(crate) fn barrier_tracker(&self) -> &BarrierTracker {
        &self.barrier
    }

    #[cfg(test)]
    pub(crate) fn scheduler_mut(&mut self) -> &mut RoundScheduler {
        &mut self.scheduler
    }
}
