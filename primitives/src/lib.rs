pub mod message;
pub mod ring;
pub mod types;

pub use message::{CodecError, SyncMessage};
pub use ring::RingId;
pub use types::{ConfigurationType, NodeId};
