/// Seam to the reliable group-messaging transport.
///
/// The transport delivers totally-ordered messages to every member of a
/// joined process group, including the sender, and reports membership
/// changes tagged with a ring id. Delivery and configuration events reach
/// the engine through its entry points; this trait covers the outbound
/// half.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The multicast was rejected by flow control. Transient; the caller
    /// retries on a later round.
    #[error("multicast rejected by flow control")]
    FlowControl,
    /// The process group could not be joined.
    #[error("failed to join group {0:?}")]
    JoinFailed(String),
}

pub trait GroupTransport {
    /// Join a process group, making this node a delivery target for its
    /// traffic.
    fn join(&mut self, group: &str) -> Result<(), TransportError>;

    /// Multicast a payload to every member of the joined group, in agreed
    /// (total) order.
    fn multicast_joined(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}
