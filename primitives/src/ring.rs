use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::NodeId;

/// Identifier of one stable membership epoch.
///
/// Minted only by the transport on configuration change. The pair is
/// compared field-wise: messages stamped with a ring id other than the
/// locally active one belong to a superseded round and are discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RingId {
    /// Representative node of the ring (the originating address).
    pub rep: NodeId,
    /// Monotonically increasing sequence number.
    pub seq: u64,
}

impl RingId {
    pub fn new(rep: NodeId, seq: u64) -> Self {
        Self { rep, seq }
    }
}

impl fmt::Display for RingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.rep, self.seq)
    }
}
