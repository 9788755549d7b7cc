/// Active ring epoch and cached membership.
///
/// Updated only by regular configuration-change notifications from the
/// transport. Requested synchronizations reuse the cached member list and
/// ring id, since no membership event accompanies them.
use primitives::{NodeId, RingId};
use tracing::warn;

use crate::config::MAX_MEMBERS;

#[derive(Debug, Default, Clone)]
pub struct EpochTracker {
    ring_id: Option<RingId>,
    members: Vec<NodeId>,
}

impl EpochTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached member list and ring id for a new epoch.
    pub fn update(&mut self, members: &[NodeId], ring_id: RingId) {
        let members = if members.len() > MAX_MEMBERS {
            warn!(
                members = members.len(),
                max = MAX_MEMBERS,
                "member list exceeds maximum cluster size, truncating"
            );
            &members[..MAX_MEMBERS]
        } else {
            members
        };

        self.members.clear();
        self.members.extend_from_slice(members);
        self.ring_id = Some(ring_id);
    }

    /// The active ring id, once a configuration has been observed.
    pub fn ring_id(&self) -> Option<RingId> {
        self.ring_id
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }
}
