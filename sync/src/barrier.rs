/// Per-round barrier completion votes.
///
/// One table per round, one entry per member. The table is rebuilt
/// wholesale when a round begins and never grows afterwards; nodes that
/// join mid-barrier are picked up by the next configuration change.
use primitives::NodeId;
use tracing::warn;

use crate::config::MAX_MEMBERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierVote {
    pub nodeid: NodeId,
    pub completed: bool,
}

/// Completion-vote table for the current barrier round.
#[derive(Debug, Default, Clone)]
pub struct BarrierTracker {
    votes: Vec<BarrierVote>,
}

impl BarrierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table from a member list, every vote incomplete.
    pub fn reset_from(&mut self, members: &[NodeId]) {
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

        self.votes.clear();
        self.votes.extend(members.iter().map(|nodeid| BarrierVote {
            nodeid: *nodeid,
            completed: false,
        }));
    }

    /// Mark a member's arrival at the barrier.
    ///
    /// Idempotent; arrivals from nodes outside the round's member set are
    /// ignored. Returns whether the node was found in the table.
    pub fn mark_completed(&mut self, nodeid: NodeId) -> bool {
        match self.votes.iter_mut().find(|vote| vote.nodeid == nodeid) {
            Some(vote) => {
                vote.completed = true;
                true
            }
            None => false,
        }
    }

    /// Whether every member of the round has arrived.
    pub fn is_complete(&self) -> bool {
        self.votes.iter().all(|vote| vote.completed)
    }

    /// Clear every vote for the next service's round, keeping the member
    /// set.
    pub fn reset_votes(&mut self) {
        for vote in &mut self.votes {
            vote.completed = false;
        }
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn votes(&self) -> &[BarrierVote] {
        &self.votes
    }
}
