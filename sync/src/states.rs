/// Sync engine state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Idle state: no synchronization episode in progress.
    ///
    /// Initial state, and the state entered after an abort or after the
    /// service sequence is exhausted.
    Idle,

    /// Announcing state: the barrier-start multicast is armed.
    ///
    /// The round scheduler retries the multicast every communication round
    /// until the transport accepts it; flow-control rejections are
    /// transient and never surface.
    Announcing,

    /// Awaiting-votes state: the announce was accepted, and the engine is
    /// collecting barrier arrivals from the current members.
    ///
    /// The barrier is satisfied once every member of the round's vote
    /// table has announced.
    AwaitingVotes,

    /// Service-running state: the active service's `init` has run and its
    /// `process` callback is polled once per round until it reports done.
    ServiceRunning,
}

impl SyncState {
    /// Check if a transition to the target state is valid.
    ///
    /// Every transition the engine performs is encoded here; an invalid
    /// transition indicates a logic error and is refused with a warning.
    pub fn can_transition_to(&self, target: SyncState) -> bool {
        match self {
            SyncState::Idle => matches!(target, SyncState::Announcing),
            SyncState::Announcing => {
                matches!(target, SyncState::AwaitingVotes | SyncState::Idle)
            }
            SyncState::AwaitingVotes => {
                matches!(target, SyncState::ServiceRunning | SyncState::Idle)
            }
            SyncState::ServiceRunning => {
                matches!(target, SyncState::Announcing | SyncState::Idle)
            }
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Idle
    }
}
