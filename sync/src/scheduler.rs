/// Round-scheduled task slots.
///
/// The transport fires a scheduling hook at most once per communication
/// round; the engine uses it for non-blocking retries and for the service
/// process-phase poll. Two slots exist, one for the engine's own task and
/// one for an outgoing resync request. Arming an occupied slot replaces
/// its task (a reschedule, not a queue); cancelling clears it.
use primitives::RingId;

/// Task occupying the engine slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineTask {
    /// Multicast the barrier-start announce for the round, retrying until
    /// the transport accepts it.
    Announce(RingId),
    /// Poll the active service's process callback.
    Process(RingId),
}

#[derive(Debug, Default, Clone)]
pub struct RoundScheduler {
    engine: Option<EngineTask>,
    request: Option<String>,
}

impl RoundScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm_engine(&mut self, task: EngineTask) {
        self.engine = Some(task);
    }

    pub fn cancel_engine(&mut self) {
        self.engine = None;
    }

    pub fn engine(&self) -> Option<&EngineTask> {
        self.engine.as_ref()
    }

    pub fn arm_request(&mut self, name: String) {
        self.request = Some(name);
    }

    pub fn cancel_request(&mut self) {
        self.request = None;
    }

    pub fn request(&self) -> Option<&str> {
        self.request.as_deref()
    }

    pub fn request_armed(&self) -> bool {
        self.request.is_some()
    }
}
