/// Registry of synchronizable services.
///
/// Services register in a fixed order; a synchronization episode walks
/// them by index, selecting each sync-capable entry in turn.

/// Result of one bounded `process` poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Local recovery work remains; poll again next round.
    MoreWork,
    /// This node's local work for the service is finished.
    Done,
}

/// Recovery capability contract a participating service exposes.
///
/// For each service the engine invokes `init` once, polls `process` until
/// it reports `Done`, and calls `activate` once the cluster-wide barrier
/// confirms every node finished. `abort` is invoked when the episode is
/// interrupted; the default body does nothing, for services with no
/// resources to release. Long recovery work must be broken into bounded
/// `process` polls; nothing here may block.
pub trait Synchronizable {
    fn name(&self) -> &str;

    /// Whether this registry entry participates in synchronization.
    ///
    /// Entries that return false are skipped by the recovery iterator.
    fn sync_capable(&self) -> bool {
        true
    }

    fn init(&mut self);

    fn process(&mut self) -> ProcessOutcome;

    /// Commit the resynchronized state as authoritative.
    fn activate(&mut self);

    /// Release any resources held by an interrupted synchronization.
    fn abort(&mut self) {}
}

/// Ordered set of registered services.
#[derive(Default)]
pub struct ServiceRegistry {
    services: Vec<Box<dyn Synchronizable>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: Box<dyn Synchronizable>) {
        self.services.push(service);
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn Synchronizable + 'static)> {
        self.services.get_mut(index).map(|service| &mut **service)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.services.get(index).map(|service| service.name())
    }

    /// Index of the next sync-capable service at or after `from`.
    ///
    /// When `target` is set (a requested synchronization), only the named
    /// service matches.
    pub fn find_next(&self, from: usize, target: Option<&str>) -> Option<usize> {
        self.services
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, service)| {
                service.sync_capable()
                    && target.map_or(true, |name| service.name() == name)
            })
            .map(|(index, _)| index)
    }
}
