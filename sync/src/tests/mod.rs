
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use primitives::{ConfigurationType, NodeId, RingId, SyncMessage};

use crate::engine::SyncEngine;
use crate::filter::{FilterMode, SynchronyFilter};
use crate::registry::{ProcessOutcome, ServiceRegistry, Synchronizable};
use crate::transport::{GroupTransport, TransportError};

pub(crate) fn ring(seq: u64) -> RingId {
    RingId::new(NodeId(1), seq)
}

/// Transport double: records every multicast and can be told to reject
/// upcoming sends with flow control.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    inner: Rc<RefCell<TransportState>>,
}

#[derive(Default)]
struct TransportState {
    joined: Vec<String>,
    sent: Vec<Vec<u8>>,
    reject_sends: usize,
    fail_join: bool,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_join() -> Self {
        let transport = Self::default();
        transport.inner.borrow_mut().fail_join = true;
        transport
    }

    pub(crate) fn reject_next_sends(&self, count: usize) {
        self.inner.borrow_mut().reject_sends = count;
    }

    pub(crate) fn joined(&self) -> Vec<String> {
        self.inner.borrow().joined.clone()
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().sent.clone()
    }

    pub(crate) fn sent_messages(&self) -> Vec<SyncMessage> {
        self.sent()
            .iter()
            .map(|payload| SyncMessage::decode(payload, false).unwrap())
            .collect()
    }
}

impl GroupTransport for RecordingTransport {
    fn join(&mut self, group: &str) -> Result<(), TransportError> {
        let mut state = self.inner.borrow_mut();
        if state.fail_join {
            return Err(TransportError::JoinFailed(group.to_owned()));
        }
        state.joined.push(group.to_owned());
        Ok(())
    }

    fn multicast_joined(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut state = self.inner.borrow_mut();
        if state.reject_sends > 0 {
            state.reject_sends -= 1;
            return Err(TransportError::FlowControl);
        }
        state.sent.push(payload.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct ServiceLog {
    pub(crate) calls: Vec<&'static str>,
    pub(crate) polls_remaining: usize,
}

/// Service double recording every callback invocation. Overrides `abort`
/// and `sync_capable`.
#[derive(Clone)]
pub(crate) struct ScriptedService {
    name: String,
    sync_capable: bool,
    inner: Rc<RefCell<ServiceLog>>,
}

impl ScriptedService {
    pub(crate) fn new(name: &str) -> Self {
        Self::with_polls(name, 0)
    }

    /// `process` reports more work this many times before finishing.
    pub(crate) fn with_polls(name: &str, polls: usize) -> Self {
        Self {
            name: name.to_owned(),
            sync_capable: true,
            inner: Rc::new(RefCell::new(ServiceLog {
                calls: Vec::new(),
                polls_remaining: polls,
            })),
        }
    }

    pub(crate) fn non_sync(name: &str) -> Self {
        let mut service = Self::new(name);
        service.sync_capable = false;
        service
    }

    pub(crate) fn set_polls(&self, polls: usize) {
        self.inner.borrow_mut().polls_remaining = polls;
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.inner.borrow().calls.clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|recorded| **recorded == call)
            .count()
    }
}

impl Synchronizable for ScriptedService {
    fn name(&self) -> &str {
        &self.name
    }

    fn sync_capable(&self) -> bool {
        self.sync_capable
    }

    fn init(&mut self) {
        self.inner.borrow_mut().calls.push("init");
    }

    fn process(&mut self) -> ProcessOutcome {
        let mut state = self.inner.borrow_mut();
        state.calls.push("process");
        if state.polls_remaining > 0 {
            state.polls_remaining -= 1;
            ProcessOutcome::MoreWork
        } else {
            ProcessOutcome::Done
        }
    }

    fn activate(&mut self) {
        self.inner.borrow_mut().calls.push("activate");
    }

    fn abort(&mut self) {
        self.inner.borrow_mut().calls.push("abort");
    }
}

/// Service double that keeps the trait's default (empty) `abort` body.
#[derive(Clone)]
pub(crate) struct MinimalService {
    name: String,
    inner: Rc<RefCell<ServiceLog>>,
}

impl MinimalService {
    pub(crate) fn with_polls(name: &str, polls: usize) -> Self {
        Self {
            name: name.to_owned(),
            inner: Rc::new(RefCell::new(ServiceLog {
                calls: Vec::new(),
                polls_remaining: polls,
            })),
        }
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.inner.borrow().calls.clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|recorded| **recorded == call)
            .count()
    }
}

impl Synchronizable for MinimalService {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self) {
        self.inner.borrow_mut().calls.push("init");
    }

    fn process(&mut self) -> ProcessOutcome {
        let mut state = self.inner.borrow_mut();
        state.calls.push("process");
        if state.polls_remaining > 0 {
            state.polls_remaining -= 1;
            ProcessOutcome::MoreWork
        } else {
            ProcessOutcome::Done
        }
    }

    fn activate(&mut self) {
        self.inner.borrow_mut().calls.push("activate");
    }
}

/// Synchrony filter double with an externally flippable designation.
pub(crate) struct StaticFilter {
    name: String,
    primary: Rc<Cell<bool>>,
}

impl StaticFilter {
    pub(crate) fn new(name: &str, primary: bool) -> (Self, Rc<Cell<bool>>) {
        let flag = Rc::new(Cell::new(primary));
        (
            Self {
                name: name.to_owned(),
                primary: flag.clone(),
            },
            flag,
        )
    }
}

impl SynchronyFilter for StaticFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_primary(&self) -> bool {
        self.primary.get()
    }
}

pub(crate) struct Harness {
    pub(crate) engine: SyncEngine<RecordingTransport>,
    pub(crate) transport: RecordingTransport,
    pub(crate) completions: Rc<Cell<usize>>,
    delivered: usize,
}

impl Harness {
    pub(crate) fn new(registry: ServiceRegistry) -> Self {
        Self::with_filter(registry, FilterMode::None)
    }

    pub(crate) fn with_filter(registry: ServiceRegistry, filter: FilterMode) -> Self {
        let transport = RecordingTransport::new();
        let completions = Rc::new(Cell::new(0));
        let hook_counter = completions.clone();
        let engine = SyncEngine::register_with_filter(
            transport.clone(),
            registry,
            Box::new(move || hook_counter.set(hook_counter.get() + 1)),
            filter,
        )
        .unwrap();
        Self {
            engine,
            transport,
            completions,
            delivered: 0,
        }
    }

    pub(crate) fn configure(&mut self, members: &[u32], ring_id: RingId) {
        let members: Vec<NodeId> = members.iter().copied().map(NodeId).collect();
        self.engine.on_configuration_change(
            ConfigurationType::Regular,
            &members,
            &[],
            &[],
            ring_id,
        );
    }

    pub(crate) fn deliver_barrier(&mut self, node: u32, ring_id: RingId) {
        let payload = SyncMessage::BarrierStart { ring_id }.encode();
        self.engine.on_deliver(NodeId(node), &payload, false);
    }

    pub(crate) fn deliver_barrier_from_all(&mut self, members: &[u32], ring_id: RingId) {
        for node in members {
            self.deliver_barrier(*node, ring_id);
        }
    }

    pub(crate) fn deliver_request(&mut self, node: u32, ring_id: RingId, name: &str) {
        let payload = SyncMessage::Request {
            ring_id,
            name: name.to_owned(),
        }
        .encode();
        self.engine.on_deliver(NodeId(node), &payload, false);
    }

    /// Feed captured multicasts back as deliveries, as if every member
    /// announced in the same round this node did.
    pub(crate) fn pump_deliveries(&mut self, members: &[u32]) {
        loop {
            let sent = self.transport.sent();
            if self.delivered >= sent.len() {
                return;
            }
            let payload = sent[self.delivered].clone();
            self.delivered += 1;
            match SyncMessage::decode(&payload, false).unwrap() {
                SyncMessage::BarrierStart { .. } => {
                    for node in members {
                        self.engine.on_deliver(NodeId(*node), &payload, false);
                    }
                }
                SyncMessage::Request { .. } => {
                    self.engine.on_deliver(NodeId(members[0]), &payload, false);
                }
            }
        }
    }

    /// Tick and deliver until no episode is in progress.
    pub(crate) fn drive_to_idle(&mut self, members: &[u32]) {
        for _ in 0..64 {
            self.engine.on_round_tick();
            self.pump_deliveries(members);
            if !self.engine.in_progress() {
                return;
            }
        }
        panic!("engine did not reach idle");
    }
}
