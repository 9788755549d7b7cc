use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use primitives::{ConfigurationType, NodeId, RingId};
use sync::{
    FilterMode, GroupTransport, ProcessOutcome, ServiceRegistry, SyncEngine, Synchronizable,
    TransportError,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
struct Args {
    /// Node identifier for the single-node ring.
    #[arg(short, long, default_value_t = 1)]
    node_id: u32,

    /// Process polls each demo service performs before reporting done.
    #[arg(short, long, default_value_t = 2)]
    polls: usize,

    /// Milliseconds between communication rounds.
    #[arg(short, long, default_value_t = 50)]
    round_interval: u64,
}

/// Single-node stand-in for the group-messaging layer: multicasts are
/// queued and delivered back to this node, which is the whole membership.
struct LoopbackTransport {
    queue: Rc<RefCell<VecDeque<Vec<u8>>>>,
}

impl GroupTransport for LoopbackTransport {
    fn join(&mut self, group: &str) -> Result<(), TransportError> {
        debug!(group = group, "joined process group");
        Ok(())
    }

    fn multicast_joined(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        self.queue.borrow_mut().push_back(payload.to_vec());
        Ok(())
    }
}

/// Demo service: simulates staged recovery with a fixed number of
/// process polls.
struct DemoService {
    name: &'static str,
    polls: usize,
    polls_remaining: usize,
}

impl DemoService {
    fn new(name: &'static str, polls: usize) -> Self {
        Self {
            name,
            polls,
            polls_remaining: 0,
        }
    }
}

impl Synchronizable for DemoService {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self) {
        self.polls_remaining = self.polls;
        info!(service = self.name, "recovery started");
    }

    fn process(&mut self) -> ProcessOutcome {
        if self.polls_remaining > 0 {
            self.polls_remaining -= 1;
            debug!(
                service = self.name,
                remaining = self.polls_remaining,
                "recovery step"
            );
            ProcessOutcome::MoreWork
        } else {
            ProcessOutcome::Done
        }
    }

    fn activate(&mut self) {
        info!(service = self.name, "recovered state activated");
    }

    fn abort(&mut self) {
        info!(service = self.name, "recovery aborted");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let queue = Rc::new(RefCell::new(VecDeque::new()));
    let transport = LoopbackTransport {
        queue: queue.clone(),
    };

    let mut registry = ServiceRegistry::new();
    registry.register(Box::new(DemoService::new("ckpt", args.polls)));
    registry.register(Box::new(DemoService::new("evt", args.polls)));

    let mut engine = SyncEngine::register_with_filter(
        transport,
        registry,
        Box::new(|| info!("synchronization episode finished")),
        FilterMode::None,
    )?;

    let node = NodeId(args.node_id);
    let ring_id = RingId::new(node, 1);
    engine.on_configuration_change(ConfigurationType::Regular, &[node], &[], &[node], ring_id);

    let mut interval = tokio::time::interval(Duration::from_millis(args.round_interval));
    let mut requested = false;
    loop {
        interval.tick().await;
        engine.on_round_tick();
        loop {
            let payload = queue.borrow_mut().pop_front();
            match payload {
                Some(payload) => engine.on_deliver(node, &payload, false),
                None => break,
            }
        }
        if !engine.in_progress() {
            if requested {
                break;
            }
            // Follow the full episode with a targeted resync of one
            // service.
            requested = true;
            engine.request("evt")?;
        }
    }

    info!("demo complete");
    Ok(())
}
