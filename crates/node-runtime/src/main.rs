//! # Dataflow Node Runtime
//!
//! Runs a small in-memory session to exercise the coordination core:
//!
//! ```text
//!  node01: hub ─┬─ Reader(5) ──grid (handle)──▶ Mapper(7)
//!               │       └──────grid (bytes)───▶ Renderer(9)   node02
//!               └─ barrier over 5, 7, 9
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging from the environment
//! 2. Attach modules to the segment of their host
//! 3. Announce modules and ports to the hub
//! 4. Transfer one object per host, then synchronize on a barrier
//! 5. Print the hub's session state and release outstanding objects

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use df_02_shm::{Object, Points, SegmentRegistry};
use df_telemetry::{init_logging, TelemetryConfig};
use node_runtime::{Node, Outgoing, RuntimeConfig, Session};
use shared_types::ids::MASTER_HUB;
use shared_types::message::{AddPort, Started};
use shared_bus::{InMemoryMessageBus, MessageFilter};
use shared_types::{Message, MessageType, Meta, Port, PortKind, ProcessId};
use tracing::{info, warn};

const READER: ProcessId = 5;
const MAPPER: ProcessId = 7;
const RENDERER: ProcessId = 9;

/// Started and AddPort announcements of one module.
fn announcements(node: &Node, name: &str, ports: &[(&str, PortKind)]) -> Vec<Outgoing> {
    let mut out = Vec::with_capacity(ports.len() + 1);
    let mut started = Message::new(Started { name: name.into() });
    node.ctx().stamp(&mut started);
    out.push(started.into());
    for (port, kind) in ports {
        let mut add = Message::new(AddPort::new(&Port::new(node.id(), *port, *kind, 0)));
        node.ctx().stamp(&mut add);
        out.push(add.into());
    }
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::for_process("runtime")).context("logging setup failed")?;

    let base = RuntimeConfig::from_env();
    let local = Arc::new(SegmentRegistry::new());
    let remote = Arc::new(SegmentRegistry::new());

    let bus = Arc::new(InMemoryMessageBus::new());
    let mut receipts = bus.subscribe(MessageFilter::types(vec![MessageType::ObjectReceived]));
    let mut session = Session::new().with_observer(bus);
    let hub = session.add(Node::new(RuntimeConfig::hub(MASTER_HUB, &base.host), local.clone())?);
    let manager = session.add_manager(Node::new(
        RuntimeConfig::manager(MASTER_HUB, &base.host),
        local.clone(),
    )?);
    let reader = session.add(Node::new(
        RuntimeConfig::module(READER, 0, &base.host).with_segment_size(base.shm.initial_size),
        local.clone(),
    )?);
    let mapper = session.add(Node::new(RuntimeConfig::module(MAPPER, 0, &base.host), local)?);
    let renderer = session.add(Node::new(RuntimeConfig::module(RENDERER, 0, "node02"), remote)?);

    let mut hello = announcements(&reader, "Reader", &[("grid_out", PortKind::Output)]);
    hello.extend(announcements(&mapper, "Mapper", &[("grid_in", PortKind::Input)]));
    hello.extend(announcements(&renderer, "Renderer", &[("grid_in", PortKind::Input)]));
    session.pump(hello).await?;

    let shm = reader.ctx().shm()?;
    let points = Points::new(
        &shm,
        Meta::default().with_num_blocks(1),
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
        vec![0.0, 0.0, 0.0],
    )?;
    let grid: Object = points.into();
    info!(object = grid.name(), "Created grid");

    let sends = vec![
        reader.objects().send(&grid, "grid_out", MAPPER, "grid_in", 0)?.into(),
        reader.objects().send(&grid, "grid_out", RENDERER, "grid_in", 0)?.into(),
    ];
    session.pump(sends).await?;
    info!(relayed = manager.relayed(), "Manager relayed announcements");

    while let Ok(Some(receipt)) = receipts.try_recv() {
        info!(module = receipt.sender_id(), "ObjectReceived observed");
    }
    for node in [&mapper, &renderer] {
        match node.objects().next_received() {
            Some(r) => info!(
                module = node.id(),
                port = %r.port,
                object = r.object.name(),
                shared = r.object.same_as(&grid),
                "Grid arrived"
            ),
            None => warn!(module = node.id(), "Grid missing"),
        }
    }

    let (uuid, barrier) = hub.barrier().begin(&[READER, MAPPER, RENDERER])?;
    session
        .pump(barrier.into_iter().map(Outgoing::from).collect())
        .await?;
    tokio::time::timeout(Duration::from_secs(5), hub.barrier().wait(uuid))
        .await
        .context("barrier timed out")??;
    info!(%uuid, "Barrier reached");

    let state = serde_json::to_string_pretty(&hub.ctx().tracker().snapshot())?;
    println!("{state}");

    for node in [&hub, &reader, &mapper, &renderer] {
        node.ctx().shutdown();
    }
    Ok(())
}
