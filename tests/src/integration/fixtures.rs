//! Session builders shared by the integration flows.

use df_02_shm::SegmentRegistry;
use node_runtime::{Node, Outgoing, RuntimeConfig, Session};
use shared_types::ids::MASTER_HUB;
use shared_types::message::{AddPort, Started};
use shared_types::{Message, Port, PortKind, ProcessId};
use std::sync::Arc;

pub const SEGMENT_SIZE: usize = 1 << 22;

/// A session with a master hub on `node01` and an empty `node02`.
pub struct Fixture {
    pub session: Session,
    pub hub: Arc<Node>,
    pub node01: Arc<SegmentRegistry>,
    pub node02: Arc<SegmentRegistry>,
}

#[derive(Debug, Clone, Copy)]
pub enum Host {
    Node01,
    Node02,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_session(Session::new())
    }

    pub fn with_session(mut session: Session) -> Self {
        let node01 = Arc::new(SegmentRegistry::new());
        let node02 = Arc::new(SegmentRegistry::new());
        let hub = session.add(
            Node::new(RuntimeConfig::hub(MASTER_HUB, "node01"), node01.clone())
                .expect("hub config is valid"),
        );
        Self {
            session,
            hub,
            node01,
            node02,
        }
    }

    /// Add the manager of `host`'s modules.
    pub fn manager(&mut self, host: Host) -> Arc<Node> {
        let (name, segments) = self.host(host);
        self.session.add_manager(
            Node::new(RuntimeConfig::manager(MASTER_HUB, name), segments)
                .expect("manager config is valid"),
        )
    }

    fn host(&self, host: Host) -> (&'static str, Arc<SegmentRegistry>) {
        match host {
            Host::Node01 => ("node01", self.node01.clone()),
            Host::Node02 => ("node02", self.node02.clone()),
        }
    }

    pub fn module(&mut self, id: ProcessId, host: Host) -> Arc<Node> {
        let (name, segments) = self.host(host);
        let config = RuntimeConfig::module(id, 0, name).with_segment_size(SEGMENT_SIZE);
        self.session
            .add(Node::new(config, segments).expect("module config is valid"))
    }

    /// Announce `node` and its ports to the hub.
    pub async fn start(&self, node: &Node, name: &str, ports: &[(&str, PortKind)]) {
        let mut out: Vec<Outgoing> = Vec::new();
        let mut started = Message::new(Started { name: name.into() });
        node.ctx().stamp(&mut started);
        out.push(started.into());
        for (port, kind) in ports {
            out.push(stamped(
                node,
                Message::new(AddPort::new(&Port::new(node.id(), *port, *kind, 0))),
            ));
        }
        self.session.pump(out).await.expect("announcements delivered");
    }
}

/// `msg` with `node` as its sender.
pub fn stamped(node: &Node, mut msg: Message) -> Outgoing {
    node.ctx().stamp(&mut msg);
    msg.into()
}
