//! Replicated session state
//!
//! Hubs keep a [`StateTracker`] fed with every message flagged `TRACK`. It
//! knows which hubs and modules exist, where each module is in its lifecycle,
//! and the ports, parameters, policies and connections of every module.
//! A module exit removes all of its state and remembers the id, so later
//! messages addressed to it can be dropped. Only the most recent
//! [`EXITED_REMEMBERED`] ids are kept; module ids are never reused, so an
//! unknown id at or below the oldest forgotten one has exited as well.

use serde::Serialize;
use shared_types::ids::{is_module, INVALID};
use shared_types::message::{
    AddHub, Connection, ObjectReceivePolicy, Payload, ReducePolicy, SchedulingPolicy,
};
use shared_types::{Message, MessageType, Parameter, Port, ProcessId};
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use tracing::{debug, warn};

/// Exited module ids kept individually.
pub const EXITED_REMEMBERED: usize = 1024;

/// Where a module is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModuleLifecycle {
    /// Spawn requested, process not running yet.
    Spawning,
    /// Running and idle.
    Started,
    /// Running an execution.
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubState {
    pub id: ProcessId,
    pub name: String,
    pub port: u16,
    pub address: Option<IpAddr>,
}

impl From<&AddHub> for HubState {
    fn from(add: &AddHub) -> Self {
        Self {
            id: add.id,
            name: add.name.as_str().to_string(),
            port: add.port,
            address: add.address(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleState {
    pub id: ProcessId,
    pub hub: ProcessId,
    pub name: String,
    pub lifecycle: ModuleLifecycle,
    pub ports: BTreeMap<String, Port>,
    pub parameters: BTreeMap<String, Parameter>,
    pub object_policy: ObjectReceivePolicy,
    pub scheduling_policy: SchedulingPolicy,
    pub reduce_policy: ReducePolicy,
}

impl ModuleState {
    fn new(id: ProcessId, hub: ProcessId, name: &str, lifecycle: ModuleLifecycle) -> Self {
        Self {
            id,
            hub,
            name: name.to_string(),
            lifecycle,
            ports: BTreeMap::new(),
            parameters: BTreeMap::new(),
            object_policy: ObjectReceivePolicy::default(),
            scheduling_policy: SchedulingPolicy::default(),
            reduce_policy: ReducePolicy::default(),
        }
    }
}

/// Directed link from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Link {
    pub from: ProcessId,
    pub from_port: String,
    pub to: ProcessId,
    pub to_port: String,
}

impl From<&Connection> for Link {
    fn from(c: &Connection) -> Self {
        Self {
            from: c.module_a,
            from_port: c.port_a.as_str().to_string(),
            to: c.module_b,
            to_port: c.port_b.as_str().to_string(),
        }
    }
}

/// A module executable a hub offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableModule {
    pub hub: ProcessId,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Default)]
pub struct StateTracker {
    hubs: BTreeMap<ProcessId, HubState>,
    modules: BTreeMap<ProcessId, ModuleState>,
    links: BTreeSet<Link>,
    available: Vec<AvailableModule>,
    exited: BTreeSet<ProcessId>,
    /// Highest exited id no longer kept in `exited`.
    forgotten_through: ProcessId,
    traced: BTreeMap<ProcessId, BTreeSet<MessageType>>,
}

impl StateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `msg`. Returns `false` when it refers to state not known yet.
    pub fn handle(&mut self, msg: &Message) -> bool {
        let sender = msg.sender_id();
        match msg.payload() {
            Payload::AddHub(add) => {
                debug!(hub = add.id, name = %add.name, "Hub added");
                self.hubs.insert(add.id, HubState::from(add));
                true
            }
            Payload::RemoveSlave(rm) => {
                self.hubs.remove(&rm.id);
                let gone: Vec<ProcessId> = self
                    .modules
                    .values()
                    .filter(|m| m.hub == rm.id)
                    .map(|m| m.id)
                    .collect();
                for id in gone {
                    self.remove_module(id);
                }
                self.available.retain(|a| a.hub != rm.id);
                true
            }
            Payload::Spawn(spawn) => {
                if spawn.spawn_id == INVALID {
                    return false;
                }
                self.modules.insert(
                    spawn.spawn_id,
                    ModuleState::new(
                        spawn.spawn_id,
                        spawn.hub,
                        spawn.name.as_str(),
                        ModuleLifecycle::Spawning,
                    ),
                );
                true
            }
            Payload::Started(started) => {
                self.exited.remove(&sender);
                self.modules
                    .entry(sender)
                    .or_insert_with(|| {
                        ModuleState::new(
                            sender,
                            INVALID,
                            started.name.as_str(),
                            ModuleLifecycle::Spawning,
                        )
                    })
                    .lifecycle = ModuleLifecycle::Started;
                true
            }
            Payload::Busy => self.set_lifecycle(sender, ModuleLifecycle::Busy),
            Payload::Idle => self.set_lifecycle(sender, ModuleLifecycle::Started),
            Payload::ModuleExit(_) => {
                self.remove_module(sender);
                true
            }
            Payload::ModuleAvailable(avail) => {
                let entry = AvailableModule {
                    hub: avail.hub,
                    name: avail.name.as_str().to_string(),
                    path: avail.path.as_str().to_string(),
                };
                if !self.available.contains(&entry) {
                    self.available.push(entry);
                }
                true
            }
            Payload::AddPort(add) => match self.modules.get_mut(&sender) {
                Some(module) => {
                    let port = add.port(sender);
                    module.ports.insert(port.name.clone(), port);
                    true
                }
                None => false,
            },
            Payload::AddParameter(add) => {
                let Some(module) = self.modules.get_mut(&sender) else {
                    return false;
                };
                match add.parameter(sender) {
                    Ok(param) => {
                        module.parameters.insert(param.name().to_string(), param);
                        true
                    }
                    Err(e) => {
                        warn!(module = sender, error = %e, "Parameter not tracked");
                        false
                    }
                }
            }
            Payload::Connect(c) => {
                if !self.can_resolve(msg) {
                    return false;
                }
                self.links.insert(Link::from(c));
                true
            }
            Payload::Disconnect(c) => {
                let mut reversed = *c;
                reversed.reverse();
                let removed = self.links.remove(&Link::from(c));
                removed | self.links.remove(&Link::from(&reversed))
            }
            Payload::SetParameter(set) => self
                .parameter_mut(set.module, set.name.as_str())
                .map_or(false, |p| set.apply(p)),
            Payload::SetParameterChoices(set) => self
                .parameter_mut(set.module, set.name.as_str())
                .map_or(false, |p| set.apply(p)),
            Payload::ObjectReceivePolicy(policy) => self.with_module(sender, |m| {
                m.object_policy = *policy;
            }),
            Payload::SchedulingPolicy(policy) => self.with_module(sender, |m| {
                m.scheduling_policy = *policy;
            }),
            Payload::ReducePolicy(policy) => self.with_module(sender, |m| {
                m.reduce_policy = *policy;
            }),
            Payload::Trace(trace) => {
                let set = self.traced.entry(trace.module).or_default();
                if trace.on {
                    set.insert(trace.message_type);
                } else {
                    set.remove(&trace.message_type);
                }
                true
            }
            _ => true,
        }
    }

    /// Are the modules, ports and parameters `msg` refers to known?
    #[must_use]
    pub fn can_resolve(&self, msg: &Message) -> bool {
        match msg.payload() {
            Payload::Connect(c) | Payload::Disconnect(c) => {
                self.has_port(c.module_a, c.port_a.as_str())
                    && self.has_port(c.module_b, c.port_b.as_str())
            }
            Payload::SetParameter(set) => self.parameter(set.module, set.name.as_str()).is_some(),
            Payload::SetParameterChoices(set) => {
                self.parameter(set.module, set.name.as_str()).is_some()
            }
            _ => true,
        }
    }

    #[must_use]
    pub fn has_exited(&self, module: ProcessId) -> bool {
        self.exited.contains(&module)
            || (is_module(module)
                && module <= self.forgotten_through
                && !self.modules.contains_key(&module))
    }

    #[must_use]
    pub fn module(&self, id: ProcessId) -> Option<&ModuleState> {
        self.modules.get(&id)
    }

    #[must_use]
    pub fn hub(&self, id: ProcessId) -> Option<&HubState> {
        self.hubs.get(&id)
    }

    #[must_use]
    pub fn has_port(&self, module: ProcessId, port: &str) -> bool {
        self.modules
            .get(&module)
            .is_some_and(|m| m.ports.contains_key(port))
    }

    #[must_use]
    pub fn parameter(&self, module: ProcessId, name: &str) -> Option<&Parameter> {
        self.modules.get(&module)?.parameters.get(name)
    }

    /// Outputs connected to `module`'s input `port`, and inputs connected
    /// to its output `port`.
    #[must_use]
    pub fn connected(&self, module: ProcessId, port: &str) -> Vec<(ProcessId, String)> {
        self.links
            .iter()
            .filter_map(|l| {
                if l.from == module && l.from_port == port {
                    Some((l.to, l.to_port.clone()))
                } else if l.to == module && l.to_port == port {
                    Some((l.from, l.from_port.clone()))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Is message type `t` traced for `module`?
    #[must_use]
    pub fn is_traced(&self, module: ProcessId, t: MessageType) -> bool {
        self.traced.get(&module).is_some_and(|s| s.contains(&t))
    }

    #[must_use]
    pub fn available(&self) -> &[AvailableModule] {
        &self.available
    }

    /// Serializable copy of the tracked state.
    #[must_use]
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            hubs: self.hubs.values().cloned().collect(),
            modules: self
                .modules
                .values()
                .map(|m| ModuleSnapshot {
                    id: m.id,
                    hub: m.hub,
                    name: m.name.clone(),
                    lifecycle: m.lifecycle,
                    ports: m.ports.keys().cloned().collect(),
                    parameters: m
                        .parameters
                        .iter()
                        .map(|(k, p)| (k.clone(), p.value().to_string()))
                        .collect(),
                })
                .collect(),
            connections: self.links.iter().cloned().collect(),
            available: self.available.clone(),
            exited: self.exited.iter().copied().collect(),
        }
    }

    fn parameter_mut(&mut self, module: ProcessId, name: &str) -> Option<&mut Parameter> {
        self.modules.get_mut(&module)?.parameters.get_mut(name)
    }

    fn set_lifecycle(&mut self, module: ProcessId, lifecycle: ModuleLifecycle) -> bool {
        self.with_module(module, |m| m.lifecycle = lifecycle)
    }

    fn with_module(&mut self, module: ProcessId, f: impl FnOnce(&mut ModuleState)) -> bool {
        match self.modules.get_mut(&module) {
            Some(m) => {
                f(m);
                true
            }
            None => false,
        }
    }

    fn remove_module(&mut self, id: ProcessId) {
        if self.modules.remove(&id).is_some() {
            debug!(module = id, "Module state removed");
        }
        self.links.retain(|l| l.from != id && l.to != id);
        self.traced.remove(&id);
        self.exited.insert(id);
        while self.exited.len() > EXITED_REMEMBERED {
            if let Some(oldest) = self.exited.pop_first() {
                self.forgotten_through = self.forgotten_through.max(oldest);
            }
        }
    }
}

/// Tracked state in serializable form.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub hubs: Vec<HubState>,
    pub modules: Vec<ModuleSnapshot>,
    pub connections: Vec<Link>,
    pub available: Vec<AvailableModule>,
    pub exited: Vec<ProcessId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSnapshot {
    pub id: ProcessId,
    pub hub: ProcessId,
    pub name: String,
    pub lifecycle: ModuleLifecycle,
    pub ports: Vec<String>,
    pub parameters: BTreeMap<String, String>,
}
