//! # Session State Flows
//!
//! The hub tracks modules, ports, connections and parameters from the
//! messages it routes. Messages that refer to unknown state wait in the
//! pending queue until an announcement resolves them.

use super::fixtures::{stamped, Fixture, Host};
use df_01_routing::ModuleLifecycle;
use node_runtime::Dispatcher;
use shared_types::ids::MASTER_HUB;
use shared_types::message::{AddParameter, Connection, Kill, ModuleExit, SetParameterChoices};
use shared_types::{Identity, Message, ParamValue, Parameter, PortKind, Presentation};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_started_modules_tracked_with_ports() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node02);

    f.start(&reader, "Reader", &[("grid_out", PortKind::Output)]).await;
    f.start(&mapper, "Mapper", &[("grid_in", PortKind::Input)]).await;

    let tracker = f.hub.ctx().tracker();
    assert_eq!(tracker.module(5).unwrap().lifecycle, ModuleLifecycle::Started);
    assert_eq!(tracker.module(7).unwrap().name, "Mapper");
    assert!(tracker.has_port(5, "grid_out"));
    assert!(tracker.has_port(7, "grid_in"));
    assert!(!tracker.has_port(7, "grid_out"));
}

#[tokio::test]
async fn test_connect_parked_until_ports_known() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    f.start(&reader, "Reader", &[("grid_out", PortKind::Output)]).await;

    let connect = Message::connect(Connection::new(5, "grid_out", 7, "grid_in"));
    f.session.pump(vec![stamped(&reader, connect)]).await.unwrap();
    assert_eq!(f.hub.ctx().pending().len(), 1);
    assert!(f.hub.ctx().tracker().connected(5, "grid_out").is_empty());

    timeout(
        Duration::from_secs(5),
        f.start(&mapper, "Mapper", &[("grid_in", PortKind::Input)]),
    )
    .await
    .unwrap();

    assert!(f.hub.ctx().pending().is_empty());
    assert_eq!(
        f.hub.ctx().tracker().connected(5, "grid_out"),
        vec![(7, "grid_in".to_string())]
    );
}

#[tokio::test]
async fn test_choices_applied_after_parameter_announced() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    f.start(&reader, "Reader", &[]).await;

    let choices = Message::new(SetParameterChoices::new(5, "format", &["binary", "ascii"]));
    f.session.pump(vec![stamped(&reader, choices)]).await.unwrap();
    assert_eq!(f.hub.ctx().pending().len(), 1);

    let mut param = Parameter::new(5, "format", ParamValue::Integer(0));
    param.set_presentation(Presentation::Choice);
    let add = Message::new(AddParameter::new(&param, "Reader"));
    f.session.pump(vec![stamped(&reader, add)]).await.unwrap();

    assert!(f.hub.ctx().pending().is_empty());
    let tracker = f.hub.ctx().tracker();
    let tracked = tracker.parameter(5, "format").unwrap();
    assert_eq!(tracked.choices(), ["binary".to_string(), "ascii".to_string()]);
}

#[tokio::test]
async fn test_messages_for_exited_module_dropped() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    f.start(&reader, "Reader", &[("grid_out", PortKind::Output)]).await;
    f.start(&mapper, "Mapper", &[("grid_in", PortKind::Input)]).await;

    // parked for a port that will never appear
    let connect = Message::connect(Connection::new(5, "grid_out", 7, "mesh_in"));
    f.session.pump(vec![stamped(&mapper, connect)]).await.unwrap();
    assert_eq!(f.hub.ctx().pending().len(), 1);

    let exit = Message::new(ModuleExit::default());
    f.session.pump(vec![stamped(&mapper, exit)]).await.unwrap();
    assert!(f.hub.ctx().tracker().has_exited(7));
    assert!(f.hub.ctx().tracker().module(7).is_none());
    assert!(f.hub.ctx().pending().is_empty());

    let mut kill = Message::new(Kill { module: 7 });
    kill.set_dest_id(7);
    let delivery = Dispatcher::new(f.hub.ctx().clone()).dispatch(&kill, Identity::Manager, MASTER_HUB);
    assert!(delivery.dropped);
}

#[tokio::test]
async fn test_snapshot_serializes() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    f.start(&reader, "Reader", &[("grid_out", PortKind::Output)]).await;

    let snapshot = f.hub.ctx().tracker().snapshot();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["modules"].as_array().unwrap().len(), 1);
    assert_eq!(json["modules"][0]["name"], "Reader");
}
