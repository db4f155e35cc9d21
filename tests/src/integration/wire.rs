//! # Wire and Observers
//!
//! Control messages cross process boundaries as fixed-size blocks, and
//! messages leaving a session reach observers on the message bus.

use super::fixtures::{Fixture, Host};
use df_01_routing::RoutingTable;
use df_02_shm::{DataPayload, Object};
use node_runtime::Session;
use shared_bus::{InMemoryMessageBus, MessageFilter};
use shared_types::codec::{decode, encode};
use shared_types::{Meta, MessageType, ObjectType, ScalarKind, MESSAGE_SIZE};
use std::sync::Arc;

#[tokio::test]
async fn test_announcement_survives_wire_codec() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let shm = reader.ctx().shm().unwrap();
    let obj: Object = shm
        .construct(ObjectType::vec(ScalarKind::Scalar, 3), Meta::default(), DataPayload::Empty)
        .unwrap();

    let add = reader.objects().send(&obj, "velocity_out", 7, "velocity_in", 0).unwrap();
    let block = encode(&add).unwrap();
    assert_eq!(block.len(), MESSAGE_SIZE);

    let decoded = decode(&block).unwrap();
    assert_eq!(decoded, add);
    let header = decoded.as_add_object().unwrap();
    assert_eq!(header.name, obj.name());
    assert_eq!(header.object_type, obj.object_type());
}

#[tokio::test]
async fn test_observer_sees_object_received() {
    let bus = Arc::new(InMemoryMessageBus::new());
    let mut receipts = bus.subscribe(MessageFilter::types(vec![MessageType::ObjectReceived]));
    let mut f = Fixture::with_session(Session::new().with_observer(bus.clone()));
    let reader = f.module(5, Host::Node01);
    f.module(7, Host::Node01);

    let shm = reader.ctx().shm().unwrap();
    let obj = shm
        .construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
        .unwrap();
    let add = reader.objects().send(&obj, "grid_out", 7, "grid_in", 0).unwrap();
    f.session.pump(vec![add.into()]).await.unwrap();

    let receipt = receipts.try_recv().unwrap().unwrap();
    assert_eq!(receipt.message_type(), MessageType::ObjectReceived);
    assert_eq!(receipt.sender_id(), 7);
    assert_eq!(receipt.as_object_received().unwrap().port_name, "grid_in");
}

#[test]
fn test_every_message_type_has_routing() {
    let table = RoutingTable::build().unwrap();
    for t in MessageType::ALL {
        assert!(!table.flags(t).is_empty(), "{t} has no routing flags");
    }
}
