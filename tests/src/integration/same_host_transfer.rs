//! # Same-Host Transfer
//!
//! Modules sharing a segment pass objects by handle. The announcing module
//! holds a reference for every pending announcement; the receiver takes it
//! over and confirms with `AddObjectCompleted`.

use super::fixtures::{Fixture, Host};
use df_01_routing::RoutingFlags;
use df_02_shm::{DataPayload, Object, Points, Texture1D};
use df_03_object_transfer::{announce, take_object, TransferError};
use rand::Rng;
use shared_types::{Meta, MessageType, ObjectType};
use std::time::Duration;
use tokio::time::timeout;

fn random_points(node: &node_runtime::Node, n: usize) -> Object {
    let mut rng = rand::thread_rng();
    let mut axis = || (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect::<Vec<_>>();
    let (x, y, z) = (axis(), axis(), axis());
    let shm = node.ctx().shm().unwrap();
    Points::new(&shm, Meta::default().with_num_blocks(1), x, y, z)
        .unwrap()
        .into()
}

#[tokio::test]
async fn test_handle_path_shares_object() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    let grid = random_points(&reader, 64);

    let add = reader.objects().send(&grid, "grid_out", 7, "grid_in", 0).unwrap();
    assert_eq!(grid.refcount(), 2);

    let left = timeout(Duration::from_secs(5), f.session.pump(vec![add.into()]))
        .await
        .unwrap()
        .unwrap();
    assert!(left.iter().any(|m| m.message_type() == MessageType::ObjectReceived));

    let received = mapper.objects().next_received().unwrap();
    assert_eq!(received.port, "grid_in");
    assert_eq!(received.from, 5);
    assert!(received.object.same_as(&grid));
    assert_eq!(reader.ctx().retention().outstanding(), 0);
    assert_eq!(grid.refcount(), 2);

    drop(received);
    assert_eq!(grid.refcount(), 1);
}

#[tokio::test]
async fn test_handle_path_relayed_by_local_manager() {
    let mut f = Fixture::new();
    let manager = f.manager(Host::Node01);
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    let grid = random_points(&reader, 8);

    let add = reader.objects().send(&grid, "grid_out", 7, "grid_in", 0).unwrap();
    let router = manager.ctx().router();
    assert!(router.flags(&add).contains(RoutingFlags::DEST_LOCAL_MANAGER));
    assert!(router.to_handler(&add));

    f.session.pump(vec![add.into()]).await.unwrap();

    assert_eq!(manager.relayed(), 1);
    let received = mapper.objects().next_received().unwrap();
    assert_eq!(received.from, 5);
    assert!(received.object.same_as(&grid));
    assert_eq!(reader.ctx().retention().outstanding(), 0);
    drop(received);
    assert_eq!(grid.refcount(), 1);
}

#[tokio::test]
async fn test_replies_bypass_manager() {
    let mut f = Fixture::new();
    let manager = f.manager(Host::Node01);
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    let writer = f.module(8, Host::Node01);
    let grid = random_points(&reader, 4);

    let sends = vec![
        reader.objects().send(&grid, "grid_out", 7, "grid_in", 0).unwrap().into(),
        reader.objects().send(&grid, "grid_out", 8, "data_in", 0).unwrap().into(),
    ];
    f.session.pump(sends).await.unwrap();

    // AddObjectCompleted goes straight back to the owner
    assert_eq!(manager.relayed(), 2);
    assert!(mapper.objects().next_received().is_some());
    assert!(writer.objects().next_received().is_some());
    assert_eq!(reader.ctx().retention().outstanding(), 0);
}

#[tokio::test]
async fn test_one_object_to_two_receivers() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    let writer = f.module(8, Host::Node01);
    let grid = random_points(&reader, 16);

    let sends = vec![
        reader.objects().send(&grid, "grid_out", 7, "grid_in", 0).unwrap().into(),
        reader.objects().send(&grid, "grid_out", 8, "data_in", 0).unwrap().into(),
    ];
    f.session.pump(sends).await.unwrap();

    let a = mapper.objects().next_received().unwrap();
    let b = writer.objects().next_received().unwrap();
    assert!(a.object.same_as(&grid));
    assert!(b.object.same_as(&grid));
    assert_eq!(b.port, "data_in");
    assert_eq!(grid.refcount(), 3);
    assert_eq!(reader.ctx().retention().outstanding(), 0);
}

#[tokio::test]
async fn test_attachments_reachable_from_received_object() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    let shm = reader.ctx().shm().unwrap();

    let grid = random_points(&reader, 4);
    let colors = Texture1D::new(&shm, Meta::default(), 0.0, 1.0, vec![0; 4 * 8]).unwrap();
    grid.add_attachment("colors", &Object::from(colors)).unwrap();
    grid.add_attribute("_species", "pressure");

    let add = reader.objects().send(&grid, "grid_out", 7, "grid_in", 0).unwrap();
    f.session.pump(vec![add.into()]).await.unwrap();

    let received = mapper.objects().next_received().unwrap();
    let texture = received.object.get_attachment("colors").unwrap();
    assert_eq!(texture.object_type(), ObjectType::Texture1D);
    assert_eq!(received.object.get_attribute("_species").as_deref(), Some("pressure"));
}

#[tokio::test]
async fn test_announcement_taken_once() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let mapper = f.module(7, Host::Node01);
    let shm = reader.ctx().shm().unwrap();
    let obj = shm
        .construct(ObjectType::Placeholder, Meta::default(), DataPayload::Empty)
        .unwrap();

    let add = announce(&obj, "out", "in").unwrap();
    assert_eq!(obj.refcount(), 2);
    let theirs = mapper.ctx().shm().unwrap();
    let first = take_object(&theirs, &add).unwrap();
    assert!(first.same_as(&obj));
    assert_eq!(obj.refcount(), 2);
    assert!(matches!(
        take_object(&theirs, &add),
        Err(TransferError::AlreadyTaken { .. })
    ));
    assert_eq!(obj.refcount(), 2);
    drop(first);
    assert_eq!(obj.refcount(), 1);
}

#[tokio::test]
async fn test_unconfirmed_announcements_released_on_shutdown() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    f.module(7, Host::Node01);
    let grid = random_points(&reader, 4);

    let _never_delivered = reader.objects().send(&grid, "grid_out", 7, "grid_in", 0).unwrap();
    assert_eq!(grid.refcount(), 2);
    assert_eq!(reader.ctx().retention().outstanding(), 1);

    reader.ctx().shutdown();
    assert_eq!(grid.refcount(), 1);
    assert_eq!(reader.ctx().retention().outstanding(), 0);
}
