//! # Cross-Host Transfer
//!
//! A receiver on another host cannot resolve the announced handle. It asks
//! the owner for the serialized object and rebuilds it in its own segment.
//! Either way the transfer ends settled on both sides.

use super::fixtures::{Fixture, Host};
use df_02_shm::{DataPayload, Object, Points, Texture1D};
use df_03_object_transfer::{announce, drop_announcement};
use rand::Rng;
use shared_types::ids::MASTER_HUB;
use shared_types::{Identity, Meta, MessageType, ObjectType};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_byte_path_rebuilds_object() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let renderer = f.module(9, Host::Node02);
    let shm = reader.ctx().shm().unwrap();

    let mut rng = rand::thread_rng();
    let n = 1000;
    let x: Vec<f32> = (0..n).map(|_| rng.gen()).collect();
    let y: Vec<f32> = (0..n).map(|_| rng.gen()).collect();
    let z: Vec<f32> = (0..n).map(|_| rng.gen()).collect();
    let points = Points::new(&shm, Meta::default().with_num_timesteps(3), x.clone(), y, z).unwrap();
    let grid: Object = points.into();

    let add = reader.objects().send(&grid, "grid_out", 9, "grid_in", 0).unwrap();
    timeout(Duration::from_secs(5), f.session.pump(vec![add.into()]))
        .await
        .unwrap()
        .unwrap();

    let received = renderer.objects().next_received().unwrap();
    assert!(!received.object.same_as(&grid));
    assert_eq!(received.object.name(), grid.name());
    assert_eq!(received.object.meta().num_timesteps, 3);

    let copy = Points::try_from(received.object).unwrap();
    assert_eq!(copy.num_points(), n);
    assert_eq!(copy.point(17).unwrap()[0], x[17]);

    assert_eq!(renderer.objects().awaiting(), 0);
    assert_eq!(reader.ctx().retention().outstanding(), 0);
    assert_eq!(grid.refcount(), 1);
}

#[tokio::test]
async fn test_attachments_travel_with_bytes() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let renderer = f.module(9, Host::Node02);
    let shm = reader.ctx().shm().unwrap();

    let grid: Object = Points::new(&shm, Meta::default(), vec![0.0], vec![1.0], vec![2.0])
        .unwrap()
        .into();
    let colors = Texture1D::new(&shm, Meta::default(), -1.0, 1.0, vec![255; 4 * 2]).unwrap();
    grid.add_attachment("colors", &Object::from(colors)).unwrap();

    let add = reader.objects().send(&grid, "grid_out", 9, "grid_in", 0).unwrap();
    f.session.pump(vec![add.into()]).await.unwrap();

    let received = renderer.objects().next_received().unwrap();
    let colors = Texture1D::try_from(received.object.get_attachment("colors").unwrap()).unwrap();
    assert_eq!(colors.range(), (-1.0, 1.0));
    assert_eq!(colors.width(), 2);
}

#[tokio::test]
async fn test_refused_request_releases_both_sides() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let renderer = f.module(9, Host::Node02);
    let shm = reader.ctx().shm().unwrap();

    let obj = shm
        .construct(ObjectType::Placeholder, Meta::default(), DataPayload::Empty)
        .unwrap();
    let mut add = announce(&obj, "out", "in").unwrap();
    add.set_dest_id(9);
    drop_announcement(&shm, &add).unwrap();
    drop(obj);

    f.session.pump(vec![add.into()]).await.unwrap();

    assert!(renderer.objects().next_received().is_none());
    assert_eq!(renderer.objects().awaiting(), 0);
    assert_eq!(shm.segment().pending_transfers(), 0);
    assert_eq!(reader.ctx().retention().outstanding(), 0);
}

#[tokio::test]
async fn test_failed_rebuild_still_confirms_owner() {
    let mut f = Fixture::new();
    let reader = f.module(5, Host::Node01);
    let renderer = f.module(9, Host::Node02);
    let shm = reader.ctx().shm().unwrap();
    let grid: Object = Points::new(&shm, Meta::default(), vec![0.0; 8], vec![1.0; 8], vec![2.0; 8])
        .unwrap()
        .into();

    let add = reader.objects().send(&grid, "grid_out", 9, "grid_in", 0).unwrap();
    assert_eq!(reader.ctx().retention().outstanding(), 1);

    let request = renderer
        .deliver(&add, None, Identity::Manager, MASTER_HUB)
        .await
        .unwrap();
    assert_eq!(renderer.objects().awaiting(), 1);
    let answer = reader
        .deliver(&request[0].message, None, Identity::Manager, MASTER_HUB)
        .await
        .unwrap();
    let bytes = answer[0].payload.clone().unwrap();

    let replies = renderer
        .deliver(
            &answer[0].message,
            Some(&bytes[..bytes.len() / 2]),
            Identity::Manager,
            MASTER_HUB,
        )
        .await
        .unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].message.message_type(), MessageType::AddObjectCompleted);
    assert_eq!(renderer.objects().awaiting(), 0);
    assert!(renderer.objects().next_received().is_none());

    f.session.pump(replies).await.unwrap();
    assert_eq!(reader.ctx().retention().outstanding(), 0);
    assert_eq!(grid.refcount(), 1);
}
