//! # Barrier Rounds
//!
//! The hub sends one `Barrier` per participant; each answers with
//! `BarrierReached`. Waiters resume once every participant has answered.

use super::fixtures::{Fixture, Host};
use node_runtime::Outgoing;
use shared_types::ids::MASTER_HUB;
use shared_types::{Identity, Message};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_barrier_completes_when_all_reached() {
    let mut f = Fixture::new();
    f.module(5, Host::Node01);
    f.module(7, Host::Node01);
    f.module(9, Host::Node02);

    let (uuid, barriers) = f.hub.barrier().begin(&[5, 7, 9]).unwrap();
    assert_eq!(barriers.len(), 3);
    assert!(barriers.iter().all(|m| m.uuid() == uuid));

    f.session
        .pump(barriers.into_iter().map(Outgoing::from).collect())
        .await
        .unwrap();
    timeout(Duration::from_secs(5), f.hub.barrier().wait(uuid))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(f.hub.ctx().barriers().active(), 0);
}

#[tokio::test]
async fn test_barrier_waits_for_missing_participant() {
    let mut f = Fixture::new();
    f.module(5, Host::Node01);
    f.module(7, Host::Node01);

    let (uuid, barriers) = f.hub.barrier().begin(&[5, 7, 11]).unwrap();
    let left = f
        .session
        .pump(barriers.into_iter().map(Outgoing::from).collect())
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].dest_id(), 11);

    let pending = timeout(Duration::from_millis(100), f.hub.barrier().wait(uuid)).await;
    assert!(pending.is_err());
    let state = f.hub.ctx().barriers().state(uuid).unwrap();
    assert_eq!(state.remaining(), vec![11]);

    let mut late = Message::barrier_reached(uuid);
    late.set_sender_id(11);
    late.set_dest_id(MASTER_HUB);
    f.hub
        .deliver(&late, None, Identity::Manager, MASTER_HUB)
        .await
        .unwrap();
    timeout(Duration::from_secs(5), f.hub.barrier().wait(uuid))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_barriers_independent() {
    let mut f = Fixture::new();
    f.module(5, Host::Node01);
    f.module(7, Host::Node01);

    let (first, to_five) = f.hub.barrier().begin(&[5]).unwrap();
    let (second, to_seven) = f.hub.barrier().begin(&[7]).unwrap();
    assert_ne!(first, second);

    f.session
        .pump(to_seven.into_iter().map(Outgoing::from).collect())
        .await
        .unwrap();
    timeout(Duration::from_secs(5), f.hub.barrier().wait(second))
        .await
        .unwrap()
        .unwrap();
    assert!(!f.hub.ctx().barriers().is_complete(first));

    f.session
        .pump(to_five.into_iter().map(Outgoing::from).collect())
        .await
        .unwrap();
    timeout(Duration::from_secs(5), f.hub.barrier().wait(first))
        .await
        .unwrap()
        .unwrap();
}
