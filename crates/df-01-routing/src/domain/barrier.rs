//! Barrier coordination
//!
//! A barrier is identified by the correlation id of its `Barrier` message.
//! It completes once every expected participant has answered with a
//! `BarrierReached` carrying the same id. There is no timeout; a waiter
//! only returns early when the barrier is cancelled.
//!
//! ```text
//! begin(uuid, {5,6,7,8}) ──▶ [WAITING] ──reached×4──▶ [COMPLETE] ──▶ wait() returns
//!                                │
//!                                └──cancel()──▶ [CANCELLED] ──▶ wait() fails
//! ```

use crate::error::{RoutingError, RoutingResult};
use parking_lot::Mutex;
use shared_types::{Message, MessageType, ProcessId};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Complete,
    Cancelled,
}

/// Progress of one barrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierState {
    pub uuid: Uuid,
    pub expected: BTreeSet<ProcessId>,
    pub arrived: BTreeSet<ProcessId>,
}

impl BarrierState {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.arrived.len() == self.expected.len()
    }

    /// Participants that have not arrived yet.
    #[must_use]
    pub fn remaining(&self) -> Vec<ProcessId> {
        self.expected.difference(&self.arrived).copied().collect()
    }
}

struct Entry {
    state: BarrierState,
    phase: watch::Sender<Phase>,
}

/// All active barriers of one process.
#[derive(Default)]
pub struct BarrierTracker {
    barriers: Mutex<HashMap<Uuid, Entry>>,
}

impl BarrierTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start barrier `uuid` expecting a reply from each of `participants`.
    pub fn begin(
        &self,
        uuid: Uuid,
        participants: impl IntoIterator<Item = ProcessId>,
    ) -> RoutingResult<()> {
        let mut barriers = self.barriers.lock();
        if barriers.contains_key(&uuid) {
            return Err(RoutingError::DuplicateBarrier { uuid });
        }
        let expected: BTreeSet<ProcessId> = participants.into_iter().collect();
        let initial = if expected.is_empty() {
            Phase::Complete
        } else {
            Phase::Waiting
        };
        let (phase, _) = watch::channel(initial);
        debug!(barrier = %uuid, participants = expected.len(), "Barrier started");
        barriers.insert(
            uuid,
            Entry {
                state: BarrierState {
                    uuid,
                    expected,
                    arrived: BTreeSet::new(),
                },
                phase,
            },
        );
        Ok(())
    }

    /// Record a `BarrierReached`. Returns whether the barrier is now complete.
    pub fn reached(&self, msg: &Message) -> RoutingResult<bool> {
        if msg.message_type() != MessageType::BarrierReached {
            return Err(RoutingError::UnexpectedMessage {
                found: msg.message_type(),
            });
        }
        let uuid = msg.uuid();
        let participant = msg.sender_id();

        let mut barriers = self.barriers.lock();
        let Some(entry) = barriers.get_mut(&uuid) else {
            warn!(barrier = %uuid, sender = participant, "BarrierReached for unknown barrier");
            return Err(RoutingError::UnknownBarrier { uuid });
        };
        if !entry.state.expected.contains(&participant) {
            warn!(barrier = %uuid, sender = participant, "BarrierReached from non-participant");
            return Err(RoutingError::NotAParticipant { uuid, participant });
        }
        if !entry.state.arrived.insert(participant) {
            debug!(barrier = %uuid, sender = participant, "Duplicate BarrierReached ignored");
        }

        let complete = entry.state.is_complete();
        if complete {
            info!(barrier = %uuid, "Barrier complete");
            entry.phase.send_replace(Phase::Complete);
        }
        Ok(complete)
    }

    #[must_use]
    pub fn is_complete(&self, uuid: Uuid) -> bool {
        self.barriers
            .lock()
            .get(&uuid)
            .is_some_and(|e| e.state.is_complete())
    }

    #[must_use]
    pub fn state(&self, uuid: Uuid) -> Option<BarrierState> {
        self.barriers.lock().get(&uuid).map(|e| e.state.clone())
    }

    /// Wait until barrier `uuid` completes.
    pub async fn wait(&self, uuid: Uuid) -> RoutingResult<()> {
        let mut rx = {
            let barriers = self.barriers.lock();
            let entry = barriers
                .get(&uuid)
                .ok_or(RoutingError::UnknownBarrier { uuid })?;
            entry.phase.subscribe()
        };
        let result = match rx.wait_for(|p| *p != Phase::Waiting).await {
            Ok(phase) if *phase == Phase::Complete => Ok(()),
            _ => Err(RoutingError::BarrierCancelled { uuid }),
        };
        result
    }

    /// Abort barrier `uuid`, failing every waiter.
    pub fn cancel(&self, uuid: Uuid) -> Option<BarrierState> {
        let entry = self.barriers.lock().remove(&uuid)?;
        entry.phase.send_replace(Phase::Cancelled);
        warn!(barrier = %uuid, remaining = ?entry.state.remaining(), "Barrier cancelled");
        Some(entry.state)
    }

    /// Remove barrier `uuid` once its waiters are done.
    pub fn finish(&self, uuid: Uuid) -> Option<BarrierState> {
        self.barriers.lock().remove(&uuid).map(|e| e.state)
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.barriers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::message::Payload;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn reached_from(uuid: Uuid, sender: ProcessId) -> Message {
        let mut msg = Message::barrier_reached(uuid);
        msg.set_sender_id(sender);
        msg
    }

    #[test]
    fn test_three_of_four_is_not_enough() {
        let barriers = BarrierTracker::new();
        let barrier = Message::new(Payload::Barrier);
        barriers.begin(barrier.uuid(), [5, 6, 7, 8]).unwrap();

        for id in [5, 6, 7] {
            assert!(!barriers.reached(&reached_from(barrier.uuid(), id)).unwrap());
        }
        assert!(!barriers.is_complete(barrier.uuid()));
        assert_eq!(barriers.state(barrier.uuid()).unwrap().remaining(), vec![8]);

        assert!(barriers.reached(&reached_from(barrier.uuid(), 8)).unwrap());
        assert!(barriers.is_complete(barrier.uuid()));
    }

    #[test]
    fn test_duplicate_reply_counts_once() {
        let barriers = BarrierTracker::new();
        let uuid = Uuid::new_v4();
        barriers.begin(uuid, [5, 6]).unwrap();
        barriers.reached(&reached_from(uuid, 5)).unwrap();
        assert!(!barriers.reached(&reached_from(uuid, 5)).unwrap());
    }

    #[test]
    fn test_rejects_foreign_replies() {
        let barriers = BarrierTracker::new();
        let uuid = Uuid::new_v4();
        barriers.begin(uuid, [5]).unwrap();

        assert_eq!(
            barriers.reached(&reached_from(uuid, 9)),
            Err(RoutingError::NotAParticipant {
                uuid,
                participant: 9
            })
        );
        let other = Uuid::new_v4();
        assert_eq!(
            barriers.reached(&reached_from(other, 5)),
            Err(RoutingError::UnknownBarrier { uuid: other })
        );
        assert!(matches!(
            barriers.reached(&Message::new(Payload::Barrier)),
            Err(RoutingError::UnexpectedMessage { .. })
        ));
        assert_eq!(
            barriers.begin(uuid, [5]),
            Err(RoutingError::DuplicateBarrier { uuid })
        );
    }

    #[tokio::test]
    async fn test_wait_released_by_last_reply() {
        let barriers = Arc::new(BarrierTracker::new());
        let uuid = Uuid::new_v4();
        barriers.begin(uuid, [1, 2]).unwrap();

        let waiter = {
            let barriers = barriers.clone();
            tokio::spawn(async move { barriers.wait(uuid).await })
        };

        barriers.reached(&reached_from(uuid, 1)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        barriers.reached(&reached_from(uuid, 2)).unwrap();
        let result = timeout(Duration::from_secs(1), waiter)
            .await
            .expect("timeout")
            .expect("join");
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_cancel_fails_waiters() {
        let barriers = Arc::new(BarrierTracker::new());
        let uuid = Uuid::new_v4();
        barriers.begin(uuid, [1]).unwrap();

        let waiter = {
            let barriers = barriers.clone();
            tokio::spawn(async move { barriers.wait(uuid).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(barriers.cancel(uuid).is_some());

        let result = timeout(Duration::from_secs(1), waiter)
            .await
            .expect("timeout")
            .expect("join");
        assert_eq!(result, Err(RoutingError::BarrierCancelled { uuid }));
        assert_eq!(barriers.active(), 0);
    }

    #[tokio::test]
    async fn test_empty_barrier_is_complete() {
        let barriers = BarrierTracker::new();
        let uuid = Uuid::new_v4();
        barriers.begin(uuid, Vec::<ProcessId>::new()).unwrap();
        assert!(barriers.is_complete(uuid));
        assert!(timeout(Duration::from_millis(100), barriers.wait(uuid))
            .await
            .expect("timeout")
            .is_ok());
        assert!(barriers.finish(uuid).is_some());
    }
}
