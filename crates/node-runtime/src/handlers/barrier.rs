//! # Barrier Handler
//!
//! The coordinator sends one `Barrier` per participant, all with the same
//! uuid. Each participant answers with `BarrierReached`; the coordinator's
//! waiters are released once every participant answered.

use super::{MessageHandler, Outgoing};
use crate::container::ProcessContext;
use crate::error::RuntimeResult;
use async_trait::async_trait;
use shared_types::message::Payload;
use shared_types::{Message, MessageType, ProcessId};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub struct BarrierHandler {
    ctx: Arc<ProcessContext>,
}

impl BarrierHandler {
    #[must_use]
    pub fn new(ctx: Arc<ProcessContext>) -> Self {
        Self { ctx }
    }

    /// Start a barrier over `participants`. Returns its uuid and the
    /// `Barrier` message for each participant.
    pub fn begin(&self, participants: &[ProcessId]) -> RuntimeResult<(Uuid, Vec<Message>)> {
        let uuid = Uuid::new_v4();
        self.ctx.barriers().begin(uuid, participants.iter().copied())?;
        let messages = participants
            .iter()
            .map(|&p| {
                let mut msg = Message::new(Payload::Barrier);
                msg.set_uuid(uuid);
                self.ctx.stamp(&mut msg);
                msg.set_dest_id(p);
                msg
            })
            .collect();
        Ok((uuid, messages))
    }

    /// Wait until every participant reached barrier `uuid`, then forget it.
    pub async fn wait(&self, uuid: Uuid) -> RuntimeResult<()> {
        self.ctx.barriers().wait(uuid).await?;
        self.ctx.barriers().finish(uuid);
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for BarrierHandler {
    fn handles(&self, t: MessageType) -> bool {
        matches!(t, MessageType::Barrier | MessageType::BarrierReached)
    }

    async fn handle(&self, msg: &Message, _payload: Option<&[u8]>) -> RuntimeResult<Vec<Outgoing>> {
        match msg.message_type() {
            MessageType::Barrier => {
                let mut reply = Message::barrier_reached(msg.uuid());
                self.ctx.stamp(&mut reply);
                reply.set_dest_id(msg.sender_id());
                reply.set_dest_rank(msg.rank());
                debug!(barrier = %msg.uuid(), coordinator = msg.sender_id(), "Barrier reached");
                Ok(vec![reply.into()])
            }
            MessageType::BarrierReached => {
                self.ctx.barriers().reached(msg)?;
                Ok(Vec::new())
            }
            _ => Ok(Vec::new()),
        }
    }
}
