//! # Object Handler
//!
//! Receiving side and owner side of object transfers for one module.
//!
//! ## Flow
//!
//! 1. `AddObject` arrives: take the object by handle or by name
//! 2. If it is not reachable here, request the bytes from the owner
//! 3. `RequestObject` arrives at the owner: answer with `SendObject` + bytes
//! 4. `SendObject` arrives: rebuild the object, confirm the announcement
//! 5. `AddObjectCompleted` arrives at the owner: settle its retention entry
//!
//! A transfer that fails on the byte path is still confirmed to the owner,
//! and an error text answering a request abandons the waiting announcement.

use super::{MessageHandler, Outgoing};
use crate::container::ProcessContext;
use crate::error::RuntimeResult;
use async_trait::async_trait;
use df_02_shm::Object;
use df_03_object_transfer::{
    announce, answer_request, object_received, receive_object, request_for, take_object,
    TransferError,
};
use parking_lot::Mutex;
use shared_types::{Message, MessageType, ProcessId};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// An object delivered to an input port.
#[derive(Debug)]
pub struct Received {
    pub port: String,
    pub from: ProcessId,
    pub object: Object,
}

pub struct ObjectHandler {
    ctx: Arc<ProcessContext>,
    /// Announcements waiting for their bytes, by uuid.
    awaiting: Mutex<HashMap<Uuid, Message>>,
    inbox: Mutex<VecDeque<Received>>,
}

impl ObjectHandler {
    #[must_use]
    pub fn new(ctx: Arc<ProcessContext>) -> Self {
        Self {
            ctx,
            awaiting: Mutex::new(HashMap::new()),
            inbox: Mutex::new(VecDeque::new()),
        }
    }

    /// Announce `obj` from output `sender_port` to input `dest_port` of
    /// `dest`/`dest_rank`.
    pub fn send(
        &self,
        obj: &Object,
        sender_port: &str,
        dest: ProcessId,
        dest_port: &str,
        dest_rank: i32,
    ) -> RuntimeResult<Message> {
        let mut msg = announce(obj, sender_port, dest_port)?;
        msg.set_dest_id(dest);
        msg.set_dest_rank(dest_rank);
        self.ctx.retention().track(&msg)?;
        Ok(msg)
    }

    /// Next object delivered to an input port.
    pub fn next_received(&self) -> Option<Received> {
        self.inbox.lock().pop_front()
    }

    /// Number of announcements still waiting for bytes.
    #[must_use]
    pub fn awaiting(&self) -> usize {
        self.awaiting.lock().len()
    }

    fn deliver(&self, add_msg: &Message, obj: Object) -> RuntimeResult<Vec<Outgoing>> {
        let port = add_msg
            .as_add_object()
            .map(|a| a.dest_port.to_string())
            .unwrap_or_default();

        let mut completed = Message::add_object_completed(add_msg)?;
        self.ctx.stamp(&mut completed);
        let notice = object_received(add_msg, &obj, &port)?;

        debug!(object = obj.name(), port = %port, from = add_msg.sender_id(), "Object delivered");
        self.inbox.lock().push_back(Received {
            port,
            from: add_msg.sender_id(),
            object: obj,
        });
        Ok(vec![completed.into(), notice.into()])
    }

    fn on_add_object(&self, msg: &Message) -> RuntimeResult<Vec<Outgoing>> {
        let shm = self.ctx.shm()?;
        match take_object(&shm, msg) {
            Ok(obj) => self.deliver(msg, obj),
            Err(TransferError::Unavailable { name, .. }) => {
                debug!(object = %name, owner = msg.sender_id(), "Requesting object bytes");
                let mut request = request_for(msg)?;
                self.ctx.stamp(&mut request);
                self.awaiting.lock().insert(msg.uuid(), *msg);
                Ok(vec![request.into()])
            }
            Err(e) => Err(e.into()),
        }
    }

    fn on_request_object(&self, msg: &Message) -> RuntimeResult<Vec<Outgoing>> {
        let shm = self.ctx.shm()?;
        match answer_request(&shm, msg) {
            Ok((reply, bytes)) => Ok(vec![Outgoing::with_payload(reply, bytes)]),
            Err(TransferError::Unavailable { name, .. }) => {
                let mut text = Message::send_text_reply(&format!("Object {name} not available"), msg);
                self.ctx.stamp(&mut text);
                text.set_dest_id(msg.sender_id());
                text.set_dest_rank(msg.rank());
                Ok(vec![text.into()])
            }
            Err(e) => Err(e.into()),
        }
    }

    fn on_send_object(&self, msg: &Message, payload: Option<&[u8]>) -> RuntimeResult<Vec<Outgoing>> {
        let Some(add) = self.awaiting.lock().remove(&msg.uuid()) else {
            warn!(uuid = %msg.uuid(), "SendObject without pending announcement");
            return Err(TransferError::UnknownAnnouncement(msg.uuid()).into());
        };
        let shm = self.ctx.shm()?;
        match receive_object(&shm, msg, payload.unwrap_or_default()) {
            Ok(obj) => self.deliver(&add, obj),
            Err(e) => {
                warn!(uuid = %msg.uuid(), owner = add.sender_id(), error = %e, "Object transfer failed");
                let mut completed = Message::add_object_completed(&add)?;
                self.ctx.stamp(&mut completed);
                Ok(vec![completed.into()])
            }
        }
    }

    fn on_send_text(&self, msg: &Message) -> RuntimeResult<Vec<Outgoing>> {
        let Some(text) = msg.as_send_text() else {
            return Ok(Vec::new());
        };
        if text.reference_type != Some(MessageType::RequestObject) {
            return Ok(Vec::new());
        }
        if self.awaiting.lock().remove(&text.reference_uuid).is_some() {
            warn!(uuid = %text.reference_uuid, reason = text.text(), "Object request refused");
        }
        Ok(Vec::new())
    }

    fn on_completed(&self, msg: &Message) -> RuntimeResult<Vec<Outgoing>> {
        let shm = self.ctx.shm()?;
        self.ctx.retention().complete(&shm, msg)?;
        Ok(Vec::new())
    }
}

#[async_trait]
impl MessageHandler for ObjectHandler {
    fn handles(&self, t: MessageType) -> bool {
        matches!(
            t,
            MessageType::AddObject
                | MessageType::RequestObject
                | MessageType::SendObject
                | MessageType::AddObjectCompleted
                | MessageType::SendText
        )
    }

    async fn handle(&self, msg: &Message, payload: Option<&[u8]>) -> RuntimeResult<Vec<Outgoing>> {
        match msg.message_type() {
            MessageType::AddObject => self.on_add_object(msg),
            MessageType::RequestObject => self.on_request_object(msg),
            MessageType::SendObject => self.on_send_object(msg, payload),
            MessageType::AddObjectCompleted => self.on_completed(msg),
            MessageType::SendText => self.on_send_text(msg),
            _ => Ok(Vec::new()),
        }
    }
}
