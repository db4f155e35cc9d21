//! Owner-side bookkeeping of outstanding announcements.
//!
//! A receiver confirms every announcement with `AddObjectCompleted`. If the
//! receiver took the object by handle, the token is already consumed and
//! the entry is just forgotten. If it pulled a byte copy from another host,
//! the token is still held and the owner releases it here.

use crate::domain::handle_path::release_token;
use crate::error::{TransferError, TransferResult};
use df_02_shm::Shm;
use parking_lot::Mutex;
use shared_types::{Message, MessageType, ShmHandle};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Announcement {
    name: String,
    handle: ShmHandle,
    token: u64,
}

#[derive(Debug, Default)]
pub struct Retention {
    outstanding: Mutex<HashMap<Uuid, Announcement>>,
}

impl Retention {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember an announcement sent by this process.
    pub fn track(&self, add_msg: &Message) -> TransferResult<()> {
        let add = add_msg.as_add_object().ok_or(TransferError::UnexpectedMessage {
            expected: MessageType::AddObject,
            found: add_msg.message_type(),
        })?;
        self.outstanding.lock().insert(
            add_msg.uuid(),
            Announcement {
                name: add.name.to_string(),
                handle: add.handle,
                token: add.transfer,
            },
        );
        Ok(())
    }

    /// Settle the announcement confirmed by `completed`. Returns `true` if
    /// a still-held reference was released.
    pub fn complete(&self, shm: &Shm, completed: &Message) -> TransferResult<bool> {
        if completed.message_type() != MessageType::AddObjectCompleted {
            return Err(TransferError::UnexpectedMessage {
                expected: MessageType::AddObjectCompleted,
                found: completed.message_type(),
            });
        }
        let Some(entry) = self.outstanding.lock().remove(&completed.uuid()) else {
            warn!(uuid = %completed.uuid(), "Completion for unknown announcement");
            return Err(TransferError::UnknownAnnouncement(completed.uuid()));
        };
        if !shm.segment().transfer_pending(entry.token) {
            debug!(object = %entry.name, "Announcement completed by handle");
            return Ok(false);
        }
        release_token(shm, entry.token, entry.handle)?;
        debug!(object = %entry.name, "Remote copy completed, reference released");
        Ok(true)
    }

    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.lock().len()
    }

    /// Release every announcement still held, e.g. at shutdown.
    pub fn release_all(&self, shm: &Shm) -> usize {
        let entries: Vec<Announcement> = self.outstanding.lock().drain().map(|(_, a)| a).collect();
        let mut released = 0;
        for entry in entries {
            if !shm.segment().transfer_pending(entry.token) {
                continue;
            }
            match release_token(shm, entry.token, entry.handle) {
                Ok(()) => {
                    warn!(object = %entry.name, "Unconfirmed announcement released");
                    released += 1;
                }
                Err(e) => warn!(object = %entry.name, error = %e, "Releasing announcement failed"),
            }
        }
        released
    }
}
