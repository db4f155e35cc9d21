//! Same-host transfer by segment handle.
//!
//! An announcement holds one reference on the object, identified by a
//! single-use transfer token. Exactly one of [`take_object`] or
//! [`drop_announcement`] consumes it.

use crate::error::{TransferError, TransferResult};
use df_02_shm::{Object, SegmentError, Shm};
use shared_types::message::{AddObject, ObjectName, ObjectReceived, PortName, ShmName};
use shared_types::{Message, MessageType, ShmHandle};
use std::sync::Arc;
use tracing::{debug, error, warn};

fn expect_add(msg: &Message) -> TransferResult<&AddObject> {
    msg.as_add_object().ok_or(TransferError::UnexpectedMessage {
        expected: MessageType::AddObject,
        found: msg.message_type(),
    })
}

/// Announce `obj` from `sender_port` to `dest_port`.
///
/// The returned message holds one extra reference on the object until it
/// is taken or dropped.
pub fn announce(obj: &Object, sender_port: &str, dest_port: &str) -> TransferResult<Message> {
    let shm = obj.shm();
    let token = shm.segment().mint_transfer(obj.handle())?;
    let mut msg = Message::new(AddObject {
        sender_port: PortName::new(sender_port),
        dest_port: PortName::new(dest_port),
        name: ObjectName::new(obj.name()),
        shm_name: ShmName::new(shm.name()),
        meta: obj.meta(),
        object_type: obj.object_type(),
        handle: obj.handle(),
        transfer: token,
    });
    msg.set_sender_id(shm.module_id());
    msg.set_rank(shm.rank());
    if msg.truncated() {
        warn!(object = obj.name(), port = sender_port, "Announcement fields truncated");
    }
    debug!(object = obj.name(), token = token, refs = obj.refcount(), "Object announced");
    Ok(msg)
}

/// Does the handle of `add` address a record in the segment of `shm`?
fn addresses_local_record(shm: &Shm, add: &AddObject) -> bool {
    if add.shm_name != *shm.name() {
        return false;
    }
    match shm.segment().resolve(add.handle) {
        Ok(data) => add.name == *data.name(),
        Err(_) => false,
    }
}

/// Redeem the announcement in `add_msg` into a local wrapper.
///
/// Same-segment announcements transfer their reference. Otherwise a live
/// record of the same name is used. A second call on the same message fails
/// without touching any reference count.
pub fn take_object(shm: &Arc<Shm>, add_msg: &Message) -> TransferResult<Object> {
    let add = expect_add(add_msg)?;

    if addresses_local_record(shm, add) {
        let handle = match shm.segment().redeem_transfer(add.transfer) {
            Ok(handle) => handle,
            Err(SegmentError::TransferConsumed(token)) => {
                warn!(object = %add.name, token = token, "Announcement already consumed");
                return Err(TransferError::AlreadyTaken {
                    name: add.name.to_string(),
                    token,
                });
            }
            Err(e) => return Err(e.into()),
        };
        let obj = shm.adopt_handle(handle).map_err(|e| {
            error!(object = %add.name, handle = %handle, error = %e, "Redeemed handle does not resolve");
            e
        })?;
        debug!(object = obj.name(), refs = obj.refcount(), "Object taken by handle");
        return Ok(obj);
    }

    match shm.object_from_name(add.name.as_str()) {
        Some(obj) => {
            debug!(object = obj.name(), "Object taken by name");
            Ok(obj)
        }
        None => {
            warn!(object = %add.name, segment = shm.name(), "Announced object not available");
            Err(TransferError::Unavailable {
                name: add.name.to_string(),
                segment: shm.name().to_string(),
            })
        }
    }
}

/// Release the reference held by an announcement that will not be taken.
pub fn drop_announcement(shm: &Shm, add_msg: &Message) -> TransferResult<()> {
    let add = expect_add(add_msg)?;
    if !addresses_local_record(shm, add) {
        return Err(TransferError::Unavailable {
            name: add.name.to_string(),
            segment: shm.name().to_string(),
        });
    }
    release_token(shm, add.transfer, add.handle)?;
    warn!(object = %add.name, token = add.transfer, "Announcement dropped");
    Ok(())
}

pub(crate) fn release_token(shm: &Shm, token: u64, expected: ShmHandle) -> TransferResult<()> {
    let handle = shm.segment().redeem_transfer(token)?;
    if handle != expected {
        error!(token = token, handle = %handle, expected = %expected, "Transfer token bound to another handle");
    }
    shm.segment().unref(handle, shm.registry())?;
    Ok(())
}

/// Broadcast notice that `obj` arrived on `port_name`.
pub fn object_received(add_msg: &Message, obj: &Object, port_name: &str) -> TransferResult<Message> {
    let add = expect_add(add_msg)?;
    let mut msg = Message::new(ObjectReceived {
        sender_port: add.sender_port,
        port_name: PortName::new(port_name),
        name: ObjectName::new(obj.name()),
        meta: obj.meta(),
        object_type: obj.object_type(),
    });
    msg.set_sender_id(obj.shm().module_id());
    msg.set_rank(obj.shm().rank());
    Ok(msg)
}
