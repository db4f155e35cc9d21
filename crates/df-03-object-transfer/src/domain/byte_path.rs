//! Cross-host transfer by serialized bytes.
//!
//! ```text
//! receiver                         owner
//!    │── RequestObject(uuid) ─────────▶│
//!    │◀──── SendObject(uuid, size) ────│
//!    │◀──── size bytes ────────────────│
//! ```

use crate::error::{TransferError, TransferResult};
use df_02_shm::{Object, Shm};
use shared_types::{Message, MessageType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Request the object announced by `add_msg` from its owner.
pub fn request_for(add_msg: &Message) -> TransferResult<Message> {
    let add = add_msg.as_add_object().ok_or(TransferError::UnexpectedMessage {
        expected: MessageType::AddObject,
        found: add_msg.message_type(),
    })?;
    Ok(Message::request_object(add_msg, add.name.as_str(), "", false)?)
}

/// Serialize the requested object. Returns the `SendObject` header and the
/// bytes that follow it.
pub fn answer_request(shm: &Arc<Shm>, request: &Message) -> TransferResult<(Message, Vec<u8>)> {
    let body = request.as_request_object().ok_or(TransferError::UnexpectedMessage {
        expected: MessageType::RequestObject,
        found: request.message_type(),
    })?;
    let Some(obj) = shm.object_from_name(body.object_id.as_str()) else {
        warn!(object = %body.object_id, requester = request.sender_id(), "Requested object not available");
        return Err(TransferError::Unavailable {
            name: body.object_id.to_string(),
            segment: shm.name().to_string(),
        });
    };

    let bytes = obj.to_bytes()?;
    let mut reply = Message::send_object(request, obj.object_type(), obj.meta(), bytes.len() as u64)?;
    reply.set_sender_id(shm.module_id());
    reply.set_rank(shm.rank());
    debug!(object = obj.name(), size = bytes.len(), dest = request.sender_id(), "Object serialized");
    Ok((reply, bytes))
}

/// Rebuild the object announced by `send_msg` from `bytes`.
pub fn receive_object(shm: &Arc<Shm>, send_msg: &Message, bytes: &[u8]) -> TransferResult<Object> {
    let header = send_msg.as_send_object().ok_or(TransferError::UnexpectedMessage {
        expected: MessageType::SendObject,
        found: send_msg.message_type(),
    })?;
    let received = bytes.len() as u64;
    if received != header.payload_size {
        warn!(
            object = %header.object_id,
            declared = header.payload_size,
            received = received,
            "Object payload size mismatch"
        );
        return Err(TransferError::SizeMismatch {
            name: header.object_id.to_string(),
            declared: header.payload_size,
            received,
        });
    }

    let obj = shm.object_from_bytes(bytes)?;
    if header.object_id != *obj.name() {
        return Err(TransferError::WrongObject {
            expected: header.object_id.to_string(),
            found: obj.name().to_string(),
        });
    }
    debug!(object = obj.name(), size = received, "Object received");
    Ok(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::handle_path::{announce, drop_announcement};
    use df_02_shm::{DataPayload, ObjectTypeRegistry, SegmentRegistry, ShmConfig};
    use rand::Rng;
    use shared_types::{Meta, ObjectType};

    fn attach(name: &str, module: i32) -> Arc<Shm> {
        Shm::attach(
            &ShmConfig::named(name).with_initial_size(1 << 22),
            &SegmentRegistry::new(),
            Arc::new(ObjectTypeRegistry::with_builtin_types()),
            module,
            0,
            None,
        )
        .unwrap()
    }

    fn random_points(shm: &Arc<Shm>, n: usize) -> Object {
        let mut rng = rand::thread_rng();
        let mut coords = || (0..n).map(|_| rng.gen::<f32>()).collect::<Vec<_>>();
        let (x, y, z) = (coords(), coords(), coords());
        shm.construct(
            ObjectType::Points,
            Meta::default().with_num_blocks(2),
            DataPayload::Coords { x, y, z },
        )
        .unwrap()
    }

    #[test]
    fn test_declared_size_matches_bytes() {
        let owner = attach("host_a", 5);
        let receiver = attach("host_b", 7);
        let obj = random_points(&owner, 1000);

        let mut add = announce(&obj, "out", "in").unwrap();
        add.set_dest_id(7);
        let mut request = request_for(&add).unwrap();
        request.set_sender_id(7);
        assert_eq!(request.uuid(), add.uuid());
        assert_eq!(request.dest_id(), 5);

        let (reply, bytes) = answer_request(&owner, &request).unwrap();
        let header = reply.as_send_object().unwrap();
        assert_eq!(header.payload_size, bytes.len() as u64);
        assert_eq!(header.object_meta().num_blocks, 2);
        assert_eq!(reply.uuid(), add.uuid());
        assert_eq!(reply.dest_id(), 7);

        let copy = receive_object(&receiver, &reply, &bytes).unwrap();
        assert_eq!(copy.name(), obj.name());
        assert_eq!(copy.snapshot().unwrap().payload, obj.snapshot().unwrap().payload);

        drop_announcement(&owner, &add).unwrap();
        assert_eq!(obj.refcount(), 1);
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        let owner = attach("host_a", 5);
        let receiver = attach("host_b", 7);
        let obj = random_points(&owner, 10);
        let request = Message::request_object_from(5, 0, obj.name(), "", false);
        let (reply, bytes) = answer_request(&owner, &request).unwrap();
        let result = receive_object(&receiver, &reply, &bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(TransferError::SizeMismatch { .. })));
        assert!(receiver.object_from_name(obj.name()).is_none());
    }

    #[test]
    fn test_request_for_unknown_object() {
        let owner = attach("host_a", 5);
        let request = Message::request_object_from(5, 0, "Object_9_0_0", "", false);
        assert!(matches!(
            answer_request(&owner, &request),
            Err(TransferError::Unavailable { .. })
        ));
    }
}
