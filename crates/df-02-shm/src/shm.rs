//! Per-process shared object store
//!
//! A [`Shm`] binds one process (module id and rank) to the segment of its
//! host. It mints object names, turns handles into wrappers and back, and
//! announces new records on an optional local notification queue.

use crate::config::ShmConfig;
use crate::data::{DataPayload, DataSnapshot, ObjectData};
use crate::error::{ObjectError, ObjectResult, SegmentError};
use crate::object::Object;
use crate::registry::ObjectTypeRegistry;
use crate::segment::{Segment, SegmentRegistry};
use shared_bus::QueueSender;
use shared_types::message::NewObject;
use shared_types::{Message, Meta, ObjectType, ProcessId, ShmHandle};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Shm {
    module_id: ProcessId,
    rank: i32,
    segment: Arc<Segment>,
    registry: Arc<ObjectTypeRegistry>,
    sequence: AtomicU64,
    notify: Option<QueueSender>,
}

impl Shm {
    /// Attach to the segment named in `config`, creating it if needed.
    ///
    /// Creation starts at the configured size and halves on failure down to
    /// the configured floor. Failing at the floor is fatal for the caller.
    pub fn attach(
        config: &ShmConfig,
        segments: &SegmentRegistry,
        registry: Arc<ObjectTypeRegistry>,
        module_id: ProcessId,
        rank: i32,
        notify: Option<QueueSender>,
    ) -> Result<Arc<Self>, SegmentError> {
        let mut segment = None;
        for size in config.ladder() {
            match segments.open_or_create(&config.name, size) {
                Ok(s) => {
                    segment = Some(s);
                    break;
                }
                Err(e) => debug!(segment = %config.name, size = size, error = %e, "Segment size refused"),
            }
        }
        let Some(segment) = segment else {
            error!(segment = %config.name, floor = config.min_size, "Cannot create shared segment");
            return Err(SegmentError::Exhausted {
                name: config.name.clone(),
                floor: config.min_size,
            });
        };

        info!(
            segment = %config.name,
            size = segment.capacity(),
            module = module_id,
            rank = rank,
            "Attached to shared segment"
        );
        Ok(Arc::new(Self {
            module_id,
            rank,
            segment,
            registry,
            sequence: AtomicU64::new(0),
            notify,
        }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.segment.name()
    }

    #[must_use]
    pub fn module_id(&self) -> ProcessId {
        self.module_id
    }

    #[must_use]
    pub fn rank(&self) -> i32 {
        self.rank
    }

    #[must_use]
    pub fn segment(&self) -> &Arc<Segment> {
        &self.segment
    }

    #[must_use]
    pub fn registry(&self) -> &ObjectTypeRegistry {
        &self.registry
    }

    /// Fresh object name, unique for this module and rank.
    pub fn create_object_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("Object_{}_{}_{}", self.module_id, self.rank, seq)
    }

    /// Create a record under a fresh name and wrap it.
    pub fn construct(
        self: &Arc<Self>,
        object_type: ObjectType,
        meta: Meta,
        payload: DataPayload,
    ) -> ObjectResult<Object> {
        let name = self.create_object_id();
        self.construct_named(name, object_type, meta, payload)
    }

    fn construct_named(
        self: &Arc<Self>,
        name: String,
        object_type: ObjectType,
        meta: Meta,
        payload: DataPayload,
    ) -> ObjectResult<Object> {
        let (handle, data) = self
            .segment
            .allocate(ObjectData::new(object_type, name, meta, payload))?;
        self.publish(handle);
        Ok(Object::wrap(self.clone(), handle, data))
    }

    /// Handle of `obj` within this segment.
    pub fn handle_from_object(&self, obj: &Object) -> ObjectResult<ShmHandle> {
        if !Arc::ptr_eq(obj.shm().segment(), &self.segment) {
            return Err(ObjectError::ForeignSegment {
                object: obj.name().to_string(),
                segment: self.name().to_string(),
            });
        }
        Ok(obj.handle())
    }

    /// New wrapper for the record behind `handle`.
    pub fn object_from_handle(self: &Arc<Self>, handle: ShmHandle) -> ObjectResult<Object> {
        let data = self.segment.resolve(handle)?;
        Ok(Object::wrap(self.clone(), handle, data))
    }

    /// Wrapper taking over one reference already held for `handle`.
    pub fn adopt_handle(self: &Arc<Self>, handle: ShmHandle) -> ObjectResult<Object> {
        let data = self.segment.resolve(handle)?;
        Ok(Object::adopt(self.clone(), handle, data))
    }

    /// New wrapper for the live record named `name`.
    pub fn object_from_name(self: &Arc<Self>, name: &str) -> Option<Object> {
        let handle = self.segment.lookup(name)?;
        self.object_from_handle(handle).ok()
    }

    /// Tell the local manager about a new record. Best effort.
    pub fn publish(&self, handle: ShmHandle) {
        let Some(queue) = &self.notify else {
            return;
        };
        let mut msg = Message::new(NewObject {
            module: self.module_id,
            rank: self.rank,
            handle,
        });
        msg.set_sender_id(self.module_id);
        msg.set_rank(self.rank);
        if let Err(e) = queue.try_send(msg) {
            warn!(handle = %handle, error = %e, "New object notification lost");
        }
    }

    /// Rebuild an object from its serialized form. A live record with the
    /// same name is reused.
    pub fn object_from_bytes(self: &Arc<Self>, bytes: &[u8]) -> ObjectResult<Object> {
        let snapshot: DataSnapshot =
            bincode::deserialize(bytes).map_err(|e| ObjectError::Serialization(e.to_string()))?;
        self.restore(snapshot)
    }

    fn restore(self: &Arc<Self>, snapshot: DataSnapshot) -> ObjectResult<Object> {
        if let Some(existing) = self.object_from_name(&snapshot.name) {
            debug!(object = %snapshot.name, "Received object already present");
            return Ok(existing);
        }
        if !self.registry.is_registered(snapshot.object_type) {
            error!(object = %snapshot.name, object_type = %snapshot.object_type, "Received object of unregistered type");
            return Err(ObjectError::UnregisteredType(snapshot.object_type.tag()));
        }
        let obj = self.construct_named(
            snapshot.name,
            snapshot.object_type,
            snapshot.meta,
            snapshot.payload,
        )?;
        for (key, values) in snapshot.attributes {
            obj.set_attribute_list(&key, values);
        }
        for (key, attached) in snapshot.attachments {
            let attached = self.restore(attached)?;
            obj.add_attachment(&key, &attached)?;
        }
        Ok(obj)
    }
}

impl fmt::Debug for Shm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shm")
            .field("segment", &self.segment.name())
            .field("module_id", &self.module_id)
            .field("rank", &self.rank)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::MessageQueue;
    use shared_types::MessageType;
    use std::collections::HashSet;

    fn attach(segments: &SegmentRegistry, module: ProcessId) -> Arc<Shm> {
        Shm::attach(
            &ShmConfig::named("host").with_initial_size(1 << 20),
            segments,
            Arc::new(ObjectTypeRegistry::with_builtin_types()),
            module,
            0,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_ladder_settles_on_host_limit() {
        let segments = SegmentRegistry::with_host_limit(1 << 14);
        let shm = Shm::attach(
            &ShmConfig::named("small").with_initial_size(1 << 20),
            &segments,
            Arc::new(ObjectTypeRegistry::new()),
            1,
            0,
            None,
        )
        .unwrap();
        assert_eq!(shm.segment().capacity(), 1 << 14);
    }

    #[test]
    fn test_ladder_exhausted_is_error() {
        let segments = SegmentRegistry::with_host_limit(1024);
        let result = Shm::attach(
            &ShmConfig::named("none"),
            &segments,
            Arc::new(ObjectTypeRegistry::new()),
            1,
            0,
            None,
        );
        assert_eq!(
            result.unwrap_err(),
            SegmentError::Exhausted {
                name: "none".to_string(),
                floor: 4096
            }
        );
    }

    #[test]
    fn test_object_ids_unique() {
        let shm = attach(&SegmentRegistry::new(), 5);
        let ids: HashSet<String> = (0..1000).map(|_| shm.create_object_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.contains("Object_5_0_0"));
        assert!(ids.contains("Object_5_0_999"));
    }

    #[test]
    fn test_handle_object_roundtrip() {
        let shm = attach(&SegmentRegistry::new(), 5);
        let obj = shm
            .construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
            .unwrap();
        let handle = shm.handle_from_object(&obj).unwrap();
        let again = shm.object_from_handle(handle).unwrap();
        assert_eq!(again.name(), obj.name());
        assert_eq!(obj.refcount(), 2);
    }

    #[test]
    fn test_foreign_segment_rejected() {
        let a = attach(&SegmentRegistry::new(), 5);
        let b = attach(&SegmentRegistry::new(), 7);
        let obj = a
            .construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
            .unwrap();
        assert!(matches!(
            b.handle_from_object(&obj),
            Err(ObjectError::ForeignSegment { .. })
        ));
    }

    #[test]
    fn test_stale_handle_rejected() {
        let shm = attach(&SegmentRegistry::new(), 5);
        let obj = shm
            .construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
            .unwrap();
        let handle = obj.handle();
        drop(obj);
        assert!(matches!(
            shm.object_from_handle(handle),
            Err(ObjectError::Segment(SegmentError::StaleHandle(_)))
        ));
    }

    #[test]
    fn test_shared_between_processes_of_a_host() {
        let segments = SegmentRegistry::new();
        let a = attach(&segments, 5);
        let b = attach(&segments, 7);
        let obj = a
            .construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
            .unwrap();
        let seen = b.object_from_name(obj.name()).unwrap();
        assert_eq!(seen.refcount(), 2);
    }

    #[test]
    fn test_publish_notifies_queue() {
        let (tx, mut rx) = MessageQueue::bounded("manager", 4);
        let shm = Shm::attach(
            &ShmConfig::named("notify").with_initial_size(1 << 20),
            &SegmentRegistry::new(),
            Arc::new(ObjectTypeRegistry::with_builtin_types()),
            5,
            1,
            Some(tx),
        )
        .unwrap();
        let obj = shm
            .construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
            .unwrap();
        let note = rx.try_recv().unwrap();
        assert_eq!(note.message_type(), MessageType::NewObject);
        let body = note.as_new_object().unwrap();
        assert_eq!(body.handle, obj.handle());
        assert_eq!(body.rank, 1);
    }

    #[test]
    fn test_publish_full_queue_is_not_fatal() {
        let (tx, _rx) = MessageQueue::bounded("manager", 1);
        let shm = Shm::attach(
            &ShmConfig::named("full").with_initial_size(1 << 20),
            &SegmentRegistry::new(),
            Arc::new(ObjectTypeRegistry::with_builtin_types()),
            5,
            0,
            Some(tx),
        )
        .unwrap();
        for _ in 0..3 {
            assert!(shm
                .construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
                .is_ok());
        }
    }
}
