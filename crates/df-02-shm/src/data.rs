//! Object records stored in a segment
//!
//! An [`ObjectData`] is the shared part of an object: type tag, name,
//! reference count, metadata, attributes, attachments and the typed payload.
//! Records are only ever destroyed by [`Segment::unref`](crate::Segment::unref)
//! when the count drops to zero.

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use serde::{Deserialize, Serialize};
use shared_types::{Meta, ObjectType, ScalarKind, ShmHandle};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

/// Callback run when the last unresolved reference of an object resolves.
pub type CompletionCallback = Box<dyn FnOnce() + Send>;

/// Values of one component of an array object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarArray {
    Byte(Vec<u8>),
    Int(Vec<i32>),
    Index(Vec<u64>),
    Scalar(Vec<f32>),
}

impl ScalarArray {
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Byte(_) => ScalarKind::Byte,
            Self::Int(_) => ScalarKind::Int,
            Self::Index(_) => ScalarKind::Index,
            Self::Scalar(_) => ScalarKind::Scalar,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Index(v) => v.len(),
            Self::Scalar(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Int(v) => v.len() * 4,
            Self::Index(v) => v.len() * 8,
            Self::Scalar(v) => v.len() * 4,
        }
    }

    /// Empty array of `kind`.
    #[must_use]
    pub fn empty(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Byte => Self::Byte(Vec::new()),
            ScalarKind::Int => Self::Int(Vec::new()),
            ScalarKind::Index => Self::Index(Vec::new()),
            ScalarKind::Scalar => Self::Scalar(Vec::new()),
        }
    }
}

/// Type-specific content of a record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum DataPayload {
    #[default]
    Empty,
    /// Three coordinate arrays of equal length.
    Coords {
        x: Vec<f32>,
        y: Vec<f32>,
        z: Vec<f32>,
    },
    /// Color lookup table plus one texture coordinate per vertex.
    Texture1D {
        min: f64,
        max: f64,
        pixels: Vec<u8>,
        coords: Vec<f32>,
    },
    /// One array per vector component.
    Array(Vec<ScalarArray>),
}

impl DataPayload {
    #[must_use]
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Coords { x, y, z } => (x.len() + y.len() + z.len()) * 4,
            Self::Texture1D { pixels, coords, .. } => 16 + pixels.len() + coords.len() * 4,
            Self::Array(components) => components.iter().map(ScalarArray::byte_size).sum(),
        }
    }
}

/// Shared state of one object.
pub struct ObjectData {
    object_type: ObjectType,
    name: String,
    refcount: AtomicI32,
    unresolved: AtomicI32,
    meta: RwLock<Meta>,
    attributes: ReentrantMutex<RefCell<BTreeMap<String, Vec<String>>>>,
    attachments: ReentrantMutex<RefCell<BTreeMap<String, ShmHandle>>>,
    payload: RwLock<DataPayload>,
    on_complete: Mutex<Option<CompletionCallback>>,
}

impl ObjectData {
    /// New record with no references.
    #[must_use]
    pub fn new(object_type: ObjectType, name: String, meta: Meta, payload: DataPayload) -> Self {
        Self {
            object_type,
            name,
            refcount: AtomicI32::new(0),
            unresolved: AtomicI32::new(0),
            meta: RwLock::new(meta),
            attributes: ReentrantMutex::new(RefCell::new(BTreeMap::new())),
            attachments: ReentrantMutex::new(RefCell::new(BTreeMap::new())),
            payload: RwLock::new(payload),
            on_complete: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn refcount(&self) -> i32 {
        self.refcount.load(Ordering::Acquire)
    }

    /// Acquire one reference. Returns the new count.
    pub fn ref_(&self) -> i32 {
        self.refcount.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Release one reference. Returns the new count.
    pub(crate) fn unref_count(&self) -> i32 {
        self.refcount.fetch_sub(1, Ordering::AcqRel) - 1
    }

    #[must_use]
    pub fn meta(&self) -> Meta {
        *self.meta.read()
    }

    pub fn set_meta(&self, meta: Meta) {
        *self.meta.write() = meta;
    }

    /// Run `f` with the payload.
    pub fn with_payload<R>(&self, f: impl FnOnce(&DataPayload) -> R) -> R {
        f(&self.payload.read())
    }

    pub fn with_payload_mut<R>(&self, f: impl FnOnce(&mut DataPayload) -> R) -> R {
        f(&mut self.payload.write())
    }

    pub(crate) fn payload_clone(&self) -> DataPayload {
        self.payload.read().clone()
    }

    // Attributes

    pub fn add_attribute(&self, key: &str, value: &str) {
        let guard = self.attributes.lock();
        guard
            .borrow_mut()
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    pub fn set_attribute_list(&self, key: &str, values: Vec<String>) {
        let guard = self.attributes.lock();
        guard.borrow_mut().insert(key.to_string(), values);
    }

    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<String> {
        let guard = self.attributes.lock();
        let map = guard.borrow();
        map.get(key).and_then(|v| v.first().cloned())
    }

    #[must_use]
    pub fn get_attributes(&self, key: &str) -> Vec<String> {
        let guard = self.attributes.lock();
        let map = guard.borrow();
        map.get(key).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        let guard = self.attributes.lock();
        let found = guard.borrow().contains_key(key);
        found
    }

    #[must_use]
    pub fn attribute_list(&self) -> Vec<String> {
        let guard = self.attributes.lock();
        let keys = guard.borrow().keys().cloned().collect();
        keys
    }

    pub(crate) fn attributes_clone(&self) -> BTreeMap<String, Vec<String>> {
        let guard = self.attributes.lock();
        let map = guard.borrow().clone();
        map
    }

    // Attachments. The record holds one reference on every attached record;
    // callers adjust counts.

    pub(crate) fn attachment(&self, key: &str) -> Option<ShmHandle> {
        let guard = self.attachments.lock();
        let found = guard.borrow().get(key).copied();
        found
    }

    /// Insert unless `key` is taken. Returns whether it was inserted.
    pub(crate) fn insert_attachment(&self, key: &str, handle: ShmHandle) -> bool {
        let guard = self.attachments.lock();
        let mut map = guard.borrow_mut();
        if map.contains_key(key) {
            return false;
        }
        map.insert(key.to_string(), handle);
        true
    }

    /// Insert or replace. Returns the replaced handle.
    pub(crate) fn replace_attachment(&self, key: &str, handle: ShmHandle) -> Option<ShmHandle> {
        let guard = self.attachments.lock();
        let old = guard.borrow_mut().insert(key.to_string(), handle);
        old
    }

    pub(crate) fn remove_attachment(&self, key: &str) -> Option<ShmHandle> {
        let guard = self.attachments.lock();
        let old = guard.borrow_mut().remove(key);
        old
    }

    pub(crate) fn take_attachments(&self) -> Vec<ShmHandle> {
        let guard = self.attachments.lock();
        let taken = std::mem::take(&mut *guard.borrow_mut());
        taken.into_values().collect()
    }

    pub(crate) fn attachments_clone(&self) -> BTreeMap<String, ShmHandle> {
        let guard = self.attachments.lock();
        let map = guard.borrow().clone();
        map
    }

    // Unresolved references

    pub fn unresolved_reference(&self) {
        self.unresolved.fetch_add(1, Ordering::AcqRel);
    }

    /// Resolve one reference. When none remain, the completion callback runs
    /// and `true` is returned.
    pub fn reference_resolved(&self, on_complete: Option<CompletionCallback>) -> bool {
        if let Some(cb) = on_complete {
            *self.on_complete.lock() = Some(cb);
        }
        let remaining = self.unresolved.fetch_sub(1, Ordering::AcqRel) - 1;
        if remaining > 0 {
            return false;
        }
        if let Some(cb) = self.on_complete.lock().take() {
            cb();
        }
        true
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.load(Ordering::Acquire) <= 0
    }
}

impl fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectData")
            .field("type", &self.object_type)
            .field("name", &self.name)
            .field("refcount", &self.refcount())
            .finish_non_exhaustive()
    }
}

/// Serialized form of an object for the byte transfer path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSnapshot {
    pub object_type: ObjectType,
    pub name: String,
    pub meta: Meta,
    pub attributes: BTreeMap<String, Vec<String>>,
    pub payload: DataPayload,
    pub attachments: Vec<(String, DataSnapshot)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn record() -> ObjectData {
        ObjectData::new(
            ObjectType::Points,
            "Object_1_0_0".to_string(),
            Meta::default(),
            DataPayload::Empty,
        )
    }

    #[test]
    fn test_refcount() {
        let data = record();
        assert_eq!(data.refcount(), 0);
        assert_eq!(data.ref_(), 1);
        assert_eq!(data.ref_(), 2);
        assert_eq!(data.unref_count(), 1);
    }

    #[test]
    fn test_attribute_roundtrip() {
        let data = record();
        data.add_attribute("_species", "pressure");
        assert_eq!(data.get_attribute("_species").as_deref(), Some("pressure"));
        data.add_attribute("_species", "velocity");
        assert_eq!(data.get_attributes("_species"), vec!["pressure", "velocity"]);
        assert!(data.has_attribute("_species"));
        assert!(!data.has_attribute("_part"));
    }

    #[test]
    fn test_attribute_list_preserves_order() {
        let data = record();
        let values = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        data.set_attribute_list("_order", values.clone());
        assert_eq!(data.get_attributes("_order"), values);
        assert_eq!(data.attribute_list(), vec!["_order".to_string()]);
    }

    #[test]
    fn test_attachment_slots() {
        let data = record();
        let a = ShmHandle::new(1, 0);
        let b = ShmHandle::new(2, 0);
        assert!(data.insert_attachment("grid", a));
        assert!(!data.insert_attachment("grid", b));
        assert_eq!(data.replace_attachment("grid", b), Some(a));
        assert_eq!(data.attachment("grid"), Some(b));
        assert_eq!(data.take_attachments(), vec![b]);
        assert_eq!(data.attachment("grid"), None);
    }

    #[test]
    fn test_unresolved_references_complete_once() {
        let data = record();
        data.unresolved_reference();
        data.unresolved_reference();
        assert!(!data.is_complete());

        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        assert!(!data.reference_resolved(Some(Box::new(move || {
            flag.store(true, Ordering::SeqCst)
        }))));
        assert!(!done.load(Ordering::SeqCst));
        assert!(data.reference_resolved(None));
        assert!(done.load(Ordering::SeqCst));
        assert!(data.is_complete());
    }

    #[test]
    fn test_payload_size() {
        let payload = DataPayload::Array(vec![
            ScalarArray::Scalar(vec![0.0; 10]),
            ScalarArray::Index(vec![0; 2]),
        ]);
        assert_eq!(payload.byte_size(), 56);
    }
}
