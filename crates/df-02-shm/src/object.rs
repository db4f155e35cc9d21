//! Process-local handle to a shared object
//!
//! Every live [`Object`] owns exactly one reference on its record. Cloning
//! acquires another, dropping releases it; the record is destroyed by the
//! segment when the last reference anywhere on the host goes away.
//!
//! Attachments form a tree: an object holds one reference on each attached
//! object. Attaching an object to one of its own attachments leaks both.

use crate::data::{CompletionCallback, DataSnapshot, ObjectData};
use crate::error::{ObjectError, ObjectResult};
use crate::registry::DataObject;
use crate::shm::Shm;
use shared_types::{Meta, ObjectType, ShmHandle};
use std::fmt;
use std::sync::Arc;
use tracing::{error, trace};

pub struct Object {
    handle: ShmHandle,
    data: Arc<ObjectData>,
    shm: Arc<Shm>,
}

impl Object {
    /// Wrap `data`, acquiring a new reference.
    pub(crate) fn wrap(shm: Arc<Shm>, handle: ShmHandle, data: Arc<ObjectData>) -> Self {
        data.ref_();
        Self { handle, data, shm }
    }

    /// Wrap `data`, taking over a reference the caller already holds.
    pub(crate) fn adopt(shm: Arc<Shm>, handle: ShmHandle, data: Arc<ObjectData>) -> Self {
        Self { handle, data, shm }
    }

    #[must_use]
    pub fn handle(&self) -> ShmHandle {
        self.handle
    }

    #[must_use]
    pub fn shm(&self) -> &Arc<Shm> {
        &self.shm
    }

    #[must_use]
    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.data.name()
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.data.object_type()
    }

    #[must_use]
    pub fn refcount(&self) -> i32 {
        self.data.refcount()
    }

    #[must_use]
    pub fn meta(&self) -> Meta {
        self.data.meta()
    }

    pub fn set_meta(&self, meta: Meta) {
        self.data.set_meta(meta);
    }

    /// Is this the same record as `other`?
    #[must_use]
    pub fn same_as(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    // Attributes

    pub fn add_attribute(&self, key: &str, value: &str) {
        self.data.add_attribute(key, value);
    }

    pub fn set_attribute_list(&self, key: &str, values: Vec<String>) {
        self.data.set_attribute_list(key, values);
    }

    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<String> {
        self.data.get_attribute(key)
    }

    #[must_use]
    pub fn get_attributes(&self, key: &str) -> Vec<String> {
        self.data.get_attributes(key)
    }

    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.data.has_attribute(key)
    }

    #[must_use]
    pub fn attribute_list(&self) -> Vec<String> {
        self.data.attribute_list()
    }

    /// Copy all attributes of `src`. With `replace`, a key present on both
    /// takes the values of `src`; otherwise they are appended.
    pub fn copy_attributes(&self, src: &Object, replace: bool) {
        for (key, values) in src.data.attributes_clone() {
            if replace {
                self.data.set_attribute_list(&key, values);
            } else {
                for value in &values {
                    self.data.add_attribute(&key, value);
                }
            }
        }
    }

    // Attachments

    /// Attach `target` under `key`. Returns `false` if the key is taken.
    pub fn add_attachment(&self, key: &str, target: &Object) -> ObjectResult<bool> {
        let handle = self.shm.handle_from_object(target)?;
        target.data.ref_();
        if self.data.insert_attachment(key, handle) {
            trace!(object = self.name(), key = key, target = target.name(), "Attachment added");
            return Ok(true);
        }
        self.release(handle);
        Ok(false)
    }

    /// New wrapper for the object attached under `key`.
    #[must_use]
    pub fn get_attachment(&self, key: &str) -> Option<Object> {
        let handle = self.data.attachment(key)?;
        self.shm.object_from_handle(handle).ok()
    }

    #[must_use]
    pub fn has_attachment(&self, key: &str) -> bool {
        self.data.attachment(key).is_some()
    }

    /// Keys of all attachments.
    #[must_use]
    pub fn attachment_list(&self) -> Vec<String> {
        self.data.attachments_clone().into_keys().collect()
    }

    /// Detach the object under `key`, releasing the reference held on it.
    pub fn remove_attachment(&self, key: &str) -> bool {
        match self.data.remove_attachment(key) {
            Some(handle) => {
                self.release(handle);
                true
            }
            None => false,
        }
    }

    /// Attach everything attached to `src`. With `replace`, keys present on
    /// both are rebound; otherwise the existing attachment stays.
    pub fn copy_attachments(&self, src: &Object, replace: bool) -> ObjectResult<()> {
        self.shm.handle_from_object(src)?;
        for (key, handle) in src.data.attachments_clone() {
            self.shm.segment().ref_handle(handle)?;
            if replace {
                if let Some(old) = self.data.replace_attachment(&key, handle) {
                    self.release(old);
                }
            } else if !self.data.insert_attachment(&key, handle) {
                self.release(handle);
            }
        }
        Ok(())
    }

    fn release(&self, handle: ShmHandle) {
        if let Err(e) = self.shm.segment().unref(handle, self.shm.registry()) {
            error!(object = self.name(), handle = %handle, error = %e, "Releasing reference failed");
        }
    }

    // Unresolved references

    pub fn unresolved_reference(&self) {
        self.data.unresolved_reference();
    }

    pub fn reference_resolved(&self, on_complete: Option<CompletionCallback>) -> bool {
        self.data.reference_resolved(on_complete)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.data.is_complete()
    }

    // Copies and serialization

    /// Deep copy of the record under a fresh name. Attachments are shared.
    pub fn clone_object(&self) -> ObjectResult<Object> {
        let copy = self
            .shm
            .construct(self.object_type(), self.meta(), self.data.payload_clone())?;
        copy.copy_attributes(self, true);
        copy.copy_attachments(self, true)?;
        Ok(copy)
    }

    /// Self-contained description of this object and its attachments.
    pub fn snapshot(&self) -> ObjectResult<DataSnapshot> {
        let mut attachments = Vec::new();
        for (key, handle) in self.data.attachments_clone() {
            let attached = self.shm.object_from_handle(handle)?;
            attachments.push((key, attached.snapshot()?));
        }
        Ok(DataSnapshot {
            object_type: self.object_type(),
            name: self.name().to_string(),
            meta: self.meta(),
            attributes: self.data.attributes_clone(),
            payload: self.data.payload_clone(),
            attachments,
        })
    }

    pub fn to_bytes(&self) -> ObjectResult<Vec<u8>> {
        bincode::serialize(&self.snapshot()?).map_err(|e| ObjectError::Serialization(e.to_string()))
    }

    /// Typed view chosen by the stored type tag.
    pub fn create(self) -> ObjectResult<Box<dyn DataObject>> {
        let shm = self.shm.clone();
        shm.registry().create_from_data(self)
    }
}

impl Clone for Object {
    fn clone(&self) -> Self {
        Self::wrap(self.shm.clone(), self.handle, self.data.clone())
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        if let Err(e) = self.shm.segment().unref(self.handle, self.shm.registry()) {
            error!(object = self.data.name(), handle = %self.handle, error = %e, "Dropping object failed");
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("name", &self.name())
            .field("type", &self.object_type())
            .field("handle", &self.handle)
            .field("refcount", &self.refcount())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShmConfig;
    use crate::data::DataPayload;
    use crate::registry::ObjectTypeRegistry;
    use crate::segment::SegmentRegistry;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn shm() -> Arc<Shm> {
        Shm::attach(
            &ShmConfig::named("objects").with_initial_size(1 << 20),
            &SegmentRegistry::new(),
            Arc::new(ObjectTypeRegistry::with_builtin_types()),
            3,
            0,
            None,
        )
        .unwrap()
    }

    fn points(shm: &Arc<Shm>) -> Object {
        shm.construct(ObjectType::Points, Meta::default(), DataPayload::Empty)
            .unwrap()
    }

    #[test]
    fn test_clone_and_drop_track_refcount() {
        let shm = shm();
        let obj = points(&shm);
        assert_eq!(obj.refcount(), 1);
        let copy = obj.clone();
        assert_eq!(obj.refcount(), 2);
        drop(copy);
        assert_eq!(obj.refcount(), 1);
        let name = obj.name().to_string();
        drop(obj);
        assert!(shm.object_from_name(&name).is_none());
        assert_eq!(shm.segment().live_records(), 0);
    }

    #[test]
    fn test_attachment_keeps_target_alive() {
        let shm = shm();
        let grid = points(&shm);
        let normals = shm
            .construct(ObjectType::Normals, Meta::default(), DataPayload::Empty)
            .unwrap();
        let normals_name = normals.name().to_string();

        assert!(grid.add_attachment("normals", &normals).unwrap());
        assert!(!grid.add_attachment("normals", &normals).unwrap());
        assert_eq!(normals.refcount(), 2);
        drop(normals);

        let fetched = grid.get_attachment("normals").unwrap();
        assert_eq!(fetched.name(), normals_name);
        drop(fetched);

        drop(grid);
        assert!(shm.object_from_name(&normals_name).is_none());
    }

    #[test]
    fn test_remove_attachment_releases() {
        let shm = shm();
        let grid = points(&shm);
        let other = points(&shm);
        grid.add_attachment("extra", &other).unwrap();
        assert!(grid.remove_attachment("extra"));
        assert!(!grid.remove_attachment("extra"));
        assert!(!grid.has_attachment("extra"));
        assert_eq!(other.refcount(), 1);
    }

    #[test]
    fn test_copy_attributes_replace_and_append() {
        let shm = shm();
        let src = points(&shm);
        src.add_attribute("_species", "pressure");
        let dst = points(&shm);
        dst.add_attribute("_species", "velocity");

        dst.copy_attributes(&src, false);
        assert_eq!(dst.get_attributes("_species"), vec!["velocity", "pressure"]);

        dst.copy_attributes(&src, true);
        assert_eq!(dst.get_attributes("_species"), vec!["pressure"]);
    }

    #[test]
    fn test_copy_attachments_without_replace_keeps_existing() {
        let shm = shm();
        let first = points(&shm);
        let second = points(&shm);
        let src = points(&shm);
        let dst = points(&shm);
        src.add_attachment("a", &first).unwrap();
        dst.add_attachment("a", &second).unwrap();

        dst.copy_attachments(&src, false).unwrap();
        assert!(dst.get_attachment("a").unwrap().same_as(&second));
        assert_eq!(first.refcount(), 2);

        dst.copy_attachments(&src, true).unwrap();
        assert!(dst.get_attachment("a").unwrap().same_as(&first));
        assert_eq!(first.refcount(), 3);
        assert_eq!(second.refcount(), 1);
    }

    #[test]
    fn test_clone_object_gets_new_name() {
        let shm = shm();
        let obj = points(&shm);
        obj.add_attribute("_part", "1");
        let copy = obj.clone_object().unwrap();
        assert_ne!(copy.name(), obj.name());
        assert_eq!(copy.get_attribute("_part").as_deref(), Some("1"));
        assert_eq!(copy.object_type(), ObjectType::Points);
    }

    #[test]
    fn test_bytes_rebuild_in_other_segment() {
        let sender = shm();
        let receiver = Shm::attach(
            &ShmConfig::named("remote").with_initial_size(1 << 20),
            &SegmentRegistry::new(),
            Arc::new(ObjectTypeRegistry::with_builtin_types()),
            9,
            0,
            None,
        )
        .unwrap();

        let grid = sender
            .construct(
                ObjectType::Points,
                Meta::default().with_num_blocks(4),
                DataPayload::Coords {
                    x: vec![1.0, 2.0],
                    y: vec![0.0, 0.0],
                    z: vec![3.0, 4.0],
                },
            )
            .unwrap();
        let normals = points(&sender);
        grid.add_attachment("normals", &normals).unwrap();
        grid.add_attribute("_species", "grid");

        let rebuilt = receiver.object_from_bytes(&grid.to_bytes().unwrap()).unwrap();
        assert_eq!(rebuilt.name(), grid.name());
        assert_eq!(rebuilt.meta().num_blocks, 4);
        assert_eq!(rebuilt.get_attribute("_species").as_deref(), Some("grid"));
        assert_eq!(
            rebuilt.get_attachment("normals").unwrap().name(),
            normals.name()
        );
        assert_eq!(rebuilt.snapshot().unwrap(), grid.snapshot().unwrap());

        let again = receiver.object_from_bytes(&grid.to_bytes().unwrap()).unwrap();
        assert!(again.same_as(&rebuilt));
    }

    #[test]
    fn test_completion_callback_runs_once_resolved() {
        let shm = shm();
        let obj = points(&shm);
        obj.unresolved_reference();
        obj.unresolved_reference();
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        assert!(!obj.reference_resolved(Some(Box::new(move || flag.store(true, Ordering::SeqCst)))));
        assert!(!done.load(Ordering::SeqCst));
        assert!(obj.reference_resolved(None));
        assert!(done.load(Ordering::SeqCst));
        assert!(obj.is_complete());
    }

    #[test]
    fn test_create_typed_view() {
        let shm = shm();
        let obj = points(&shm);
        let typed = obj.create().unwrap();
        assert_eq!(typed.object_type(), ObjectType::Points);
    }
}
