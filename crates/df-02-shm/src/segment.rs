//! Named segments and the host registry
//!
//! A [`Segment`] is an arena of record slots addressed by
//! [`ShmHandle`]s (slot index plus generation). Freeing a slot bumps its
//! generation, so handles to a destroyed record stop resolving. All
//! processes of a host that open the same name share one segment through
//! the [`SegmentRegistry`].
//!
//! ```text
//! slot:  [0]──gen 3──▶ Object_5_0_1   refs 2
//!        [1]──gen 1──▶ (free)
//!        [2]──gen 0──▶ Object_7_0_4   refs 1 ──attachment──▶ [0]
//! ```

use crate::data::ObjectData;
use crate::error::SegmentError;
use crate::registry::ObjectTypeRegistry;
use parking_lot::{Mutex, RwLock};
use shared_types::ShmHandle;
use std::collections::HashMap;
use std::mem::size_of;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Accounted size of a record without payload.
pub const RECORD_SIZE: usize = size_of::<ObjectData>();

/// Default size of the memory a host can give to segments.
pub const DEFAULT_HOST_LIMIT: usize = 1 << 30;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    data: Option<Arc<ObjectData>>,
    charged: usize,
}

/// An arena of object records.
#[derive(Debug)]
pub struct Segment {
    name: String,
    capacity: usize,
    used: AtomicUsize,
    slots: RwLock<Vec<Slot>>,
    free: Mutex<Vec<u32>>,
    names: RwLock<HashMap<String, ShmHandle>>,
    transfers: Mutex<HashMap<u64, ShmHandle>>,
    next_transfer: AtomicU64,
}

impl Segment {
    fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            used: AtomicUsize::new(0),
            slots: RwLock::new(Vec::new()),
            free: Mutex::new(Vec::new()),
            names: RwLock::new(HashMap::new()),
            transfers: Mutex::new(HashMap::new()),
            next_transfer: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Acquire)
    }

    /// Number of live records.
    #[must_use]
    pub fn live_records(&self) -> usize {
        self.names.read().len()
    }

    /// Store `data` and return its handle. The record starts with the
    /// references it already carries.
    pub fn allocate(&self, data: ObjectData) -> Result<(ShmHandle, Arc<ObjectData>), SegmentError> {
        let charge = RECORD_SIZE + data.with_payload(|p| p.byte_size());
        let mut used = self.used.load(Ordering::Acquire);
        loop {
            if used + charge > self.capacity {
                return Err(SegmentError::OutOfSpace {
                    requested: charge,
                    available: self.capacity.saturating_sub(used),
                });
            }
            match self.used.compare_exchange_weak(
                used,
                used + charge,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(current) => used = current,
            }
        }

        let name = data.name().to_string();
        let mut names = self.names.write();
        if names.contains_key(&name) {
            self.used.fetch_sub(charge, Ordering::AcqRel);
            return Err(SegmentError::NameInUse(name));
        }

        let data = Arc::new(data);
        let mut slots = self.slots.write();
        let index = match self.free.lock().pop() {
            Some(i) => i,
            None => {
                slots.push(Slot::default());
                (slots.len() - 1) as u32
            }
        };
        let slot = &mut slots[index as usize];
        slot.data = Some(data.clone());
        slot.charged = charge;
        let handle = ShmHandle::new(index, slot.generation);
        names.insert(name, handle);

        trace!(segment = %self.name, handle = %handle, object = data.name(), "Record allocated");
        Ok((handle, data))
    }

    /// Record behind `handle`, if it is live.
    pub fn resolve(&self, handle: ShmHandle) -> Result<Arc<ObjectData>, SegmentError> {
        let slots = self.slots.read();
        slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.data.clone())
            .ok_or(SegmentError::StaleHandle(handle))
    }

    /// Handle of the live record named `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ShmHandle> {
        self.names.read().get(name).copied()
    }

    /// Acquire one reference on the record behind `handle`.
    pub fn ref_handle(&self, handle: ShmHandle) -> Result<i32, SegmentError> {
        Ok(self.resolve(handle)?.ref_())
    }

    /// Release one reference. At zero the record is destroyed through
    /// `registry` and its attachments are released in turn.
    ///
    /// This is the only place records are destroyed.
    pub fn unref(
        &self,
        handle: ShmHandle,
        registry: &ObjectTypeRegistry,
    ) -> Result<i32, SegmentError> {
        let data = self.resolve(handle)?;
        let count = data.unref_count();
        if count > 0 {
            return Ok(count);
        }
        if count < 0 {
            data.ref_();
            error!(segment = %self.name, handle = %handle, object = data.name(), "Reference count underflow");
            return Err(SegmentError::RefcountUnderflow(handle));
        }

        self.free_slot(handle, &data);
        registry.destroy(&data);
        debug!(segment = %self.name, object = data.name(), "Object destroyed");

        for attached in data.take_attachments() {
            if let Err(e) = self.unref(attached, registry) {
                error!(segment = %self.name, handle = %attached, error = %e, "Releasing attachment failed");
            }
        }
        Ok(0)
    }

    fn free_slot(&self, handle: ShmHandle, data: &ObjectData) {
        let mut names = self.names.write();
        let mut slots = self.slots.write();
        if let Some(slot) = slots.get_mut(handle.index as usize) {
            if slot.generation == handle.generation {
                slot.data = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.used.fetch_sub(slot.charged, Ordering::AcqRel);
                slot.charged = 0;
                self.free.lock().push(handle.index);
            }
        }
        if names.get(data.name()) == Some(&handle) {
            names.remove(data.name());
        }
    }

    /// Acquire a reference on behalf of an announcement and return a
    /// single-use token for it.
    pub fn mint_transfer(&self, handle: ShmHandle) -> Result<u64, SegmentError> {
        self.ref_handle(handle)?;
        let token = self.next_transfer.fetch_add(1, Ordering::Relaxed);
        self.transfers.lock().insert(token, handle);
        Ok(token)
    }

    /// Take over the reference held for `token`. Succeeds once.
    pub fn redeem_transfer(&self, token: u64) -> Result<ShmHandle, SegmentError> {
        self.transfers
            .lock()
            .remove(&token)
            .ok_or(SegmentError::TransferConsumed(token))
    }

    /// Is `token` still outstanding?
    #[must_use]
    pub fn transfer_pending(&self, token: u64) -> bool {
        self.transfers.lock().contains_key(&token)
    }

    #[must_use]
    pub fn pending_transfers(&self) -> usize {
        self.transfers.lock().len()
    }
}

/// Segments of one host, by name.
#[derive(Debug)]
pub struct SegmentRegistry {
    host_limit: usize,
    segments: Mutex<HashMap<String, Arc<Segment>>>,
}

impl Default for SegmentRegistry {
    fn default() -> Self {
        Self::with_host_limit(DEFAULT_HOST_LIMIT)
    }
}

impl SegmentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of a host that can back at most `host_limit` bytes per segment.
    #[must_use]
    pub fn with_host_limit(host_limit: usize) -> Self {
        Self {
            host_limit,
            segments: Mutex::new(HashMap::new()),
        }
    }

    /// Open segment `name`, creating it with `size` bytes if it does not exist.
    pub fn open_or_create(&self, name: &str, size: usize) -> Result<Arc<Segment>, SegmentError> {
        let mut segments = self.segments.lock();
        if let Some(segment) = segments.get(name) {
            return Ok(segment.clone());
        }
        if size > self.host_limit {
            return Err(SegmentError::TooLarge {
                name: name.to_string(),
                requested: size,
                limit: self.host_limit,
            });
        }
        let segment = Arc::new(Segment::new(name, size));
        info!(segment = name, size = size, "Segment created");
        segments.insert(name.to_string(), segment.clone());
        Ok(segment)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Segment>> {
        self.segments.lock().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataPayload;
    use shared_types::{Meta, ObjectType};

    fn record(name: &str) -> ObjectData {
        ObjectData::new(
            ObjectType::Points,
            name.to_string(),
            Meta::default(),
            DataPayload::Empty,
        )
    }

    fn segment() -> Arc<Segment> {
        SegmentRegistry::new().open_or_create("test", 1 << 20).unwrap()
    }

    #[test]
    fn test_same_name_same_segment() {
        let registry = SegmentRegistry::new();
        let a = registry.open_or_create("host", 1 << 20).unwrap();
        let b = registry.open_or_create("host", 1 << 12).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.capacity(), 1 << 20);
    }

    #[test]
    fn test_host_limit() {
        let registry = SegmentRegistry::with_host_limit(1 << 16);
        assert!(matches!(
            registry.open_or_create("big", 1 << 20),
            Err(SegmentError::TooLarge { .. })
        ));
        assert!(registry.open_or_create("big", 1 << 16).is_ok());
    }

    #[test]
    fn test_unref_destroys_at_zero() {
        let seg = segment();
        let registry = ObjectTypeRegistry::new();
        let (handle, data) = seg.allocate(record("Object_1_0_0")).unwrap();
        data.ref_();
        data.ref_();
        assert_eq!(seg.unref(handle, &registry), Ok(1));
        assert_eq!(seg.unref(handle, &registry), Ok(0));
        assert_eq!(seg.resolve(handle).unwrap_err(), SegmentError::StaleHandle(handle));
        assert_eq!(seg.lookup("Object_1_0_0"), None);
        assert_eq!(seg.used(), 0);
    }

    #[test]
    fn test_reused_slot_rejects_old_handle() {
        let seg = segment();
        let registry = ObjectTypeRegistry::new();
        let (old, data) = seg.allocate(record("a")).unwrap();
        data.ref_();
        seg.unref(old, &registry).unwrap();

        let (new, _) = seg.allocate(record("b")).unwrap();
        assert_eq!(new.index, old.index);
        assert_ne!(new.generation, old.generation);
        assert!(seg.resolve(old).is_err());
        assert!(seg.resolve(new).is_ok());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let seg = segment();
        seg.allocate(record("same")).unwrap();
        assert_eq!(
            seg.allocate(record("same")).unwrap_err(),
            SegmentError::NameInUse("same".to_string())
        );
        assert_eq!(seg.live_records(), 1);
    }

    #[test]
    fn test_out_of_space() {
        let seg = SegmentRegistry::new()
            .open_or_create("tiny", RECORD_SIZE + 8)
            .unwrap();
        seg.allocate(record("a")).unwrap();
        assert!(matches!(
            seg.allocate(record("b")),
            Err(SegmentError::OutOfSpace { .. })
        ));
    }

    #[test]
    fn test_transfer_token_single_use() {
        let seg = segment();
        let (handle, data) = seg.allocate(record("t")).unwrap();
        data.ref_();
        let token = seg.mint_transfer(handle).unwrap();
        assert_eq!(data.refcount(), 2);
        assert!(seg.transfer_pending(token));
        assert_eq!(seg.redeem_transfer(token), Ok(handle));
        assert_eq!(
            seg.redeem_transfer(token),
            Err(SegmentError::TransferConsumed(token))
        );
        assert_eq!(data.refcount(), 2);
    }

    #[test]
    fn test_underflow_reported() {
        let seg = segment();
        let registry = ObjectTypeRegistry::new();
        let (handle, data) = seg.allocate(record("u")).unwrap();
        assert_eq!(
            seg.unref(handle, &registry),
            Err(SegmentError::RefcountUnderflow(handle))
        );
        assert_eq!(data.refcount(), 0);
        assert!(seg.resolve(handle).is_ok());

        data.ref_();
        assert_eq!(seg.unref(handle, &registry), Ok(0));
    }
}
