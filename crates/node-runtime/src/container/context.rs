//! # Process Context
//!
//! Everything one process owns: its router, the replicated session state,
//! parked messages, active barriers, outstanding announcements and the
//! attachment to the host's shared segment.
//!
//! The segment is attached on first use. Creation walks the halving ladder
//! of the segment configuration; failing at the floor is fatal for startup.

use crate::container::RuntimeConfig;
use crate::error::RuntimeResult;
use df_01_routing::{init_routing_table, BarrierTracker, PendingQueue, Router, StateTracker};
use df_02_shm::{ObjectTypeRegistry, SegmentError, SegmentRegistry, Shm};
use df_03_object_transfer::Retention;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use shared_bus::{MessageQueue, QueueReceiver, QueueSender};
use shared_types::Message;
use std::sync::Arc;
use tracing::{error, info};

pub struct ProcessContext {
    config: RuntimeConfig,
    router: Router,
    types: Arc<ObjectTypeRegistry>,
    segments: Arc<SegmentRegistry>,
    shm: Mutex<Option<Arc<Shm>>>,
    notify: QueueSender,
    tracker: RwLock<StateTracker>,
    pending: Mutex<PendingQueue>,
    barriers: BarrierTracker,
    retention: Retention,
}

impl ProcessContext {
    /// Build the context of one process on the host owning `segments`.
    ///
    /// Returns the receiving end of the new-object notification queue.
    pub fn new(
        config: RuntimeConfig,
        segments: Arc<SegmentRegistry>,
    ) -> RuntimeResult<(Arc<Self>, QueueReceiver)> {
        config.validate()?;
        let table = init_routing_table()?;
        let router = Router::with_table(config.identity, config.id, config.rank, table);
        let (notify, notifications) = MessageQueue::bounded(
            &format!("{}-{}-objects", config.id, config.rank),
            config.queue_depth,
        );
        info!(
            identity = %config.identity,
            id = config.id,
            rank = config.rank,
            host = %config.host,
            "Process context created"
        );
        let ctx = Self {
            router,
            types: Arc::new(ObjectTypeRegistry::with_builtin_types()),
            segments,
            shm: Mutex::new(None),
            notify,
            tracker: RwLock::new(StateTracker::new()),
            pending: Mutex::new(PendingQueue::default()),
            barriers: BarrierTracker::new(),
            retention: Retention::new(),
            config,
        };
        Ok((Arc::new(ctx), notifications))
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn types(&self) -> &Arc<ObjectTypeRegistry> {
        &self.types
    }

    /// The shared segment of this host, attached on first call.
    pub fn shm(&self) -> Result<Arc<Shm>, SegmentError> {
        let mut slot = self.shm.lock();
        if let Some(shm) = slot.as_ref() {
            return Ok(shm.clone());
        }
        let shm = Shm::attach(
            &self.config.shm_config(),
            &self.segments,
            self.types.clone(),
            self.config.id,
            self.config.rank,
            Some(self.notify.clone()),
        )
        .map_err(|e| {
            error!(id = self.config.id, error = %e, "Attaching shared segment failed");
            e
        })?;
        *slot = Some(shm.clone());
        Ok(shm)
    }

    pub fn tracker(&self) -> RwLockReadGuard<'_, StateTracker> {
        self.tracker.read()
    }

    pub fn tracker_mut(&self) -> RwLockWriteGuard<'_, StateTracker> {
        self.tracker.write()
    }

    pub fn pending(&self) -> MutexGuard<'_, PendingQueue> {
        self.pending.lock()
    }

    #[must_use]
    pub fn barriers(&self) -> &BarrierTracker {
        &self.barriers
    }

    #[must_use]
    pub fn retention(&self) -> &Retention {
        &self.retention
    }

    /// Fill in this process as sender.
    pub fn stamp(&self, msg: &mut Message) {
        msg.set_sender_id(self.config.id);
        msg.set_rank(self.config.rank);
    }

    /// Release announcements nobody confirmed.
    pub fn shutdown(&self) {
        let attached = self.shm.lock().clone();
        if let Some(shm) = attached {
            let released = self.retention.release_all(&shm);
            info!(id = self.config.id, released = released, "Process context shut down");
        }
    }
}
