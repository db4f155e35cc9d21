//! # df-02-shm
//!
//! Shared object store of one host.
//!
//! ## Overview
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Segment`] | arena of refcounted [`ObjectData`] records addressed by handle |
//! | [`SegmentRegistry`] | segments of a host by name, shared by all its processes |
//! | [`Shm`] | one process's attachment: naming, handle/object conversion, notifications |
//! | [`Object`] | process-local wrapper owning one reference |
//! | [`ObjectTypeRegistry`] | type tag to factory table, rebuilds typed views |
//!
//! ## Object lifetime
//!
//! ```text
//! construct ──▶ refs 1 ── clone / attach / announce ──▶ refs n
//!                  ▲                                       │
//!                  └──────── drop / detach / take ◀────────┘
//!                               refs 0: Segment::unref destroys the
//!                               record and releases its attachments
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use df_02_shm::{ObjectTypeRegistry, SegmentRegistry, Shm, ShmConfig};
//!
//! let shm = Shm::attach(&ShmConfig::from_env(), &segments, registry, id, rank, None)?;
//! let points = Points::new(&shm, Meta::default(), xs, ys, zs)?;
//! let other = shm.object_from_name(points.object().name());
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod data;
pub mod error;
pub mod kinds;
pub mod object;
pub mod registry;
pub mod segment;
pub mod shm;

pub use config::ShmConfig;
pub use data::{CompletionCallback, DataPayload, DataSnapshot, ObjectData, ScalarArray};
pub use error::{ObjectError, ObjectResult, SegmentError};
pub use kinds::{Normals, Placeholder, Points, Scalar, Texture1D, VecObject};
pub use object::Object;
pub use registry::{DataObject, FunctionTable, ObjectKind, ObjectTypeRegistry};
pub use segment::{Segment, SegmentRegistry};
pub use shm::Shm;
