//! Point-like geometry: coordinates in three separate component arrays.

use crate::data::DataPayload;
use crate::error::ObjectResult;
use crate::object::Object;
use crate::registry::ObjectKind;
use crate::shm::Shm;
use shared_types::{Meta, ObjectType};
use std::sync::Arc;

fn empty_coords() -> DataPayload {
    DataPayload::Coords {
        x: Vec::new(),
        y: Vec::new(),
        z: Vec::new(),
    }
}

fn coords_consistent(obj: &Object) -> bool {
    obj.data().with_payload(|payload| match payload {
        DataPayload::Coords { x, y, z } => x.len() == y.len() && y.len() == z.len(),
        _ => false,
    })
}

fn coord_count(obj: &Object) -> usize {
    obj.data().with_payload(|payload| match payload {
        DataPayload::Coords { x, .. } => x.len(),
        _ => 0,
    })
}

fn store_coords(obj: &Object, xs: Vec<f32>, ys: Vec<f32>, zs: Vec<f32>) {
    obj.data().with_payload_mut(|payload| {
        *payload = DataPayload::Coords { x: xs, y: ys, z: zs };
    });
}

fn coord(obj: &Object, index: usize) -> Option<[f32; 3]> {
    obj.data().with_payload(|payload| match payload {
        DataPayload::Coords { x, y, z } => Some([*x.get(index)?, *y.get(index)?, *z.get(index)?]),
        _ => None,
    })
}

/// A set of points.
#[derive(Debug, Clone)]
pub struct Points {
    obj: Object,
}

impl Points {
    pub fn new(shm: &Arc<Shm>, meta: Meta, x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) -> ObjectResult<Self> {
        let obj = shm.construct(ObjectType::Points, meta, DataPayload::Coords { x, y, z })?;
        Ok(Self { obj })
    }

    #[must_use]
    pub fn num_points(&self) -> usize {
        coord_count(&self.obj)
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Option<[f32; 3]> {
        coord(&self.obj, index)
    }

    pub fn set_coords(&self, x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) {
        store_coords(&self.obj, x, y, z);
    }

    fn check_payload(&self) -> bool {
        coords_consistent(&self.obj)
    }
}

impl ObjectKind for Points {
    fn kind() -> ObjectType {
        ObjectType::Points
    }

    fn create_empty(shm: &Arc<Shm>, meta: Meta) -> ObjectResult<Self> {
        let obj = shm.construct(Self::kind(), meta, empty_coords())?;
        Ok(Self { obj })
    }

    fn from_object(obj: Object) -> Self {
        Self { obj }
    }
}

data_object!(Points);

/// Per-vertex normals, usually attached to a grid.
#[derive(Debug, Clone)]
pub struct Normals {
    obj: Object,
}

impl Normals {
    #[must_use]
    pub fn len(&self) -> usize {
        coord_count(&self.obj)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn normal(&self, index: usize) -> Option<[f32; 3]> {
        coord(&self.obj, index)
    }

    pub fn set_normals(&self, x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) {
        store_coords(&self.obj, x, y, z);
    }

    fn check_payload(&self) -> bool {
        coords_consistent(&self.obj)
    }
}

impl ObjectKind for Normals {
    fn kind() -> ObjectType {
        ObjectType::Normals
    }

    fn create_empty(shm: &Arc<Shm>, meta: Meta) -> ObjectResult<Self> {
        let obj = shm.construct(Self::kind(), meta, empty_coords())?;
        Ok(Self { obj })
    }

    fn from_object(obj: Object) -> Self {
        Self { obj }
    }
}

data_object!(Normals);
