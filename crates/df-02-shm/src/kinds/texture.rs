//! One-dimensional texture: a color map sampled through per-vertex coordinates.

use crate::data::DataPayload;
use crate::error::ObjectResult;
use crate::object::Object;
use crate::registry::ObjectKind;
use crate::shm::Shm;
use shared_types::{Meta, ObjectType};
use std::sync::Arc;

/// Bytes per texel.
pub const TEXEL_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct Texture1D {
    obj: Object,
}

impl Texture1D {
    /// Texture over `[min, max]` with RGBA `pixels`.
    pub fn new(shm: &Arc<Shm>, meta: Meta, min: f64, max: f64, pixels: Vec<u8>) -> ObjectResult<Self> {
        let obj = shm.construct(
            ObjectType::Texture1D,
            meta,
            DataPayload::Texture1D {
                min,
                max,
                pixels,
                coords: Vec::new(),
            },
        )?;
        Ok(Self { obj })
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.obj.data().with_payload(|payload| match payload {
            DataPayload::Texture1D { min, max, .. } => (*min, *max),
            _ => (0.0, 0.0),
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.obj.data().with_payload(|payload| match payload {
            DataPayload::Texture1D { pixels, .. } => pixels.len() / TEXEL_SIZE,
            _ => 0,
        })
    }

    /// Map scalar values into texture coordinates in `[0, 1]`.
    pub fn set_coords_from_values(&self, values: &[f32]) {
        self.obj.data().with_payload_mut(|payload| {
            if let DataPayload::Texture1D { min, max, coords, .. } = payload {
                let span = (*max - *min).max(f64::EPSILON);
                *coords = values
                    .iter()
                    .map(|v| ((f64::from(*v) - *min) / span).clamp(0.0, 1.0) as f32)
                    .collect();
            }
        });
    }

    #[must_use]
    pub fn coords(&self) -> Vec<f32> {
        self.obj.data().with_payload(|payload| match payload {
            DataPayload::Texture1D { coords, .. } => coords.clone(),
            _ => Vec::new(),
        })
    }

    fn check_payload(&self) -> bool {
        self.obj.data().with_payload(|payload| match payload {
            DataPayload::Texture1D { min, max, pixels, .. } => {
                min <= max && pixels.len() % TEXEL_SIZE == 0
            }
            _ => false,
        })
    }
}

impl ObjectKind for Texture1D {
    fn kind() -> ObjectType {
        ObjectType::Texture1D
    }

    fn create_empty(shm: &Arc<Shm>, meta: Meta) -> ObjectResult<Self> {
        Self::new(shm, meta, 0.0, 1.0, Vec::new())
    }

    fn from_object(obj: Object) -> Self {
        Self { obj }
    }
}

data_object!(Texture1D);
