//! # Object Type Tags
//!
//! Data objects store a plain integer tag instead of any language-level type
//! information, so a process that did not create an object can still rebuild
//! the right typed wrapper. The tag values are part of the shared segment
//! layout and must not change.
//!
//! | Tag | Kind |
//! |-----|------|
//! | -1 | unknown |
//! | 11 | placeholder |
//! | 16 | 1D texture |
//! | 18..=27 | geometry |
//! | 95..=99 | auxiliary structures, normals |
//! | 100.. | arrays, `100 + 4 * scalar + (dim - 1)` |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Maximum number of components of an array object.
pub const MAX_VEC_DIM: u8 = 4;

const VEC_BASE: i32 = 100;

/// Element type of an array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Byte,
    Int,
    Index,
    Scalar,
}

impl ScalarKind {
    const ALL: [ScalarKind; 4] = [Self::Byte, Self::Int, Self::Index, Self::Scalar];

    fn ordinal(self) -> i32 {
        match self {
            Self::Byte => 0,
            Self::Int => 1,
            Self::Index => 2,
            Self::Scalar => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Int => "int",
            Self::Index => "index",
            Self::Scalar => "scalar",
        }
    }
}

/// Closed set of data object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Unknown,
    Placeholder,
    Texture1D,
    Points,
    Spheres,
    Lines,
    Tubes,
    Triangles,
    Polygons,
    UnstructuredGrid,
    UniformGrid,
    RectilinearGrid,
    StructuredGrid,
    VertexOwnerList,
    Celltree1,
    Celltree2,
    Celltree3,
    Normals,
    Vec { scalar: ScalarKind, dim: u8 },
}

impl ObjectType {
    /// Integer tag stored in the shared segment.
    #[must_use]
    pub fn tag(self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::Placeholder => 11,
            Self::Texture1D => 16,
            Self::Points => 18,
            Self::Spheres => 19,
            Self::Lines => 20,
            Self::Tubes => 21,
            Self::Triangles => 22,
            Self::Polygons => 23,
            Self::UnstructuredGrid => 24,
            Self::UniformGrid => 25,
            Self::RectilinearGrid => 26,
            Self::StructuredGrid => 27,
            Self::VertexOwnerList => 95,
            Self::Celltree1 => 96,
            Self::Celltree2 => 97,
            Self::Celltree3 => 98,
            Self::Normals => 99,
            Self::Vec { scalar, dim } => {
                VEC_BASE + scalar.ordinal() * i32::from(MAX_VEC_DIM) + i32::from(dim) - 1
            }
        }
    }

    /// Inverse of [`ObjectType::tag`]. Unassigned tags yield `None`.
    #[must_use]
    pub fn from_tag(tag: i32) -> Option<Self> {
        let ty = match tag {
            -1 => Self::Unknown,
            11 => Self::Placeholder,
            16 => Self::Texture1D,
            18 => Self::Points,
            19 => Self::Spheres,
            20 => Self::Lines,
            21 => Self::Tubes,
            22 => Self::Triangles,
            23 => Self::Polygons,
            24 => Self::UnstructuredGrid,
            25 => Self::UniformGrid,
            26 => Self::RectilinearGrid,
            27 => Self::StructuredGrid,
            95 => Self::VertexOwnerList,
            96 => Self::Celltree1,
            97 => Self::Celltree2,
            98 => Self::Celltree3,
            99 => Self::Normals,
            t if t >= VEC_BASE => {
                let offset = t - VEC_BASE;
                let per_scalar = i32::from(MAX_VEC_DIM);
                let scalar = *ScalarKind::ALL.get(usize::try_from(offset / per_scalar).ok()?)?;
                let dim = u8::try_from(offset % per_scalar + 1).ok()?;
                Self::Vec { scalar, dim }
            }
            _ => return None,
        };
        Some(ty)
    }

    /// Shorthand for an array type.
    #[must_use]
    pub fn vec(scalar: ScalarKind, dim: u8) -> Self {
        Self::Vec { scalar, dim }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vec { scalar, dim } => write!(f, "VEC{}<{}>", dim, scalar.as_str()),
            other => write!(f, "{}", format!("{other:?}").to_uppercase()),
        }
    }
}

impl Serialize for ObjectType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.tag())
    }
}

impl<'de> Deserialize<'de> for ObjectType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = i32::deserialize(deserializer)?;
        ObjectType::from_tag(tag)
            .ok_or_else(|| serde::de::Error::custom(format!("unassigned object type tag {tag}")))
    }
}
