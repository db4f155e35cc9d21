//! Arrays of `DIM` components of one scalar type.

use crate::data::{DataPayload, ScalarArray};
use crate::error::{ObjectError, ObjectResult};
use crate::kinds::expect_kind;
use crate::object::Object;
use crate::registry::{DataObject, ObjectKind};
use crate::shm::Shm;
use shared_types::{Meta, ObjectType, ScalarKind};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Element type of an array object.
pub trait Scalar: Copy + Send + Sync + fmt::Debug + 'static {
    const KIND: ScalarKind;

    fn wrap(values: Vec<Self>) -> ScalarArray;

    fn values(array: &ScalarArray) -> Option<&[Self]>;
}

macro_rules! scalar {
    ($ty:ty, $kind:ident) => {
        impl Scalar for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;

            fn wrap(values: Vec<Self>) -> ScalarArray {
                ScalarArray::$kind(values)
            }

            fn values(array: &ScalarArray) -> Option<&[Self]> {
                match array {
                    ScalarArray::$kind(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

scalar!(u8, Byte);
scalar!(i32, Int);
scalar!(u64, Index);
scalar!(f32, Scalar);

pub struct VecObject<S: Scalar, const DIM: usize> {
    obj: Object,
    _scalar: PhantomData<S>,
}

impl<S: Scalar, const DIM: usize> VecObject<S, DIM> {
    /// Array object with the given components, all of equal length.
    pub fn new(shm: &Arc<Shm>, meta: Meta, components: [Vec<S>; DIM]) -> ObjectResult<Self> {
        if components.windows(2).any(|w| w[0].len() != w[1].len()) {
            return Err(ObjectError::InvalidPayload(format!(
                "components of {} differ in length",
                Self::kind()
            )));
        }
        let payload = DataPayload::Array(components.into_iter().map(S::wrap).collect());
        let obj = shm.construct(Self::kind(), meta, payload)?;
        Ok(Self::from_object(obj))
    }

    /// Number of tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.obj.data().with_payload(|payload| match payload {
            DataPayload::Array(components) => components.first().map_or(0, ScalarArray::len),
            _ => 0,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of component `c`.
    #[must_use]
    pub fn component(&self, c: usize) -> Option<Vec<S>> {
        self.obj.data().with_payload(|payload| match payload {
            DataPayload::Array(components) => components.get(c).and_then(S::values).map(<[S]>::to_vec),
            _ => None,
        })
    }

    /// Replace component `c`. Returns `false` if `c` is out of range.
    pub fn set_component(&self, c: usize, values: Vec<S>) -> bool {
        self.obj.data().with_payload_mut(|payload| match payload {
            DataPayload::Array(components) if c < components.len() => {
                components[c] = S::wrap(values);
                true
            }
            _ => false,
        })
    }

    fn check_payload(&self) -> bool {
        self.obj.data().with_payload(|payload| match payload {
            DataPayload::Array(components) => {
                components.len() == DIM
                    && components.iter().all(|a| a.kind() == S::KIND)
                    && components.windows(2).all(|w| w[0].len() == w[1].len())
            }
            _ => false,
        })
    }
}

impl<S: Scalar, const DIM: usize> ObjectKind for VecObject<S, DIM> {
    fn kind() -> ObjectType {
        ObjectType::vec(S::KIND, DIM as u8)
    }

    fn create_empty(shm: &Arc<Shm>, meta: Meta) -> ObjectResult<Self> {
        let payload = DataPayload::Array((0..DIM).map(|_| ScalarArray::empty(S::KIND)).collect());
        let obj = shm.construct(Self::kind(), meta, payload)?;
        Ok(Self::from_object(obj))
    }

    fn from_object(obj: Object) -> Self {
        Self {
            obj,
            _scalar: PhantomData,
        }
    }
}

impl<S: Scalar, const DIM: usize> DataObject for VecObject<S, DIM> {
    fn object(&self) -> &Object {
        &self.obj
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn check(&self) -> bool {
        self.check_payload()
    }
}

impl<S: Scalar, const DIM: usize> TryFrom<Object> for VecObject<S, DIM> {
    type Error = ObjectError;

    fn try_from(obj: Object) -> Result<Self, Self::Error> {
        expect_kind::<Self>(&obj)?;
        Ok(Self::from_object(obj))
    }
}

impl<S: Scalar, const DIM: usize> From<VecObject<S, DIM>> for Object {
    fn from(view: VecObject<S, DIM>) -> Self {
        view.obj
    }
}

impl<S: Scalar, const DIM: usize> Clone for VecObject<S, DIM> {
    fn clone(&self) -> Self {
        Self::from_object(self.obj.clone())
    }
}

impl<S: Scalar, const DIM: usize> fmt::Debug for VecObject<S, DIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecObject")
            .field("scalar", &S::KIND)
            .field("dim", &DIM)
            .field("obj", &self.obj)
            .finish()
    }
}
