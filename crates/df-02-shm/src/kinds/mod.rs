//! Built-in object kinds
//!
//! Each kind is a thin typed view over an [`Object`]. The payload lives in
//! the shared record; the view only checks that the record has the
//! expected tag and payload shape.

use crate::error::{ObjectError, ObjectResult};
use crate::object::Object;
use crate::registry::{ObjectKind, ObjectTypeRegistry};
use tracing::error;

/// Implements [`DataObject`](crate::DataObject), checked conversion from
/// [`Object`] and unwrapping back into it for a kind with an `obj` field.
macro_rules! data_object {
    ($ty:ty) => {
        impl $crate::registry::DataObject for $ty {
            fn object(&self) -> &$crate::object::Object {
                &self.obj
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn check(&self) -> bool {
                self.check_payload()
            }
        }

        impl TryFrom<$crate::object::Object> for $ty {
            type Error = $crate::error::ObjectError;

            fn try_from(obj: $crate::object::Object) -> Result<Self, Self::Error> {
                $crate::kinds::expect_kind::<$ty>(&obj)?;
                Ok(<$ty as $crate::registry::ObjectKind>::from_object(obj))
            }
        }

        impl From<$ty> for $crate::object::Object {
            fn from(view: $ty) -> Self {
                view.obj
            }
        }
    };
}

mod geometry;
mod placeholder;
mod texture;
mod vec;

pub use geometry::{Normals, Points};
pub use placeholder::Placeholder;
pub use texture::Texture1D;
pub use vec::{Scalar, VecObject};

pub(crate) fn expect_kind<T: ObjectKind>(obj: &Object) -> ObjectResult<()> {
    let expected = T::kind();
    let found = obj.object_type();
    if found != expected {
        return Err(ObjectError::WrongType { expected, found });
    }
    Ok(())
}

/// Register every built-in kind. Failures are logged.
pub fn register_builtin(registry: &ObjectTypeRegistry) {
    let results = [
        registry.register_type::<Placeholder>(),
        registry.register_type::<Points>(),
        registry.register_type::<Normals>(),
        registry.register_type::<Texture1D>(),
        registry.register_type::<VecObject<f32, 1>>(),
        registry.register_type::<VecObject<f32, 3>>(),
        registry.register_type::<VecObject<i32, 1>>(),
        registry.register_type::<VecObject<u8, 1>>(),
        registry.register_type::<VecObject<u64, 1>>(),
    ];
    for result in results {
        if let Err(e) = result {
            error!(error = %e, "Registering built-in object type failed");
        }
    }
}
