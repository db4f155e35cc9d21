//! Object type registry
//!
//! Records carry only an [`ObjectType`] tag. Each process registers one
//! [`FunctionTable`] per concrete kind at startup; typed wrappers are then
//! rebuilt from any record by looking up its tag.

use crate::error::{ObjectError, ObjectResult};
use crate::object::Object;
use crate::shm::Shm;
use crate::data::ObjectData;
use parking_lot::RwLock;
use shared_types::{Meta, ObjectType};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// A typed view of an object.
pub trait DataObject: Send + Sync + fmt::Debug {
    fn object(&self) -> &Object;

    fn as_any(&self) -> &dyn Any;

    fn object_type(&self) -> ObjectType {
        self.object().object_type()
    }

    /// Is the payload consistent with the type?
    fn check(&self) -> bool {
        true
    }
}

/// A concrete object kind that can be registered.
pub trait ObjectKind: DataObject + Sized + 'static {
    /// Tag stored in every record of this kind.
    fn kind() -> ObjectType;

    /// New empty object in `shm`.
    fn create_empty(shm: &Arc<Shm>, meta: Meta) -> ObjectResult<Self>;

    /// Typed view of `obj`, whose tag is already checked.
    fn from_object(obj: Object) -> Self;

    /// Last chance to release kind-specific resources of a record.
    fn destroy(_data: &ObjectData) {}
}

pub type CreateEmptyFn = fn(&Arc<Shm>, Meta) -> ObjectResult<Box<dyn DataObject>>;
pub type CreateFn = fn(Object) -> Box<dyn DataObject>;
pub type DestroyFn = fn(&ObjectData);

/// Factories of one kind.
#[derive(Clone, Copy)]
pub struct FunctionTable {
    pub create_empty: CreateEmptyFn,
    pub create: CreateFn,
    pub destroy: DestroyFn,
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FunctionTable")
    }
}

fn create_empty_boxed<T: ObjectKind>(shm: &Arc<Shm>, meta: Meta) -> ObjectResult<Box<dyn DataObject>> {
    Ok(Box::new(T::create_empty(shm, meta)?))
}

fn create_boxed<T: ObjectKind>(obj: Object) -> Box<dyn DataObject> {
    Box::new(T::from_object(obj))
}

impl FunctionTable {
    #[must_use]
    pub fn of<T: ObjectKind>() -> Self {
        Self {
            create_empty: create_empty_boxed::<T>,
            create: create_boxed::<T>,
            destroy: T::destroy,
        }
    }
}

/// Tag to factory map of one process.
#[derive(Debug, Default)]
pub struct ObjectTypeRegistry {
    tables: RwLock<HashMap<i32, FunctionTable>>,
}

impl ObjectTypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind.
    #[must_use]
    pub fn with_builtin_types() -> Self {
        let registry = Self::new();
        crate::kinds::register_builtin(&registry);
        registry
    }

    /// Register kind `T`. Each kind may be registered once.
    pub fn register_type<T: ObjectKind>(&self) -> ObjectResult<()> {
        let kind = T::kind();
        let mut tables = self.tables.write();
        if tables.contains_key(&kind.tag()) {
            error!(object_type = %kind, "Object type registered twice");
            return Err(ObjectError::DuplicateType(kind));
        }
        tables.insert(kind.tag(), FunctionTable::of::<T>());
        debug!(object_type = %kind, tag = kind.tag(), "Object type registered");
        Ok(())
    }

    #[must_use]
    pub fn is_registered(&self, kind: ObjectType) -> bool {
        self.tables.read().contains_key(&kind.tag())
    }

    fn table(&self, tag: i32) -> ObjectResult<FunctionTable> {
        self.tables.read().get(&tag).copied().ok_or_else(|| {
            error!(tag = tag, "No object type registered");
            ObjectError::UnregisteredType(tag)
        })
    }

    /// Typed view of `obj` chosen by its stored tag.
    pub fn create_from_data(&self, obj: Object) -> ObjectResult<Box<dyn DataObject>> {
        let table = self.table(obj.object_type().tag())?;
        Ok((table.create)(obj))
    }

    /// New empty object of `kind`.
    pub fn create_empty(
        &self,
        kind: ObjectType,
        shm: &Arc<Shm>,
        meta: Meta,
    ) -> ObjectResult<Box<dyn DataObject>> {
        let table = self.table(kind.tag())?;
        (table.create_empty)(shm, meta)
    }

    /// Kind-specific teardown of a record about to be freed.
    pub fn destroy(&self, data: &ObjectData) {
        match self.table(data.object_type().tag()) {
            Ok(table) => (table.destroy)(data),
            Err(_) => error!(object = data.name(), "Destroying record of unregistered type"),
        }
    }
}
