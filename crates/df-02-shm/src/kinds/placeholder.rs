//! Stand-in for an object that is known by name but not transferred.

use crate::data::DataPayload;
use crate::error::ObjectResult;
use crate::object::Object;
use crate::registry::ObjectKind;
use crate::shm::Shm;
use shared_types::{Meta, ObjectType};
use std::sync::Arc;

const ORIGINAL_NAME: &str = "_placeholder_name";
const ORIGINAL_TYPE: &str = "_placeholder_type";

#[derive(Debug, Clone)]
pub struct Placeholder {
    obj: Object,
}

impl Placeholder {
    /// Placeholder for `original`, carrying its name, type and metadata.
    pub fn of(shm: &Arc<Shm>, original: &Object) -> ObjectResult<Self> {
        let placeholder = Self::create_empty(shm, original.meta())?;
        placeholder.obj.add_attribute(ORIGINAL_NAME, original.name());
        placeholder
            .obj
            .add_attribute(ORIGINAL_TYPE, &original.object_type().tag().to_string());
        Ok(placeholder)
    }

    #[must_use]
    pub fn original_name(&self) -> Option<String> {
        self.obj.get_attribute(ORIGINAL_NAME)
    }

    #[must_use]
    pub fn original_type(&self) -> Option<ObjectType> {
        self.obj
            .get_attribute(ORIGINAL_TYPE)?
            .parse::<i32>()
            .ok()
            .and_then(ObjectType::from_tag)
    }

    fn check_payload(&self) -> bool {
        self.obj
            .data()
            .with_payload(|payload| matches!(payload, DataPayload::Empty))
    }
}

impl ObjectKind for Placeholder {
    fn kind() -> ObjectType {
        ObjectType::Placeholder
    }

    fn create_empty(shm: &Arc<Shm>, meta: Meta) -> ObjectResult<Self> {
        let obj = shm.construct(Self::kind(), meta, DataPayload::Empty)?;
        Ok(Self { obj })
    }

    fn from_object(obj: Object) -> Self {
        Self { obj }
    }
}

data_object!(Placeholder);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShmConfig;
    use crate::registry::{DataObject, ObjectTypeRegistry};
    use crate::segment::SegmentRegistry;

    #[test]
    fn test_placeholder_remembers_original() {
        let shm = Shm::attach(
            &ShmConfig::named("placeholder").with_initial_size(1 << 20),
            &SegmentRegistry::new(),
            Arc::new(ObjectTypeRegistry::with_builtin_types()),
            4,
            0,
            None,
        )
        .unwrap();
        let original = shm
            .construct(
                ObjectType::Points,
                Meta::default().with_num_timesteps(3),
                DataPayload::Empty,
            )
            .unwrap();
        let placeholder = Placeholder::of(&shm, &original).unwrap();
        assert_eq!(placeholder.original_name().as_deref(), Some(original.name()));
        assert_eq!(placeholder.original_type(), Some(ObjectType::Points));
        assert_eq!(placeholder.object().meta().num_timesteps, 3);
        assert!(placeholder.check());
    }
}
