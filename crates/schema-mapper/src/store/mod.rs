//! Two-phase model storage.
//!
//! [`EntityStore`] is the mutable build phase: classes are registered,
//! properties and methods attached, inheritance declared. [`EntityStore::freeze`]
//! validates the model and produces a [`SchemaStore`], which is immutable,
//! `Send + Sync`, and the only thing documents are generated from.

mod entity;
mod freeze;
mod frozen;

pub use entity::{ClassEntity, HttpVerb, JsonParameter, MethodEntity, ParamLocation, Route};
pub use frozen::SchemaStore;

use crate::error::{Error, Result};
use crate::options::SpecType;
use crate::registry::{Mapper, MapperRegistry};
use crate::schema::ClassId;

/// Mutable class registry used while the model is being declared.
#[derive(Debug, Default)]
pub struct EntityStore {
    classes: Vec<ClassEntity>,
    registry: MapperRegistry,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class and return its id.
    ///
    /// Ids are handed out before the class body is complete, so classes can
    /// reference each other (and themselves) in any order. Duplicate names
    /// are reported by [`EntityStore::freeze`].
    pub fn class(&mut self, name: impl Into<String>) -> ClassId {
        let id = ClassId(self.classes.len());
        self.classes.push(ClassEntity::new(name.into()));
        id
    }

    pub fn class_mut(&mut self, id: ClassId) -> Result<&mut ClassEntity> {
        self.classes
            .get_mut(id.index())
            .ok_or_else(|| unknown_class(id))
    }

    pub fn get_class(&self, id: ClassId) -> Result<&ClassEntity> {
        self.classes.get(id.index()).ok_or_else(|| unknown_class(id))
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|class| class.name() == name)
            .map(ClassId)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Register or replace a mapper, optionally scoped to one spec type.
    pub fn register_mapper(
        &mut self,
        name: impl Into<String>,
        mapper: Mapper,
        spec_type: Option<SpecType>,
    ) -> &mut Self {
        self.registry.register(name, mapper, spec_type);
        self
    }

    /// Finish the build phase.
    ///
    /// Flattens inheritance, builds discriminator families, and rejects
    /// unknown class ids, duplicate names, inheritance cycles, invalid
    /// generic bindings, and discriminator values without a key.
    pub fn freeze(self) -> Result<SchemaStore> {
        let classes = freeze::freeze(self.classes)?;
        tracing::debug!(classes = classes.len(), "entity store frozen");
        Ok(SchemaStore::new(classes, self.registry))
    }
}

pub(crate) fn unknown_class(id: ClassId) -> Error {
    Error::UnknownClass(format!("#{}", id.index()))
}
