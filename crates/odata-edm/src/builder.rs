//! Incremental construction of an [`EdmModel`]
//!
//! Types are declared first and receive a handle, so properties and base
//! types can refer to types declared later (navigation graphs are usually
//! cyclic). `build` checks base-type chains and freezes the model.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::annotations::AnnotationStore;
use crate::error::{EdmError, EdmResult};
use crate::model::EdmModel;
use crate::types::{
    EdmProperty, EdmPropertyId, EdmPropertyKind, EdmSchemaType, EdmTypeId, EdmTypeKind, EdmTypeRef,
};

/// Builder for [`EdmModel`]
#[derive(Debug)]
pub struct EdmModelBuilder {
    namespace: String,
    types: Vec<EdmSchemaType>,
    properties: Vec<EdmProperty>,
    full_names: FxHashMap<String, EdmTypeId>,
}

impl EdmModelBuilder {
    /// Create a builder whose unqualified declarations land in `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            types: Vec::new(),
            properties: Vec::new(),
            full_names: FxHashMap::default(),
        }
    }

    /// Declare an entity type; `name` may be namespace-qualified
    pub fn entity_type(&mut self, name: &str) -> EdmResult<EdmTypeId> {
        self.declare(name, EdmTypeKind::Entity)
    }

    /// Declare a complex type; `name` may be namespace-qualified
    pub fn complex_type(&mut self, name: &str) -> EdmResult<EdmTypeId> {
        self.declare(name, EdmTypeKind::Complex)
    }

    /// Declare an enum type; `name` may be namespace-qualified
    pub fn enum_type(&mut self, name: &str) -> EdmResult<EdmTypeId> {
        self.declare(name, EdmTypeKind::Enum)
    }

    fn declare(&mut self, name: &str, kind: EdmTypeKind) -> EdmResult<EdmTypeId> {
        let (namespace, local) = match name.rfind('.') {
            Some(index) if index + 1 < name.len() => (&name[..index], &name[index + 1..]),
            _ => (self.namespace.as_str(), name),
        };

        let id = EdmTypeId(self.types.len() as u32);
        let ty = EdmSchemaType {
            id,
            name: local.to_string(),
            namespace: namespace.to_string(),
            kind,
            base_type: None,
            properties: Vec::new(),
            key: Vec::new(),
            is_open: false,
            is_abstract: false,
            has_stream: false,
        };

        let full_name = ty.full_name();
        if self.full_names.contains_key(&full_name) {
            return Err(EdmError::DuplicateType { name: full_name });
        }
        self.full_names.insert(full_name, id);
        self.types.push(ty);
        Ok(id)
    }

    fn type_mut(&mut self, id: EdmTypeId) -> EdmResult<&mut EdmSchemaType> {
        self.types
            .get_mut(id.index())
            .ok_or(EdmError::UnknownType { id })
    }

    /// Make `derived` inherit from `base`
    pub fn set_base_type(&mut self, derived: EdmTypeId, base: EdmTypeId) -> EdmResult<()> {
        let base_ty = self
            .types
            .get(base.index())
            .ok_or(EdmError::UnknownType { id: base })?;
        let (base_kind, base_name) = (base_ty.kind, base_ty.full_name());

        let ty = self.type_mut(derived)?;
        if ty.kind != base_kind || !ty.kind.is_structured() {
            return Err(EdmError::BaseKindMismatch {
                type_name: ty.full_name(),
                base: base_name,
            });
        }
        ty.base_type = Some(base);
        Ok(())
    }

    /// Declare the key property names of an entity type
    pub fn set_key<I, S>(&mut self, id: EdmTypeId, names: I) -> EdmResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_mut(id)?.key = names.into_iter().map(Into::into).collect();
        Ok(())
    }

    /// Mark a type as open
    pub fn set_open(&mut self, id: EdmTypeId, is_open: bool) -> EdmResult<()> {
        self.type_mut(id)?.is_open = is_open;
        Ok(())
    }

    /// Mark a type as abstract
    pub fn set_abstract(&mut self, id: EdmTypeId, is_abstract: bool) -> EdmResult<()> {
        self.type_mut(id)?.is_abstract = is_abstract;
        Ok(())
    }

    /// Mark an entity type as carrying a media stream
    pub fn set_has_stream(&mut self, id: EdmTypeId, has_stream: bool) -> EdmResult<()> {
        self.type_mut(id)?.has_stream = has_stream;
        Ok(())
    }

    /// Add a structural property to a structured type
    pub fn structural_property(
        &mut self,
        owner: EdmTypeId,
        name: &str,
        type_ref: EdmTypeRef,
    ) -> EdmResult<EdmPropertyId> {
        self.add_property(owner, name, type_ref, EdmPropertyKind::Structural)
    }

    /// Add a navigation property to a structured type
    pub fn navigation_property(
        &mut self,
        owner: EdmTypeId,
        name: &str,
        target: EdmTypeRef,
    ) -> EdmResult<EdmPropertyId> {
        self.add_property(
            owner,
            name,
            target,
            EdmPropertyKind::Navigation {
                partner: None,
                contains_target: false,
            },
        )
    }

    /// Link two navigation properties as partners of each other
    pub fn set_partners(&mut self, first: EdmPropertyId, second: EdmPropertyId) -> EdmResult<()> {
        for (this, other) in [(first, second), (second, first)] {
            let prop = self
                .properties
                .get_mut(this.index())
                .ok_or(EdmError::UnknownProperty { id: this })?;
            if let EdmPropertyKind::Navigation { partner, .. } = &mut prop.kind {
                *partner = Some(other);
            }
        }
        Ok(())
    }

    /// Mark a navigation property as containing its targets
    pub fn set_contains_target(&mut self, id: EdmPropertyId, contains: bool) -> EdmResult<()> {
        let prop = self
            .properties
            .get_mut(id.index())
            .ok_or(EdmError::UnknownProperty { id })?;
        if let EdmPropertyKind::Navigation { contains_target, .. } = &mut prop.kind {
            *contains_target = contains;
        }
        Ok(())
    }

    fn add_property(
        &mut self,
        owner: EdmTypeId,
        name: &str,
        type_ref: EdmTypeRef,
        kind: EdmPropertyKind,
    ) -> EdmResult<EdmPropertyId> {
        let id = EdmPropertyId(self.properties.len() as u32);

        let owner_ty = self
            .types
            .get(owner.index())
            .ok_or(EdmError::UnknownType { id: owner })?;
        if !owner_ty.kind.is_structured() {
            return Err(EdmError::NotStructured {
                type_name: owner_ty.full_name(),
            });
        }
        let duplicate = owner_ty
            .properties
            .iter()
            .any(|existing| self.properties[existing.index()].name == name);
        if duplicate {
            return Err(EdmError::DuplicateProperty {
                type_name: owner_ty.full_name(),
                property: name.to_string(),
            });
        }

        self.properties.push(EdmProperty {
            id,
            name: name.to_string(),
            declaring_type: owner,
            type_ref,
            kind,
        });
        self.type_mut(owner)?.properties.push(id);
        Ok(id)
    }

    /// Validate base-type chains and freeze the model
    pub fn build(self) -> EdmResult<EdmModel> {
        for ty in &self.types {
            let mut visited = FxHashSet::default();
            let mut current = Some(ty.id);
            while let Some(id) = current {
                if !visited.insert(id) {
                    return Err(EdmError::BaseTypeCycle {
                        type_name: ty.full_name(),
                    });
                }
                current = self
                    .types
                    .get(id.index())
                    .ok_or(EdmError::UnknownType { id })?
                    .base_type;
            }
        }

        let mut local_names: FxHashMap<String, Vec<EdmTypeId>> = FxHashMap::default();
        for ty in &self.types {
            local_names.entry(ty.name.clone()).or_default().push(ty.id);
        }

        Ok(EdmModel {
            types: self.types,
            properties: self.properties,
            full_names: self.full_names,
            local_names,
            annotations: AnnotationStore::new(),
        })
    }
}
