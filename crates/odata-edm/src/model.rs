//! Read-only schema model
//!
//! Holds every type and property of a service schema in two arenas and
//! answers the structural queries the client metadata layer needs: base
//! type chains, inherited property lists, and name lookup.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::annotations::AnnotationStore;
use crate::error::{EdmError, EdmResult};
use crate::types::{EdmProperty, EdmPropertyId, EdmSchemaType, EdmTypeId, EdmTypeKind};

/// A complete schema graph
#[derive(Debug)]
pub struct EdmModel {
    pub(crate) types: Vec<EdmSchemaType>,
    pub(crate) properties: Vec<EdmProperty>,
    /// Qualified name to type
    pub(crate) full_names: FxHashMap<String, EdmTypeId>,
    /// Local name to every type carrying it
    pub(crate) local_names: FxHashMap<String, Vec<EdmTypeId>>,
    pub(crate) annotations: AnnotationStore,
}

impl EdmModel {
    /// Look up a type by handle
    pub fn schema_type(&self, id: EdmTypeId) -> EdmResult<&EdmSchemaType> {
        self.types
            .get(id.index())
            .ok_or(EdmError::UnknownType { id })
    }

    /// Look up a property by handle
    pub fn property(&self, id: EdmPropertyId) -> EdmResult<&EdmProperty> {
        self.properties
            .get(id.index())
            .ok_or(EdmError::UnknownProperty { id })
    }

    /// Find a type by qualified name, falling back to an unambiguous local name
    pub fn find_type(&self, name: &str) -> Option<EdmTypeId> {
        if let Some(id) = self.full_names.get(name) {
            return Some(*id);
        }
        match self.local_names.get(name).map(Vec::as_slice) {
            Some([only]) => Some(*only),
            _ => None,
        }
    }

    /// All types in declaration order
    pub fn types(&self) -> impl Iterator<Item = &EdmSchemaType> {
        self.types.iter()
    }

    /// Number of declared types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Qualified name of a type
    pub fn full_name(&self, id: EdmTypeId) -> EdmResult<String> {
        Ok(self.schema_type(id)?.full_name())
    }

    /// Whether the type is an entity type
    pub fn is_entity(&self, id: EdmTypeId) -> bool {
        self.kind_of(id) == Some(EdmTypeKind::Entity)
    }

    /// Whether the type is a complex type
    pub fn is_complex(&self, id: EdmTypeId) -> bool {
        self.kind_of(id) == Some(EdmTypeKind::Complex)
    }

    fn kind_of(&self, id: EdmTypeId) -> Option<EdmTypeKind> {
        self.types.get(id.index()).map(|ty| ty.kind)
    }

    /// Properties declared directly on a type, in declaration order
    pub fn declared_properties(
        &self,
        id: EdmTypeId,
    ) -> EdmResult<impl Iterator<Item = &EdmProperty> + '_> {
        let ty = self.schema_type(id)?;
        Ok(ty
            .properties
            .iter()
            .filter_map(move |prop| self.properties.get(prop.index())))
    }

    /// The type followed by its ancestors, most-derived first
    ///
    /// The builder rejects cyclic chains, so this always terminates.
    pub fn base_chain(&self, id: EdmTypeId) -> EdmResult<Vec<EdmTypeId>> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(ty_id) = current {
            let ty = self.schema_type(ty_id)?;
            chain.push(ty_id);
            current = ty.base_type;
        }
        Ok(chain)
    }

    /// Every property visible on a type, most-derived level first
    ///
    /// A property redeclared on a derived type hides the base declaration of
    /// the same name; the hidden one is not reported.
    pub fn properties_most_derived_first(&self, id: EdmTypeId) -> EdmResult<Vec<EdmPropertyId>> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut result = Vec::new();

        for level in self.base_chain(id)? {
            for prop in self.declared_properties(level)? {
                if seen.insert(prop.name.as_str()) {
                    result.push(prop.id);
                }
            }
        }

        Ok(result)
    }

    /// Find a visible property by name, searching the base chain
    pub fn find_property(&self, id: EdmTypeId, name: &str) -> EdmResult<Option<&EdmProperty>> {
        for level in self.base_chain(id)? {
            if let Some(prop) = self.declared_properties(level)?.find(|p| p.name == name) {
                return Ok(Some(prop));
            }
        }
        Ok(None)
    }

    /// Whether `derived` is `base` or inherits from it
    pub fn is_assignable(&self, base: EdmTypeId, derived: EdmTypeId) -> bool {
        self.base_chain(derived)
            .map(|chain| chain.contains(&base))
            .unwrap_or(false)
    }

    /// Annotation table of this model
    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }
}
