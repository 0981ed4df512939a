//! Per-property metadata
//!
//! A [`ClientPropertyAnnotation`] binds one schema property to the
//! application member that carries it. Classification (dictionary,
//! collection, spatial, ...) and the access operations that go with it are
//! settled once at construction; afterwards the annotation is immutable
//! apart from the mime-type back-reference set by the owning type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use odata_edm::{EdmProperty, EdmPropertyId, EdmPropertyKind};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashSet;
use tracing::trace;

use crate::error::{MetadataError, MetadataResult};
use crate::reflect::{
    ClientMember, ClientType, ClientTypeId, ClientTypeKind, CollectionOps, DictionarySetFn, GetFn,
    MemberRef, SetFn, TypeUniverse,
};
use crate::value::ClientValue;

/// Metadata of one schema property bound to an application member
pub struct ClientPropertyAnnotation {
    schema_property: EdmPropertyId,
    wire_name: String,
    member: MemberRef,
    declared_type: ClientTypeId,
    underlying_type: ClientTypeId,

    is_known_type: bool,
    is_enum: bool,
    is_spatial: bool,
    is_stream_link: bool,
    is_primitive_or_complex_collection: bool,
    dictionary_value_type: Option<ClientTypeId>,
    collection_element_type: Option<ClientTypeId>,

    get: Option<GetFn>,
    set: Option<SetFn>,
    dictionary_set: Option<DictionarySetFn>,
    collection: Option<CollectionOps>,

    mime_type_property: OnceCell<Arc<ClientPropertyAnnotation>>,
}

/// Element type of the collection capability, if the type has exactly one
fn collection_element(ty: &ClientType) -> MetadataResult<Option<ClientTypeId>> {
    let distinct: FxHashSet<ClientTypeId> = ty.collection_of().iter().copied().collect();
    match distinct.len() {
        0 => Ok(None),
        1 => Ok(ty.collection_of().first().copied()),
        _ => Err(MetadataError::MultipleImplementationNotSupported {
            type_name: ty.full_name(),
        }),
    }
}

impl ClientPropertyAnnotation {
    /// Bind `schema_property` to `member`
    pub fn new(
        universe: &TypeUniverse,
        schema_property: &EdmProperty,
        member: MemberRef,
    ) -> MetadataResult<Self> {
        let declared_type = member.member().declared_type();
        let underlying_type = universe.non_nullable(declared_type)?;
        let underlying = universe.get(underlying_type)?;

        // a string-keyed indexer takes precedence over the collection shape
        let dictionary_value_type = underlying.dictionary_of();
        let collection_element_type = match dictionary_value_type {
            Some(_) => None,
            None => collection_element(&underlying)?,
        };

        let is_primitive_or_complex_collection = collection_element_type.is_some()
            && matches!(schema_property.kind, EdmPropertyKind::Structural)
            && schema_property.type_ref.is_collection();

        let hooks = &member.member().hooks;
        let dictionary_set = dictionary_value_type.and(hooks.dictionary_set.clone());
        let collection = collection_element_type.and(hooks.collection.clone());

        trace!(
            property = %schema_property.name,
            member = member.name(),
            dictionary = dictionary_value_type.is_some(),
            collection = collection_element_type.is_some(),
            "built property annotation"
        );

        Ok(Self {
            schema_property: schema_property.id,
            wire_name: schema_property.name.clone(),
            declared_type,
            underlying_type,
            is_known_type: underlying.is_known_primitive() || underlying.is_enum(),
            is_enum: underlying.is_enum(),
            is_spatial: underlying.is_spatial(),
            is_stream_link: underlying.kind() == ClientTypeKind::StreamLink,
            is_primitive_or_complex_collection,
            dictionary_value_type,
            collection_element_type,
            get: hooks.get.clone(),
            set: hooks.set.clone(),
            dictionary_set,
            collection,
            mime_type_property: OnceCell::new(),
            member,
        })
    }

    /// Schema property this annotation describes
    pub fn schema_property(&self) -> EdmPropertyId {
        self.schema_property
    }

    /// Property name as the schema declares it
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Application member name
    pub fn name(&self) -> &str {
        self.member.name()
    }

    /// Application member
    pub fn member(&self) -> &ClientMember {
        self.member.member()
    }

    /// Application type declaring the member
    pub fn declaring_client_type(&self) -> &Arc<ClientType> {
        self.member.declaring_type()
    }

    /// Declared member type, possibly `Option<_>`
    pub fn declared_type(&self) -> ClientTypeId {
        self.declared_type
    }

    /// Declared member type with `Option<_>` stripped
    pub fn underlying_type(&self) -> ClientTypeId {
        self.underlying_type
    }

    /// Whether the value is a known primitive or an enum
    pub fn is_known_type(&self) -> bool {
        self.is_known_type
    }

    /// Whether the value is a collection of entities
    pub fn is_entity_collection(&self) -> bool {
        self.collection_element_type.is_some() && !self.is_primitive_or_complex_collection
    }

    /// Whether the value is a collection of primitives, enums or complex values
    pub fn is_primitive_or_complex_collection(&self) -> bool {
        self.is_primitive_or_complex_collection
    }

    /// Whether the value is a string-keyed dictionary
    pub fn is_dictionary(&self) -> bool {
        self.dictionary_value_type.is_some()
    }

    /// Whether the value is an enum
    pub fn is_enum(&self) -> bool {
        self.is_enum
    }

    /// Whether the value is spatial
    pub fn is_spatial(&self) -> bool {
        self.is_spatial
    }

    /// Whether the value is a stream link
    pub fn is_stream_link(&self) -> bool {
        self.is_stream_link
    }

    /// Whether the member is excluded from serialization
    pub fn is_ignored(&self) -> bool {
        self.member().is_ignored()
    }

    /// Value type of the dictionary
    pub fn dictionary_value_type(&self) -> Option<ClientTypeId> {
        self.dictionary_value_type
    }

    /// Element type of the collection
    pub fn collection_element_type(&self) -> Option<ClientTypeId> {
        self.collection_element_type
    }

    /// Sibling property holding this property's mime type
    pub fn mime_type_property(&self) -> Option<&Arc<ClientPropertyAnnotation>> {
        self.mime_type_property.get()
    }

    /// Pair this data property with its mime-type property
    ///
    /// Repeating the pairing (the same member name, as when a derived type
    /// restates its base's declaration) is a no-op. Pairing it with a
    /// different member fails.
    pub(crate) fn set_mime_type_property(
        &self,
        declaring_type: &str,
        property: Arc<ClientPropertyAnnotation>,
    ) -> MetadataResult<()> {
        let existing = self.mime_type_property.get_or_init(|| property.clone());
        if existing.name() == property.name() {
            return Ok(());
        }
        Err(MetadataError::ConflictingMimeTypeProperty {
            type_name: declaring_type.to_string(),
            property: self.name().to_string(),
            existing: existing.name().to_string(),
            requested: property.name().to_string(),
        })
    }

    fn missing(&self) -> MetadataError {
        MetadataError::missing_property(self.declaring_client_type().full_name(), self.name())
    }

    fn collection_ops(&self) -> MetadataResult<&CollectionOps> {
        self.collection.as_ref().ok_or_else(|| self.missing())
    }

    /// Read the property from `instance`
    pub fn get_value(&self, instance: &dyn Any) -> MetadataResult<ClientValue> {
        match &self.get {
            Some(get) => get(instance),
            None => Err(self.missing()),
        }
    }

    /// Write `value` into `instance`
    ///
    /// Dictionaries receive the value under `wire_name`. With `allow_add`
    /// a collection gains the value unless it already holds it. Anything
    /// else is assigned through the setter.
    pub fn set_value(
        &self,
        instance: &mut dyn Any,
        value: ClientValue,
        wire_name: &str,
        allow_add: bool,
    ) -> MetadataResult<()> {
        if self.is_dictionary() {
            return match &self.dictionary_set {
                Some(dictionary_set) => dictionary_set(instance, wire_name, value),
                None => Err(MetadataError::missing_property(value.runtime_type_name(), wire_name)),
            };
        }

        if allow_add {
            if let Some(ops) = &self.collection {
                if !(ops.contains)(&*instance, &value)? {
                    (ops.add)(instance, value)?;
                }
                return Ok(());
            }
        }

        match &self.set {
            Some(set) => set(instance, value),
            None => Err(MetadataError::missing_property(value.runtime_type_name(), wire_name)),
        }
    }

    /// Append `value` to the collection held by `instance`
    pub fn add_to_collection(&self, instance: &mut dyn Any, value: ClientValue) -> MetadataResult<()> {
        (self.collection_ops()?.add)(instance, value)
    }

    /// Remove `value` from the collection, reporting whether it was present
    pub fn remove_value(&self, instance: &mut dyn Any, value: &ClientValue) -> MetadataResult<bool> {
        (self.collection_ops()?.remove)(instance, value)
    }

    /// Whether the collection holds `value`
    pub fn contains_value(&self, instance: &dyn Any, value: &ClientValue) -> MetadataResult<bool> {
        (self.collection_ops()?.contains)(instance, value)
    }

    /// Empty the collection held by `instance`
    pub fn clear_collection(&self, instance: &mut dyn Any) -> MetadataResult<()> {
        (self.collection_ops()?.clear)(instance)
    }
}

impl fmt::Debug for ClientPropertyAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPropertyAnnotation")
            .field("wire_name", &self.wire_name)
            .field("name", &self.name())
            .field("declared_type", &self.declared_type)
            .field("dictionary", &self.dictionary_value_type)
            .field("collection", &self.collection_element_type)
            .field("entity_collection", &self.is_entity_collection())
            .field("spatial", &self.is_spatial)
            .field("stream_link", &self.is_stream_link)
            .field(
                "mime_type_property",
                &self.mime_type_property.get().map(|p| p.name().to_string()),
            )
            .finish()
    }
}
