//! Per-type metadata
//!
//! A [`ClientTypeAnnotation`] binds one schema type to its application type.
//! Everything it knows beyond that binding is computed on first request and
//! kept for the lifetime of the owning [`ClientModel`]: the property
//! collection, the key properties, the media-link state and the protocol
//! version the type needs.
//!
//! Methods that may have to build something take the owning model as an
//! argument; the annotation itself is stored inside that model.

use std::fmt;
use std::sync::Arc;

use odata_edm::{EdmTypeId, EdmTypeKind};
use once_cell::sync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{MetadataError, MetadataResult};
use crate::model::ClientModel;
use crate::options::UndeclaredPropertyBehavior;
use crate::reflect::ClientType;

use super::property_annotation::ClientPropertyAnnotation;
use super::type_util;
use super::version::ProtocolVersion;

/// Properties of a type, most-derived level first, indexed by member name
#[derive(Debug)]
struct PropertyCollection {
    ordered: Vec<Arc<ClientPropertyAnnotation>>,
    by_name: FxHashMap<String, usize>,
}

impl PropertyCollection {
    fn get(&self, name: &str) -> Option<&Arc<ClientPropertyAnnotation>> {
        self.by_name.get(name).map(|index| &self.ordered[*index])
    }
}

/// Media-link state; the data member is present only with a media-entry declaration
#[derive(Debug)]
struct MediaLink {
    is_media_link_entry: bool,
    data_member: Option<Arc<ClientPropertyAnnotation>>,
}

/// Metadata of one schema type bound to an application type
pub struct ClientTypeAnnotation {
    schema_type: EdmTypeId,
    client_type: Arc<ClientType>,
    name: String,
    is_entity: bool,
    is_open: bool,
    schema_has_stream: bool,

    properties: OnceCell<PropertyCollection>,
    key_properties: OnceCell<Option<Vec<Arc<ClientPropertyAnnotation>>>>,
    media_link: OnceCell<MediaLink>,
    required_version: OnceCell<ProtocolVersion>,
}

fn is_same(a: Option<&Arc<ClientPropertyAnnotation>>, b: &Arc<ClientPropertyAnnotation>) -> bool {
    a.is_some_and(|a| Arc::ptr_eq(a, b))
}

impl ClientTypeAnnotation {
    pub(crate) fn new(model: &ClientModel, schema_type: EdmTypeId) -> MetadataResult<Self> {
        let edm = model.edm();
        let schema = edm.schema_type(schema_type)?;
        let client_type = model.universe().get(model.client_type_of(schema_type)?)?;

        let mut is_open = false;
        let mut schema_has_stream = false;
        for level in edm.base_chain(schema_type)? {
            let level = edm.schema_type(level)?;
            is_open |= level.is_open;
            schema_has_stream |= level.has_stream;
        }

        Ok(Self {
            schema_type,
            client_type,
            name: schema.full_name(),
            is_entity: schema.kind == EdmTypeKind::Entity,
            is_open,
            schema_has_stream,
            properties: OnceCell::new(),
            key_properties: OnceCell::new(),
            media_link: OnceCell::new(),
            required_version: OnceCell::new(),
        })
    }

    /// Schema type this annotation describes
    pub fn schema_type(&self) -> EdmTypeId {
        self.schema_type
    }

    /// Bound application type
    pub fn client_type(&self) -> &Arc<ClientType> {
        &self.client_type
    }

    /// Qualified schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified name the service uses for the application type
    pub fn element_type_name(&self) -> String {
        type_util::full_server_defined_type_name(&self.client_type)
    }

    /// Whether the schema type is an entity type
    pub fn is_entity_type(&self) -> bool {
        self.is_entity
    }

    /// Whether the schema type or a base is open
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    fn collection(&self, model: &ClientModel) -> MetadataResult<&PropertyCollection> {
        self.properties
            .get_or_try_init(|| self.build_properties(model))
    }

    fn build_properties(&self, model: &ClientModel) -> MetadataResult<PropertyCollection> {
        let edm = model.edm();
        let mut ordered = Vec::new();
        let mut by_name = FxHashMap::default();

        for property in edm.properties_most_derived_first(self.schema_type)? {
            let annotation = model.property_annotation(property, self.schema_type)?;
            by_name
                .entry(annotation.name().to_string())
                .or_insert(ordered.len());
            ordered.push(annotation);
        }

        let collection = PropertyCollection { ordered, by_name };
        self.apply_mime_types(model, &collection)?;

        debug!(
            schema_type = %self.name,
            client_type = %self.client_type,
            properties = collection.ordered.len(),
            "built property collection"
        );
        Ok(collection)
    }

    fn apply_mime_types(&self, model: &ClientModel, collection: &PropertyCollection) -> MetadataResult<()> {
        for level in model.universe().base_chain(self.client_type.id())? {
            let Some(declaration) = &level.declarations().mime_type else {
                continue;
            };
            let data = collection.get(&declaration.data_member).ok_or_else(|| {
                MetadataError::MissingMimeTypeDataProperty {
                    type_name: level.full_name(),
                    property: declaration.data_member.clone(),
                }
            })?;
            let mime = collection.get(&declaration.mime_type_member).ok_or_else(|| {
                MetadataError::MissingMimeTypeProperty {
                    type_name: level.full_name(),
                    property: declaration.mime_type_member.clone(),
                }
            })?;
            data.set_mime_type_property(&level.full_name(), mime.clone())?;
        }
        Ok(())
    }

    /// Every property, most-derived level first
    pub fn properties(&self, model: &ClientModel) -> MetadataResult<&[Arc<ClientPropertyAnnotation>]> {
        Ok(&self.collection(model)?.ordered)
    }

    /// Look up a property by member name, then by wire name
    ///
    /// A miss is an error only under
    /// [`UndeclaredPropertyBehavior::ThrowException`].
    pub fn get_property(
        &self,
        model: &ClientModel,
        wire_name: &str,
        behavior: UndeclaredPropertyBehavior,
    ) -> MetadataResult<Option<Arc<ClientPropertyAnnotation>>> {
        let collection = self.collection(model)?;
        if let Some(property) = collection.get(wire_name) {
            return Ok(Some(property.clone()));
        }

        let client_name = type_util::client_field_name(model.universe(), self.client_type.id(), wire_name)?;
        if let Some(property) = client_name.as_deref().and_then(|name| collection.get(name)) {
            return Ok(Some(property.clone()));
        }

        if behavior == UndeclaredPropertyBehavior::ThrowException {
            return Err(MetadataError::missing_property(self.element_type_name(), wire_name));
        }
        Ok(None)
    }

    /// Properties written to a payload, ordered by name
    ///
    /// Dictionaries, stream links, ignored members, the media data member
    /// and the member holding its mime type are left out.
    pub fn properties_to_serialize(&self, model: &ClientModel) -> MetadataResult<Vec<Arc<ClientPropertyAnnotation>>> {
        let media = self.media_data_member(model)?;
        let media_mime = media.as_ref().and_then(|data| data.mime_type_property().cloned());

        let mut result: Vec<_> = self
            .properties(model)?
            .iter()
            .filter(|p| {
                !p.is_dictionary()
                    && !p.is_stream_link()
                    && !p.is_ignored()
                    && !is_same(media.as_ref(), p)
                    && !is_same(media_mime.as_ref(), p)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }

    /// Key properties; `None` when the application type has no identity
    pub fn key_properties(&self, model: &ClientModel) -> MetadataResult<Option<&[Arc<ClientPropertyAnnotation>]>> {
        let keys = self.key_properties.get_or_try_init(|| -> MetadataResult<_> {
            let Some(members) = type_util::key_members(model.universe(), self.client_type.id())? else {
                return Ok(None);
            };
            let collection = self.collection(model)?;
            members
                .iter()
                .map(|member| {
                    collection
                        .get(member.name())
                        .cloned()
                        .ok_or_else(|| MetadataError::missing_property(self.element_type_name(), member.name()))
                })
                .collect::<MetadataResult<Vec<_>>>()
                .map(Some)
        })?;
        Ok(keys.as_deref())
    }

    fn media_link(&self, model: &ClientModel) -> MetadataResult<&MediaLink> {
        self.media_link.get_or_try_init(|| -> MetadataResult<MediaLink> {
            let chain = model.universe().base_chain(self.client_type.id())?;
            let media_entry = chain
                .iter()
                .find_map(|ty| ty.declarations().media_entry.clone());
            let has_stream = self.schema_has_stream || chain.iter().any(|ty| ty.declarations().has_stream);

            let data_member = match media_entry {
                Some(name) => {
                    let property = self.collection(model)?.get(&name).cloned().ok_or_else(|| {
                        MetadataError::MissingMediaEntryProperty {
                            type_name: self.client_type.full_name(),
                            property: name.clone(),
                        }
                    })?;
                    Some(property)
                }
                None => None,
            };

            let is_media_link_entry = data_member.is_some() || has_stream;
            debug!(
                client_type = %self.client_type,
                is_media_link_entry,
                data_member = data_member.as_ref().map(|p| p.name()),
                "resolved media link state"
            );
            Ok(MediaLink {
                is_media_link_entry,
                data_member,
            })
        })
    }

    /// Whether instances carry an associated binary stream
    pub fn is_media_link_entry(&self, model: &ClientModel) -> MetadataResult<bool> {
        Ok(self.media_link(model)?.is_media_link_entry)
    }

    /// Property holding the media resource, from the media-entry declaration
    pub fn media_data_member(&self, model: &ClientModel) -> MetadataResult<Option<Arc<ClientPropertyAnnotation>>> {
        Ok(self.media_link(model)?.data_member.clone())
    }

    /// Lowest protocol version able to represent this type
    ///
    /// Nested complex types are walked depth first; each is visited once per
    /// call, so self-referencing complex types terminate.
    pub fn required_schema_version(&self, model: &ClientModel) -> MetadataResult<ProtocolVersion> {
        self.required_version
            .get_or_try_init(|| -> MetadataResult<ProtocolVersion> {
                let mut visited = FxHashSet::default();
                visited.insert(self.schema_type);
                let mut version = ProtocolVersion::BASELINE;
                self.accumulate_version(model, &mut visited, &mut version)?;
                Ok(version)
            })
            .copied()
    }

    fn accumulate_version(
        &self,
        model: &ClientModel,
        visited: &mut FxHashSet<EdmTypeId>,
        version: &mut ProtocolVersion,
    ) -> MetadataResult<()> {
        for property in self.properties(model)? {
            if property.is_spatial() || property.is_primitive_or_complex_collection() || property.is_stream_link() {
                *version = (*version).max(ProtocolVersion::V3);
            }
            if property.is_enum() {
                *version = (*version).max(ProtocolVersion::V4);
            }
            if property.is_dictionary() {
                continue;
            }

            let type_ref = &model.edm().property(property.schema_property())?.type_ref;
            if type_ref.is_collection() {
                continue;
            }
            let Some(nested) = type_ref.named_type() else {
                continue;
            };
            if model.edm().is_complex(nested) && visited.insert(nested) {
                model
                    .type_annotation(nested)?
                    .accumulate_version(model, visited, version)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ClientTypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientTypeAnnotation")
            .field("name", &self.name)
            .field("client_type", &self.client_type.full_name())
            .field("is_entity", &self.is_entity)
            .field("properties_built", &self.properties.get().is_some())
            .finish()
    }
}
