//! The client model
//!
//! [`ClientModel`] owns the binding between a schema model and the
//! application types that represent it. It hands out exactly one
//! [`ClientTypeAnnotation`] per schema type and one
//! [`ClientPropertyAnnotation`] per schema property and owning application
//! type. They live in the client model's own annotation table, so several
//! client models can share one schema model.

use std::sync::Arc;

use odata_edm::{AnnotationStore, EdmModel, EdmPropertyId, EdmTypeId, EdmTypeKind};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{MetadataError, MetadataResult};
use crate::metadata::{
    type_util, ClientPropertyAnnotation, ClientTypeAnnotation, ClientTypeCache, EntityTypeCombiner,
    NavigationPropertyFacade, ProtocolVersion,
};
use crate::options::{ClientModelOptions, UndeclaredPropertyBehavior};
use crate::reflect::{ClientTypeId, TypeUniverse};

/// Builder for [`ClientModel`]
#[derive(Debug)]
pub struct ClientModelBuilder {
    edm: Arc<EdmModel>,
    universe: Arc<TypeUniverse>,
    type_cache: Option<Arc<ClientTypeCache>>,
    options: ClientModelOptions,
    bindings: Vec<(EdmTypeId, ClientTypeId)>,
}

impl ClientModelBuilder {
    /// Start a model over `edm` whose application types live in `universe`
    pub fn new(edm: Arc<EdmModel>, universe: Arc<TypeUniverse>) -> Self {
        Self {
            edm,
            universe,
            type_cache: None,
            options: ClientModelOptions::default(),
            bindings: Vec::new(),
        }
    }

    /// Share an existing wire-name cache instead of creating a private one
    ///
    /// The cache must be over the same universe as the model.
    pub fn type_cache(mut self, cache: Arc<ClientTypeCache>) -> Self {
        self.type_cache = Some(cache);
        self
    }

    /// Use `options`
    pub fn options(mut self, options: ClientModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Bind a schema type to the application type that represents it
    pub fn bind(mut self, schema: EdmTypeId, client: ClientTypeId) -> Self {
        self.bindings.push((schema, client));
        self
    }

    /// Bind every schema type to the public application type whose
    /// server-defined qualified name equals the schema name
    ///
    /// Schema types with no match, or more than one, are left unbound.
    pub fn bind_by_name(mut self) -> Self {
        let mut by_name: FxHashMap<String, Vec<ClientTypeId>> = FxHashMap::default();
        for ty in self.universe.snapshot() {
            if ty.is_public() && (ty.is_structured() || ty.is_enum()) {
                by_name
                    .entry(type_util::full_server_defined_type_name(&ty))
                    .or_default()
                    .push(ty.id());
            }
        }

        for schema in self.edm.types() {
            if let Some([only]) = by_name.get(&schema.full_name()).map(Vec::as_slice) {
                self.bindings.push((schema.id, *only));
            }
        }
        self
    }

    /// Validate the bindings and create the model
    pub fn build(self) -> MetadataResult<ClientModel> {
        let type_cache = match self.type_cache {
            Some(cache) if !Arc::ptr_eq(cache.universe(), &self.universe) => {
                return Err(MetadataError::ForeignTypeCache);
            }
            Some(cache) => cache,
            None => Arc::new(ClientTypeCache::new(self.universe.clone())),
        };

        let mut schema_to_client = FxHashMap::default();
        let mut client_to_schema = FxHashMap::default();

        for (schema, client) in self.bindings {
            let schema_ty = self.edm.schema_type(schema)?;
            let client_ty = self.universe.get(client)?;

            let reason = match schema_ty.kind {
                EdmTypeKind::Entity | EdmTypeKind::Complex if !client_ty.is_structured() => {
                    Some("structured schema types need an application type with members")
                }
                EdmTypeKind::Enum if !client_ty.is_enum() => {
                    Some("enum schema types need an application enum")
                }
                _ => None,
            };
            if let Some(reason) = reason {
                return Err(MetadataError::BindingKindMismatch {
                    schema_type: schema_ty.full_name(),
                    client_type: client_ty.full_name(),
                    reason,
                });
            }

            trace!(schema_type = %schema_ty.full_name(), client_type = %client_ty, "bound type");
            schema_to_client.insert(schema, client);
            client_to_schema.entry(client).or_insert(schema);
        }

        debug!(bindings = schema_to_client.len(), "built client model");
        Ok(ClientModel {
            edm: self.edm,
            universe: self.universe,
            type_cache,
            options: self.options,
            schema_to_client,
            client_to_schema,
            annotations: AnnotationStore::new(),
        })
    }
}

/// Where a client annotation is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AnnotationSite {
    Type(EdmTypeId),
    /// A schema property as exposed by one application type
    Property(EdmPropertyId, ClientTypeId),
}

/// Binding of a schema model to application types
#[derive(Debug)]
pub struct ClientModel {
    edm: Arc<EdmModel>,
    universe: Arc<TypeUniverse>,
    type_cache: Arc<ClientTypeCache>,
    options: ClientModelOptions,
    schema_to_client: FxHashMap<EdmTypeId, ClientTypeId>,
    client_to_schema: FxHashMap<ClientTypeId, EdmTypeId>,
    annotations: AnnotationStore<AnnotationSite>,
}

impl ClientModel {
    /// Schema model
    pub fn edm(&self) -> &Arc<EdmModel> {
        &self.edm
    }

    /// Application type universe
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// Wire-name cache used by [`resolve_type`](Self::resolve_type)
    pub fn type_cache(&self) -> &Arc<ClientTypeCache> {
        &self.type_cache
    }

    /// Options
    pub fn options(&self) -> &ClientModelOptions {
        &self.options
    }

    /// Application type bound to a schema type
    pub fn client_type_of(&self, schema: EdmTypeId) -> MetadataResult<ClientTypeId> {
        match self.schema_to_client.get(&schema) {
            Some(client) => Ok(*client),
            None => Err(MetadataError::UnboundSchemaType {
                type_name: self.edm.full_name(schema)?,
            }),
        }
    }

    /// Schema type an application type is bound to
    pub fn schema_type_of(&self, client: ClientTypeId) -> MetadataResult<EdmTypeId> {
        match self.client_to_schema.get(&client) {
            Some(schema) => Ok(*schema),
            None => Err(MetadataError::UnboundClientType {
                type_name: self.universe.get(client)?.full_name(),
            }),
        }
    }

    /// The metadata of a schema type, created on first request
    pub fn type_annotation(&self, schema: EdmTypeId) -> MetadataResult<Arc<ClientTypeAnnotation>> {
        self.annotations
            .get_or_try_insert(AnnotationSite::Type(schema), || {
                ClientTypeAnnotation::new(self, schema).map(Arc::new)
            })
    }

    /// The metadata of the schema type an application type is bound to
    pub fn type_annotation_for(&self, client: ClientTypeId) -> MetadataResult<Arc<ClientTypeAnnotation>> {
        self.type_annotation(self.schema_type_of(client)?)
    }

    /// The metadata of a schema property, created on first request
    ///
    /// The member is looked up on the application type bound to the
    /// property's declaring schema type, or on the one bound to
    /// `requesting_type` when the declaring type is unbound. Each distinct
    /// owning application type gets its own instance.
    pub fn property_annotation(
        &self,
        property: EdmPropertyId,
        requesting_type: EdmTypeId,
    ) -> MetadataResult<Arc<ClientPropertyAnnotation>> {
        let schema_property = self.edm.property(property)?;
        let owner = match self.schema_to_client.get(&schema_property.declaring_type) {
            Some(owner) => *owner,
            None => self.client_type_of(requesting_type)?,
        };

        self.annotations.get_or_try_insert(
            AnnotationSite::Property(property, owner),
            || -> MetadataResult<Arc<ClientPropertyAnnotation>> {
                let Some(member) = type_util::client_member(
                    &self.universe,
                    owner,
                    &schema_property.name,
                    UndeclaredPropertyBehavior::ThrowException,
                )?
                else {
                    return Err(MetadataError::missing_property(
                        self.universe.get(owner)?.full_name(),
                        &schema_property.name,
                    ));
                };
                ClientPropertyAnnotation::new(&self.universe, schema_property, member).map(Arc::new)
            },
        )
    }

    /// Look up a property of a schema type using the configured
    /// undeclared-property policy
    pub fn get_property(
        &self,
        schema: EdmTypeId,
        wire_name: &str,
    ) -> MetadataResult<Option<Arc<ClientPropertyAnnotation>>> {
        self.type_annotation(schema)?
            .get_property(self, wire_name, self.options.undeclared_property_behavior)
    }

    /// Resolve a wire type name against an expected application type
    pub fn resolve_type(&self, wire_name: &str, expected: ClientTypeId) -> MetadataResult<Option<ClientTypeId>> {
        self.type_cache.resolve(wire_name, expected)
    }

    /// Fail when a schema type needs a newer protocol than the configured maximum
    pub fn check_protocol_version(&self, schema: EdmTypeId) -> MetadataResult<ProtocolVersion> {
        let annotation = self.type_annotation(schema)?;
        let required = annotation.required_schema_version(self)?;
        if required > self.options.max_protocol_version {
            return Err(MetadataError::ProtocolVersionTooLow {
                type_name: annotation.name().to_string(),
                required,
                max: self.options.max_protocol_version,
            });
        }
        Ok(required)
    }

    /// Pair a navigation property of this model with the service's declaration
    pub fn navigation_facade(
        &self,
        client_property: EdmPropertyId,
        service_model: Arc<EdmModel>,
        service_property: EdmPropertyId,
        combiner: Arc<dyn EntityTypeCombiner>,
    ) -> MetadataResult<NavigationPropertyFacade> {
        NavigationPropertyFacade::new(
            self.edm.clone(),
            client_property,
            service_model,
            service_property,
            combiner,
        )
    }
}
