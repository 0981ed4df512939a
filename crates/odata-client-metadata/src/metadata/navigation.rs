//! Reconciling client and service navigation properties
//!
//! The client and the service each declare a navigation property on their
//! own copy of an entity type. [`NavigationPropertyFacade`] checks that
//! both agree on multiplicity and on targeting an entity type, hands the
//! two target types to an [`EntityTypeCombiner`], and re-wraps the result.
//! The combined type reference lives in the client model's handle space and
//! always carries the client side's nullability.

use std::fmt;
use std::sync::Arc;

use odata_edm::{EdmModel, EdmProperty, EdmPropertyId, EdmPropertyKind, EdmTypeId, EdmTypeRef};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::{MetadataError, MetadataResult};

/// Merges two declarations of the same entity type into one
pub trait EntityTypeCombiner: Send + Sync {
    /// Combine `client` (in `client_model`) with `service` (in
    /// `service_model`), returning a type of `client_model`
    fn combine_entity_types(
        &self,
        client_model: &EdmModel,
        client: EdmTypeId,
        service_model: &EdmModel,
        service: EdmTypeId,
    ) -> MetadataResult<EdmTypeId>;
}

/// Combiner that keeps the client declaration as is
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientDeclaredCombiner;

impl EntityTypeCombiner for ClientDeclaredCombiner {
    fn combine_entity_types(
        &self,
        _client_model: &EdmModel,
        client: EdmTypeId,
        _service_model: &EdmModel,
        _service: EdmTypeId,
    ) -> MetadataResult<EdmTypeId> {
        Ok(client)
    }
}

/// One side of a navigation property pair
struct Side {
    model: Arc<EdmModel>,
    property: EdmProperty,
}

impl Side {
    fn new(model: Arc<EdmModel>, property: EdmPropertyId) -> MetadataResult<Self> {
        let property = model.property(property)?.clone();
        Ok(Self { model, property })
    }

    /// Entity type targeted by this side, element type for collections
    fn target_entity(&self) -> MetadataResult<EdmTypeId> {
        let element = self.property.type_ref.element();
        match element.named_type() {
            Some(id) if self.model.is_entity(id) => Ok(id),
            _ => Err(MetadataError::NonEntityType {
                property: self.property.name.clone(),
                declaring_type: self.model.full_name(self.property.declaring_type)?,
            }),
        }
    }
}

/// A navigation property declared on both the client and the service
pub struct NavigationPropertyFacade {
    client: Side,
    service: Side,
    combiner: Arc<dyn EntityTypeCombiner>,
    combined: OnceCell<EdmTypeRef>,
}

impl NavigationPropertyFacade {
    /// Pair `client_property` of `client_model` with `service_property` of
    /// `service_model`
    pub fn new(
        client_model: Arc<EdmModel>,
        client_property: EdmPropertyId,
        service_model: Arc<EdmModel>,
        service_property: EdmPropertyId,
        combiner: Arc<dyn EntityTypeCombiner>,
    ) -> MetadataResult<Self> {
        Ok(Self {
            client: Side::new(client_model, client_property)?,
            service: Side::new(service_model, service_property)?,
            combiner,
            combined: OnceCell::new(),
        })
    }

    /// Property name as the client declares it
    pub fn name(&self) -> &str {
        &self.client.property.name
    }

    /// Whether the client declares a collection-valued navigation
    pub fn is_collection(&self) -> bool {
        self.client.property.type_ref.is_collection()
    }

    /// Whether the client declares the navigation as containing its targets
    pub fn contains_target(&self) -> bool {
        matches!(
            self.client.property.kind,
            EdmPropertyKind::Navigation {
                contains_target: true,
                ..
            }
        )
    }

    /// Partner of the client-side property
    pub fn partner(&self) -> MetadataResult<Option<&EdmProperty>> {
        match self.client.property.partner() {
            Some(partner) => Ok(Some(self.client.model.property(partner)?)),
            None => Ok(None),
        }
    }

    /// The unified type of the navigation, computed once
    pub fn combined_type(&self) -> MetadataResult<&EdmTypeRef> {
        self.combined.get_or_try_init(|| self.combine())
    }

    fn combine(&self) -> MetadataResult<EdmTypeRef> {
        let client_ref = &self.client.property.type_ref;
        let is_collection = client_ref.is_collection();
        if is_collection != self.service.property.type_ref.is_collection() {
            return Err(MetadataError::InconsistentMultiplicity {
                property: self.name().to_string(),
            });
        }

        let client_target = self.client.target_entity()?;
        let service_target = self.service.target_entity()?;
        let combined = self.combiner.combine_entity_types(
            &self.client.model,
            client_target,
            &self.service.model,
            service_target,
        )?;

        debug!(
            property = self.name(),
            is_collection,
            combined = %combined,
            "combined navigation property type"
        );

        let element = EdmTypeRef::named(combined, client_ref.element().nullable);
        Ok(if is_collection {
            EdmTypeRef::collection(element).with_nullable(client_ref.nullable)
        } else {
            element
        })
    }
}

impl fmt::Debug for NavigationPropertyFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationPropertyFacade")
            .field("name", &self.name())
            .field("is_collection", &self.is_collection())
            .field("combined", &self.combined.get())
            .finish()
    }
}
