//! OData Client Metadata
//!
//! Binds the types of a service schema to application types and resolves,
//! once per model, how to read and write each property, which members form
//! the identity key, and how wire type names map back to application types.
//!
//! # Overview
//!
//! - [`TypeUniverse`] holds the application types, described as
//!   [`ClientType`]s whose members carry typed accessor hooks
//! - [`ClientModel`] binds schema types to application types and owns one
//!   [`ClientTypeAnnotation`] / [`ClientPropertyAnnotation`] per schema element
//! - [`ClientTypeCache`] resolves wire type names, shared by every model over one universe
//! - [`NavigationPropertyFacade`] reconciles client and service navigation
//!   declarations
//!
//! ## Usage
//!
//! ```ignore
//! let universe = Arc::new(TypeUniverse::new());
//! let customer = universe.register(
//!     ClientTypeBuilder::class("Sample.Customer")
//!         .member(ClientMember::new("Id", universe.primitive(EdmPrimitiveKind::Int32))
//!             .field(|c: &Customer| &c.id, |c: &mut Customer| &mut c.id)),
//! );
//! let model = ClientModelBuilder::new(edm, universe).bind_by_name().build()?;
//! let annotation = model.type_annotation_for(customer)?;
//! for property in annotation.properties_to_serialize(&model)? {
//!     let value = property.get_value(&instance)?;
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod metadata;
pub mod model;
pub mod options;
pub mod reflect;
pub mod value;

pub use error::{MetadataError, MetadataResult};
pub use metadata::{
    ClientDeclaredCombiner, ClientPropertyAnnotation, ClientTypeAnnotation, ClientTypeCache,
    EntityTypeCombiner, KeyKind, NavigationPropertyFacade, ProtocolVersion,
};
pub use model::{ClientModel, ClientModelBuilder};
pub use options::{ClientModelOptions, UndeclaredPropertyBehavior};
pub use reflect::{
    properties_on_type, ClientMember, ClientType, ClientTypeBuilder, ClientTypeId, ClientTypeKind,
    MemberRef, TypeUniverse,
};
pub use value::{ClientData, ClientValue, ObjectRef};
