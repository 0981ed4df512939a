//! OData Schema Model
//!
//! An arena-backed representation of the abstract schema a remote data
//! service publishes: entity, complex and enum types, their structural and
//! navigation properties, and the base-type relationships between them.
//!
//! The model is assembled once through [`EdmModelBuilder`] and is read-only
//! afterwards. The only mutable part is the [`AnnotationStore`], which lets
//! higher layers attach exactly one opaque value per (schema element,
//! annotation kind) pair for the lifetime of the model.
//!
//! ## Usage
//!
//! ```ignore
//! let mut builder = EdmModelBuilder::new("Sample");
//! let customer = builder.entity_type("Customer")?;
//! builder.set_key(customer, ["Id"])?;
//! builder.structural_property(customer, "Id", EdmTypeRef::primitive(EdmPrimitiveKind::Int32, false))?;
//! let model = builder.build()?;
//! ```

#![warn(missing_docs)]

pub mod annotations;
pub mod builder;
pub mod error;
pub mod model;
pub mod types;

pub use annotations::AnnotationStore;
pub use builder::EdmModelBuilder;
pub use error::{EdmError, EdmResult};
pub use model::EdmModel;
pub use types::{
    EdmElement, EdmPrimitiveKind, EdmProperty, EdmPropertyId, EdmPropertyKind, EdmSchemaType,
    EdmType, EdmTypeId, EdmTypeKind, EdmTypeRef,
};
