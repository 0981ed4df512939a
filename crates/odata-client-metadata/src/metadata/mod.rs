//! Client type metadata
//!
//! Resolution and caching of everything the payload readers and writers
//! need to know about an application type: key members and name mapping,
//! per-property access, per-type property collections and protocol
//! requirements, wire-name resolution, and navigation reconciliation.

mod navigation;
mod property_annotation;
mod type_annotation;
mod type_cache;
pub mod type_util;
mod version;

pub use navigation::{ClientDeclaredCombiner, EntityTypeCombiner, NavigationPropertyFacade};
pub use property_annotation::ClientPropertyAnnotation;
pub use type_annotation::ClientTypeAnnotation;
pub use type_cache::ClientTypeCache;
pub use type_util::KeyKind;
pub use version::ProtocolVersion;
