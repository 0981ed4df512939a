//! Schema model errors

use thiserror::Error;

use crate::types::{EdmPropertyId, EdmTypeId};

/// Result alias for schema model operations
pub type EdmResult<T> = Result<T, EdmError>;

/// Errors raised while building or querying a schema model
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EdmError {
    /// A type handle does not belong to this model
    #[error("Unknown schema type: {id}")]
    UnknownType {
        /// Offending handle
        id: EdmTypeId,
    },

    /// A property handle does not belong to this model
    #[error("Unknown schema property: {id}")]
    UnknownProperty {
        /// Offending handle
        id: EdmPropertyId,
    },

    /// Two types were declared with the same qualified name
    #[error("Duplicate schema type: {name}")]
    DuplicateType {
        /// Qualified type name
        name: String,
    },

    /// A type declares two properties with the same name
    #[error("Duplicate property '{property}' on type '{type_name}'")]
    DuplicateProperty {
        /// Declaring type
        type_name: String,
        /// Property name
        property: String,
    },

    /// Properties can only be declared on entity and complex types
    #[error("Type '{type_name}' is not a structured type")]
    NotStructured {
        /// Offending type
        type_name: String,
    },

    /// The base type chain loops back on itself
    #[error("Circular base type chain detected at '{type_name}'")]
    BaseTypeCycle {
        /// Type at which the cycle was detected
        type_name: String,
    },

    /// A type derives from a type of a different kind
    #[error("Type '{type_name}' cannot derive from '{base}': kinds differ")]
    BaseKindMismatch {
        /// Derived type
        type_name: String,
        /// Base type
        base: String,
    },
}
