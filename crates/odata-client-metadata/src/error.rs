//! Client metadata errors
//!
//! Every error here is caused by how application types or the schema are
//! declared. None is transient and none is retried.

use odata_edm::EdmError;
use thiserror::Error;

use crate::metadata::ProtocolVersion;

/// Result alias used throughout the crate
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised while resolving client type metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A wire or application property name has no counterpart on the type
    #[error("The type '{type_name}' has no settable property named '{property}'")]
    MissingProperty {
        /// Type that was searched
        type_name: String,
        /// Requested name
        property: String,
    },

    /// A media-entry declaration names a property that does not exist
    #[error("The media entry declaration on type '{type_name}' names property '{property}', which does not exist")]
    MissingMediaEntryProperty {
        /// Declaring type
        type_name: String,
        /// Declared media member
        property: String,
    },

    /// A mime-type declaration names a data property that does not exist
    #[error("The mime type declaration on type '{type_name}' names data property '{property}', which does not exist")]
    MissingMimeTypeDataProperty {
        /// Declaring type
        type_name: String,
        /// Declared data member
        property: String,
    },

    /// A mime-type declaration names a mime-type property that does not exist
    #[error("The mime type declaration on type '{type_name}' names mime type property '{property}', which does not exist")]
    MissingMimeTypeProperty {
        /// Declaring type
        type_name: String,
        /// Declared mime-type member
        property: String,
    },

    /// More than one loaded type matches a wire type name
    #[error("Ambiguous type name '{wire_name}' for expected type '{expected}': more than one loaded type matches")]
    AmbiguousType {
        /// Name as it appeared on the wire
        wire_name: String,
        /// Expected application type
        expected: String,
    },

    /// A type implements more than one instantiation of a collection capability
    #[error("Type '{type_name}' implements more than one collection instantiation, which is not supported")]
    MultipleImplementationNotSupported {
        /// Offending type
        type_name: String,
    },

    /// Key members are declared on different types of an inheritance chain
    #[error("Key properties of type '{type_name}' are declared on different types")]
    KeysOnDifferentDeclaredTypes {
        /// Type whose keys were discovered
        type_name: String,
    },

    /// A key member is not a simple type
    #[error("Key property '{property}' of type '{type_name}' has type '{property_type}'; keys must be simple types")]
    KeysMustBeSimpleTypes {
        /// Key member
        property: String,
        /// Type whose keys were discovered
        type_name: String,
        /// Type of the key member
        property_type: String,
    },

    /// Client and service disagree on whether a navigation is collection-valued
    #[error("Navigation property '{property}' has inconsistent multiplicity between client and service")]
    InconsistentMultiplicity {
        /// Navigation property name
        property: String,
    },

    /// A navigation property does not target an entity type
    #[error("Navigation property '{property}' on type '{declaring_type}' does not target an entity type")]
    NonEntityType {
        /// Navigation property name
        property: String,
        /// Type declaring the navigation property
        declaring_type: String,
    },

    /// An accessor ran against an instance of the wrong application type
    #[error("Property '{property}' expects an instance of '{expected}'")]
    InstanceTypeMismatch {
        /// Property whose accessor ran
        property: String,
        /// Application type the accessor was compiled for
        expected: &'static str,
    },

    /// A value could not be converted to the member's declared type
    #[error("Property '{property}' cannot accept a value of type '{actual}'; expected '{expected}'")]
    ValueTypeMismatch {
        /// Property being written
        property: String,
        /// Expected Rust type
        expected: &'static str,
        /// Runtime type of the supplied value
        actual: String,
    },

    /// A type handle does not belong to the type universe
    #[error("Unknown client type handle {id}")]
    UnknownClientType {
        /// Raw handle
        id: u32,
    },

    /// A schema type has no application type bound to it
    #[error("Schema type '{type_name}' is not bound to an application type")]
    UnboundSchemaType {
        /// Qualified schema type name
        type_name: String,
    },

    /// An application type is not bound to any schema type
    #[error("Application type '{type_name}' is not bound to a schema type")]
    UnboundClientType {
        /// Application type name
        type_name: String,
    },

    /// Schema and application type kinds disagree
    #[error("Cannot bind schema type '{schema_type}' to application type '{client_type}': {reason}")]
    BindingKindMismatch {
        /// Qualified schema type name
        schema_type: String,
        /// Application type name
        client_type: String,
        /// Why the kinds are incompatible
        reason: &'static str,
    },

    /// A shared wire-name cache was built over a different type universe
    #[error("The wire-name type cache belongs to a different type universe than the model")]
    ForeignTypeCache,

    /// Two declarations pair one data property with different mime-type properties
    #[error("Data property '{property}' of type '{type_name}' is already paired with mime type property '{existing}', not '{requested}'")]
    ConflictingMimeTypeProperty {
        /// Type whose declaration conflicts
        type_name: String,
        /// Data property
        property: String,
        /// Mime-type property already paired
        existing: String,
        /// Mime-type property of the conflicting declaration
        requested: String,
    },

    /// A type needs a newer protocol version than the client may speak
    #[error("Type '{type_name}' requires protocol version {required}, but the maximum is {max}")]
    ProtocolVersionTooLow {
        /// Type being checked
        type_name: String,
        /// Version the type needs
        required: ProtocolVersion,
        /// Configured ceiling
        max: ProtocolVersion,
    },

    /// The schema model rejected a lookup
    #[error(transparent)]
    Schema(#[from] EdmError),

    /// Options could not be parsed
    #[error("Failed to parse client model options: {0}")]
    Config(#[from] toml::de::Error),

    /// Options could not be rendered
    #[error("Failed to render client model options: {0}")]
    ConfigRender(#[from] toml::ser::Error),
}

impl MetadataError {
    pub(crate) fn missing_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        MetadataError::MissingProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }
}
