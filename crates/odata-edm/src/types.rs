//! Core schema type definitions

use std::fmt;

/// Handle of a schema type inside an [`EdmModel`](crate::EdmModel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdmTypeId(pub(crate) u32);

impl EdmTypeId {
    /// Arena index of this handle
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdmTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmTypeId({})", self.0)
    }
}

/// Handle of a schema property inside an [`EdmModel`](crate::EdmModel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdmPropertyId(pub(crate) u32);

impl EdmPropertyId {
    /// Arena index of this handle
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdmPropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdmPropertyId({})", self.0)
    }
}

/// Any schema element that can carry annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmElement {
    /// A schema type
    Type(EdmTypeId),
    /// A schema property
    Property(EdmPropertyId),
}

impl From<EdmTypeId> for EdmElement {
    fn from(id: EdmTypeId) -> Self {
        EdmElement::Type(id)
    }
}

impl From<EdmPropertyId> for EdmElement {
    fn from(id: EdmPropertyId) -> Self {
        EdmElement::Property(id)
    }
}

/// Built-in primitive types of the schema language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmPrimitiveKind {
    /// `Edm.Boolean`
    Boolean,
    /// `Edm.Byte`
    Byte,
    /// `Edm.SByte`
    SByte,
    /// `Edm.Int16`
    Int16,
    /// `Edm.Int32`
    Int32,
    /// `Edm.Int64`
    Int64,
    /// `Edm.Single`
    Single,
    /// `Edm.Double`
    Double,
    /// `Edm.Decimal`
    Decimal,
    /// `Edm.String`
    String,
    /// `Edm.Binary`
    Binary,
    /// `Edm.Guid`
    Guid,
    /// `Edm.Date`
    Date,
    /// `Edm.DateTimeOffset`
    DateTimeOffset,
    /// `Edm.TimeOfDay`
    TimeOfDay,
    /// `Edm.Duration`
    Duration,
    /// `Edm.Stream`
    Stream,
    /// `Edm.Geography` and its subtypes
    Geography,
    /// `Edm.Geometry` and its subtypes
    Geometry,
}

impl EdmPrimitiveKind {
    /// Whether this is one of the spatial kinds
    pub fn is_spatial(self) -> bool {
        matches!(self, EdmPrimitiveKind::Geography | EdmPrimitiveKind::Geometry)
    }

    /// Qualified name as written in schema documents
    pub fn qualified_name(self) -> &'static str {
        match self {
            EdmPrimitiveKind::Boolean => "Edm.Boolean",
            EdmPrimitiveKind::Byte => "Edm.Byte",
            EdmPrimitiveKind::SByte => "Edm.SByte",
            EdmPrimitiveKind::Int16 => "Edm.Int16",
            EdmPrimitiveKind::Int32 => "Edm.Int32",
            EdmPrimitiveKind::Int64 => "Edm.Int64",
            EdmPrimitiveKind::Single => "Edm.Single",
            EdmPrimitiveKind::Double => "Edm.Double",
            EdmPrimitiveKind::Decimal => "Edm.Decimal",
            EdmPrimitiveKind::String => "Edm.String",
            EdmPrimitiveKind::Binary => "Edm.Binary",
            EdmPrimitiveKind::Guid => "Edm.Guid",
            EdmPrimitiveKind::Date => "Edm.Date",
            EdmPrimitiveKind::DateTimeOffset => "Edm.DateTimeOffset",
            EdmPrimitiveKind::TimeOfDay => "Edm.TimeOfDay",
            EdmPrimitiveKind::Duration => "Edm.Duration",
            EdmPrimitiveKind::Stream => "Edm.Stream",
            EdmPrimitiveKind::Geography => "Edm.Geography",
            EdmPrimitiveKind::Geometry => "Edm.Geometry",
        }
    }
}

impl fmt::Display for EdmPrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified_name())
    }
}

/// Kind of a named schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmTypeKind {
    /// Entity type (has identity)
    Entity,
    /// Complex type (structured value without identity)
    Complex,
    /// Enumeration type
    Enum,
}

impl EdmTypeKind {
    /// Entity and complex types are structured
    pub fn is_structured(self) -> bool {
        matches!(self, EdmTypeKind::Entity | EdmTypeKind::Complex)
    }
}

/// The definition a type reference points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdmType {
    /// A built-in primitive type
    Primitive(EdmPrimitiveKind),
    /// A named entity, complex or enum type
    Named(EdmTypeId),
    /// A collection of the element reference
    Collection(Box<EdmTypeRef>),
}

/// A reference to a type together with its nullability
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdmTypeRef {
    /// Referenced definition
    pub definition: EdmType,
    /// Whether null is a legal value
    pub nullable: bool,
}

impl EdmTypeRef {
    /// Reference to a primitive type
    pub fn primitive(kind: EdmPrimitiveKind, nullable: bool) -> Self {
        Self {
            definition: EdmType::Primitive(kind),
            nullable,
        }
    }

    /// Reference to a named schema type
    pub fn named(id: EdmTypeId, nullable: bool) -> Self {
        Self {
            definition: EdmType::Named(id),
            nullable,
        }
    }

    /// Reference to a collection of `element`
    pub fn collection(element: EdmTypeRef) -> Self {
        Self {
            definition: EdmType::Collection(Box::new(element)),
            nullable: false,
        }
    }

    /// Same definition with a different nullability
    pub fn with_nullable(&self, nullable: bool) -> Self {
        Self {
            definition: self.definition.clone(),
            nullable,
        }
    }

    /// Whether this reference is collection-valued
    pub fn is_collection(&self) -> bool {
        matches!(self.definition, EdmType::Collection(_))
    }

    /// Element reference for collections, the reference itself otherwise
    pub fn element(&self) -> &EdmTypeRef {
        match &self.definition {
            EdmType::Collection(element) => element,
            _ => self,
        }
    }

    /// Named type of the (element) reference, if any
    pub fn named_type(&self) -> Option<EdmTypeId> {
        match self.element().definition {
            EdmType::Named(id) => Some(id),
            _ => None,
        }
    }

    /// Primitive kind of the (element) reference, if any
    pub fn primitive_kind(&self) -> Option<EdmPrimitiveKind> {
        match self.element().definition {
            EdmType::Primitive(kind) => Some(kind),
            _ => None,
        }
    }
}

/// A named schema type
#[derive(Debug, Clone)]
pub struct EdmSchemaType {
    /// Handle of this type
    pub id: EdmTypeId,
    /// Local name
    pub name: String,
    /// Declaring namespace
    pub namespace: String,
    /// Type kind
    pub kind: EdmTypeKind,
    /// Base type, if derived
    pub base_type: Option<EdmTypeId>,
    /// Properties declared on this type (not inherited), in declaration order
    pub properties: Vec<EdmPropertyId>,
    /// Declared key property names (entity types only)
    pub key: Vec<String>,
    /// Whether undeclared properties are allowed
    pub is_open: bool,
    /// Whether the type is abstract
    pub is_abstract: bool,
    /// Whether instances carry a media stream
    pub has_stream: bool,
}

impl EdmSchemaType {
    /// Namespace-qualified name
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

/// Structural or navigation flavour of a property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdmPropertyKind {
    /// Data-valued property
    Structural,
    /// Relationship to another entity or entity collection
    Navigation {
        /// Partner property on the target type
        partner: Option<EdmPropertyId>,
        /// Whether the target entities are contained
        contains_target: bool,
    },
}

/// A schema property
#[derive(Debug, Clone)]
pub struct EdmProperty {
    /// Handle of this property
    pub id: EdmPropertyId,
    /// Property name as declared by the service
    pub name: String,
    /// Type declaring this property
    pub declaring_type: EdmTypeId,
    /// Declared type
    pub type_ref: EdmTypeRef,
    /// Structural or navigation
    pub kind: EdmPropertyKind,
}

impl EdmProperty {
    /// Whether this is a navigation property
    pub fn is_navigation(&self) -> bool {
        matches!(self.kind, EdmPropertyKind::Navigation { .. })
    }

    /// Partner of a navigation property
    pub fn partner(&self) -> Option<EdmPropertyId> {
        match self.kind {
            EdmPropertyKind::Navigation { partner, .. } => partner,
            EdmPropertyKind::Structural => None,
        }
    }
}
