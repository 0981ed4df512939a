//! Application type descriptors
//!
//! A [`ClientType`] describes one application type the way the metadata
//! layer needs to see it: its shape, its base type, the members it declares,
//! the collection/dictionary capabilities it offers, and the declarations
//! (key names, media entry, renames, ...) attached to it.

use std::fmt;

use odata_edm::EdmPrimitiveKind;

use super::member::ClientMember;

/// Handle of an application type inside a [`TypeUniverse`](super::TypeUniverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientTypeId(pub(crate) u32);

impl ClientTypeId {
    /// Raw handle value
    pub fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClientTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientTypeId({})", self.0)
    }
}

/// Shape of an application type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientTypeKind {
    /// A primitive the wire format knows how to carry
    Primitive(EdmPrimitiveKind),
    /// A fieldless enum
    Enum,
    /// `Option<T>` over another type
    Nullable(ClientTypeId),
    /// A reference type with members
    Class,
    /// A value type with members
    Struct,
    /// A fixed array of the element type
    Array(ClientTypeId),
    /// A link to a named stream
    StreamLink,
    /// A raw pointer or platform handle
    Pointer,
}

/// A (data member, mime-type member) pairing declared on a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeTypeDeclaration {
    /// Member holding the data
    pub data_member: String,
    /// Member holding the data's mime type
    pub mime_type_member: String,
}

/// Declarations attached to an application type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDeclarations {
    /// Explicit key member names
    pub key: Option<Vec<String>>,
    /// Marks the type as an entity even without discoverable keys
    pub entity: bool,
    /// Member holding the media resource of a media-link entry
    pub media_entry: Option<String>,
    /// Marks the type as carrying a default stream
    pub has_stream: bool,
    /// Data/mime-type member pairing
    pub mime_type: Option<MimeTypeDeclaration>,
    /// Name the service uses for this type
    pub original_name: Option<String>,
}

/// Descriptor of one application type
#[derive(Debug)]
pub struct ClientType {
    pub(crate) id: ClientTypeId,
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) kind: ClientTypeKind,
    pub(crate) is_public: bool,
    pub(crate) base: Option<ClientTypeId>,
    pub(crate) members: Vec<ClientMember>,
    pub(crate) collection_of: Vec<ClientTypeId>,
    pub(crate) dictionary_of: Option<ClientTypeId>,
    pub(crate) declarations: TypeDeclarations,
}

impl ClientType {
    /// Handle of this type
    pub fn id(&self) -> ClientTypeId {
        self.id
    }

    /// Local name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Namespace-qualified name
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}.{}", namespace, self.name),
            None => self.name.clone(),
        }
    }

    /// Shape of the type
    pub fn kind(&self) -> ClientTypeKind {
        self.kind
    }

    /// Whether code outside the defining module can see the type
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// Direct base type
    pub fn base(&self) -> Option<ClientTypeId> {
        self.base
    }

    /// Members declared on this type (not inherited)
    pub fn members(&self) -> &[ClientMember] {
        &self.members
    }

    /// Element type of every collection instantiation the type implements
    pub fn collection_of(&self) -> &[ClientTypeId] {
        &self.collection_of
    }

    /// Value type of the string-keyed indexer, if the type has one
    pub fn dictionary_of(&self) -> Option<ClientTypeId> {
        self.dictionary_of
    }

    /// Declarations attached directly to this type
    pub fn declarations(&self) -> &TypeDeclarations {
        &self.declarations
    }

    /// Underlying type when this is `Option<T>`
    pub fn nullable_underlying(&self) -> Option<ClientTypeId> {
        match self.kind {
            ClientTypeKind::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// Whether values of the type are copied rather than shared
    pub fn is_value_type(&self) -> bool {
        match self.kind {
            ClientTypeKind::Primitive(kind) => !matches!(
                kind,
                EdmPrimitiveKind::String
                    | EdmPrimitiveKind::Binary
                    | EdmPrimitiveKind::Stream
                    | EdmPrimitiveKind::Geography
                    | EdmPrimitiveKind::Geometry
            ),
            ClientTypeKind::Enum | ClientTypeKind::Nullable(_) | ClientTypeKind::Struct => true,
            ClientTypeKind::Class
            | ClientTypeKind::Array(_)
            | ClientTypeKind::StreamLink
            | ClientTypeKind::Pointer => false,
        }
    }

    /// Whether the wire format carries the type as a primitive
    pub fn is_known_primitive(&self) -> bool {
        matches!(self.kind, ClientTypeKind::Primitive(kind) if kind != EdmPrimitiveKind::Stream)
    }

    /// Whether the type is spatial
    pub fn is_spatial(&self) -> bool {
        matches!(self.kind, ClientTypeKind::Primitive(kind) if kind.is_spatial())
    }

    /// Whether the type is an enum
    pub fn is_enum(&self) -> bool {
        self.kind == ClientTypeKind::Enum
    }

    /// Whether the type has members of its own
    pub fn is_structured(&self) -> bool {
        matches!(self.kind, ClientTypeKind::Class | ClientTypeKind::Struct)
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Builder for user-defined [`ClientType`]s
#[derive(Debug)]
pub struct ClientTypeBuilder {
    pub(crate) name: String,
    pub(crate) namespace: Option<String>,
    pub(crate) kind: ClientTypeKind,
    pub(crate) is_public: bool,
    pub(crate) base: Option<ClientTypeId>,
    pub(crate) members: Vec<ClientMember>,
    pub(crate) collection_of: Vec<ClientTypeId>,
    pub(crate) dictionary_of: Option<ClientTypeId>,
    pub(crate) declarations: TypeDeclarations,
}

impl ClientTypeBuilder {
    fn new(name: &str, kind: ClientTypeKind) -> Self {
        let (namespace, local) = match name.rfind('.') {
            Some(index) if index + 1 < name.len() => {
                (Some(name[..index].to_string()), name[index + 1..].to_string())
            }
            _ => (None, name.to_string()),
        };
        Self {
            name: local,
            namespace,
            kind,
            is_public: true,
            base: None,
            members: Vec::new(),
            collection_of: Vec::new(),
            dictionary_of: None,
            declarations: TypeDeclarations::default(),
        }
    }

    /// A reference type; `name` may be namespace-qualified
    pub fn class(name: &str) -> Self {
        Self::new(name, ClientTypeKind::Class)
    }

    /// A value type with members
    pub fn structure(name: &str) -> Self {
        Self::new(name, ClientTypeKind::Struct)
    }

    /// A fieldless enum
    pub fn enumeration(name: &str) -> Self {
        Self::new(name, ClientTypeKind::Enum)
    }

    /// Hide the type from wire-name resolution
    pub fn internal(mut self) -> Self {
        self.is_public = false;
        self
    }

    /// Derive from `base`
    pub fn base(mut self, base: ClientTypeId) -> Self {
        self.base = Some(base);
        self
    }

    /// Declare a member
    pub fn member(mut self, member: ClientMember) -> Self {
        self.members.push(member);
        self
    }

    /// Implement the collection capability over `element`
    pub fn collection_of(mut self, element: ClientTypeId) -> Self {
        self.collection_of.push(element);
        self
    }

    /// Expose a string-keyed indexer over `value`
    pub fn dictionary_of(mut self, value: ClientTypeId) -> Self {
        self.dictionary_of = Some(value);
        self
    }

    /// Declare the key members explicitly
    pub fn key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declarations.key = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Mark the type as an entity
    pub fn entity(mut self) -> Self {
        self.declarations.entity = true;
        self
    }

    /// Declare the member holding the media resource
    pub fn media_entry(mut self, member: &str) -> Self {
        self.declarations.media_entry = Some(member.to_string());
        self
    }

    /// Mark the type as carrying a default stream
    pub fn has_stream(mut self) -> Self {
        self.declarations.has_stream = true;
        self
    }

    /// Pair a data member with the member holding its mime type
    pub fn mime_type(mut self, data_member: &str, mime_type_member: &str) -> Self {
        self.declarations.mime_type = Some(MimeTypeDeclaration {
            data_member: data_member.to_string(),
            mime_type_member: mime_type_member.to_string(),
        });
        self
    }

    /// Name the service uses for this type
    pub fn original_name(mut self, name: &str) -> Self {
        self.declarations.original_name = Some(name.to_string());
        self
    }

    pub(crate) fn finish(self, id: ClientTypeId) -> ClientType {
        ClientType {
            id,
            name: self.name,
            namespace: self.namespace,
            kind: self.kind,
            is_public: self.is_public,
            base: self.base,
            members: self.members,
            collection_of: self.collection_of,
            dictionary_of: self.dictionary_of,
            declarations: self.declarations,
        }
    }
}
