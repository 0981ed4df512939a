//! The loaded application type universe
//!
//! An append-only arena of [`ClientType`]s. Built-in primitive and
//! stream-link types are registered up front; nullable, array, list and
//! map shapes are registered on first request and reused afterwards.
//! Handles can be reserved before the type is defined so that types which
//! refer to each other can be registered.

use std::sync::Arc;

use odata_edm::EdmPrimitiveKind;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::error::{MetadataError, MetadataResult};

use super::client_type::{ClientType, ClientTypeBuilder, ClientTypeId, ClientTypeKind, TypeDeclarations};

/// Built-in primitives; the position of each entry is its handle
const PRIMITIVES: [(EdmPrimitiveKind, &str); 19] = [
    (EdmPrimitiveKind::Boolean, "bool"),
    (EdmPrimitiveKind::Byte, "u8"),
    (EdmPrimitiveKind::SByte, "i8"),
    (EdmPrimitiveKind::Int16, "i16"),
    (EdmPrimitiveKind::Int32, "i32"),
    (EdmPrimitiveKind::Int64, "i64"),
    (EdmPrimitiveKind::Single, "f32"),
    (EdmPrimitiveKind::Double, "f64"),
    (EdmPrimitiveKind::Decimal, "Decimal"),
    (EdmPrimitiveKind::String, "String"),
    (EdmPrimitiveKind::Binary, "Vec<u8>"),
    (EdmPrimitiveKind::Guid, "Guid"),
    (EdmPrimitiveKind::Date, "Date"),
    (EdmPrimitiveKind::DateTimeOffset, "DateTimeOffset"),
    (EdmPrimitiveKind::TimeOfDay, "TimeOfDay"),
    (EdmPrimitiveKind::Duration, "Duration"),
    (EdmPrimitiveKind::Stream, "Stream"),
    (EdmPrimitiveKind::Geography, "Geography"),
    (EdmPrimitiveKind::Geometry, "Geometry"),
];

fn primitive_slot(kind: EdmPrimitiveKind) -> u32 {
    match kind {
        EdmPrimitiveKind::Boolean => 0,
        EdmPrimitiveKind::Byte => 1,
        EdmPrimitiveKind::SByte => 2,
        EdmPrimitiveKind::Int16 => 3,
        EdmPrimitiveKind::Int32 => 4,
        EdmPrimitiveKind::Int64 => 5,
        EdmPrimitiveKind::Single => 6,
        EdmPrimitiveKind::Double => 7,
        EdmPrimitiveKind::Decimal => 8,
        EdmPrimitiveKind::String => 9,
        EdmPrimitiveKind::Binary => 10,
        EdmPrimitiveKind::Guid => 11,
        EdmPrimitiveKind::Date => 12,
        EdmPrimitiveKind::DateTimeOffset => 13,
        EdmPrimitiveKind::TimeOfDay => 14,
        EdmPrimitiveKind::Duration => 15,
        EdmPrimitiveKind::Stream => 16,
        EdmPrimitiveKind::Geography => 17,
        EdmPrimitiveKind::Geometry => 18,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Shape {
    Nullable(ClientTypeId),
    Array(ClientTypeId),
    List(ClientTypeId),
    Map(ClientTypeId),
}

/// Registry of every application type the client can bind
#[derive(Debug)]
pub struct TypeUniverse {
    /// `None` marks a reserved but not yet defined slot
    types: RwLock<Vec<Option<Arc<ClientType>>>>,
    stream_link: ClientTypeId,
    shapes: Mutex<FxHashMap<Shape, ClientTypeId>>,
}

fn builtin(id: ClientTypeId, name: &str, kind: ClientTypeKind) -> ClientType {
    ClientType {
        id,
        name: name.to_string(),
        namespace: None,
        kind,
        is_public: true,
        base: None,
        members: Vec::new(),
        collection_of: Vec::new(),
        dictionary_of: None,
        declarations: TypeDeclarations::default(),
    }
}

impl TypeUniverse {
    /// Create a universe holding only the built-in types
    pub fn new() -> Self {
        let mut types = Vec::with_capacity(PRIMITIVES.len() + 1);
        for (kind, name) in PRIMITIVES {
            let id = ClientTypeId(primitive_slot(kind));
            types.push(Some(Arc::new(builtin(id, name, ClientTypeKind::Primitive(kind)))));
        }

        let stream_link = ClientTypeId(types.len() as u32);
        types.push(Some(Arc::new(builtin(
            stream_link,
            "StreamLink",
            ClientTypeKind::StreamLink,
        ))));

        Self {
            types: RwLock::new(types),
            stream_link,
            shapes: Mutex::new(FxHashMap::default()),
        }
    }

    /// Handle of a built-in primitive type
    pub fn primitive(&self, kind: EdmPrimitiveKind) -> ClientTypeId {
        ClientTypeId(primitive_slot(kind))
    }

    /// Handle of the stream-link type
    pub fn stream_link(&self) -> ClientTypeId {
        self.stream_link
    }

    /// Reserve a handle to be defined later with [`define`](Self::define)
    pub fn reserve(&self) -> ClientTypeId {
        let mut types = self.types.write();
        let id = ClientTypeId(types.len() as u32);
        types.push(None);
        id
    }

    /// Define a previously reserved handle
    pub fn define(&self, id: ClientTypeId, builder: ClientTypeBuilder) -> MetadataResult<()> {
        let mut types = self.types.write();
        match types.get_mut(id.index()) {
            Some(slot @ None) => {
                *slot = Some(Arc::new(builder.finish(id)));
                Ok(())
            }
            _ => Err(MetadataError::UnknownClientType { id: id.raw() }),
        }
    }

    /// Register a type that does not need a forward reference
    pub fn register(&self, builder: ClientTypeBuilder) -> ClientTypeId {
        let mut types = self.types.write();
        let id = ClientTypeId(types.len() as u32);
        types.push(Some(Arc::new(builder.finish(id))));
        id
    }

    /// Register a pointer-shaped type (never accessible as a property)
    pub fn pointer(&self, name: &str) -> ClientTypeId {
        self.push_builtin(name, ClientTypeKind::Pointer, |_| {})
    }

    /// `Option<inner>`
    pub fn nullable(&self, inner: ClientTypeId) -> MetadataResult<ClientTypeId> {
        let inner_ty = self.get(inner)?;
        if inner_ty.nullable_underlying().is_some() {
            return Ok(inner);
        }
        let name = format!("Option<{}>", inner_ty.full_name());
        Ok(self.shape(Shape::Nullable(inner), &name, ClientTypeKind::Nullable(inner), |_| {}))
    }

    /// A fixed array of `element`
    pub fn array_of(&self, element: ClientTypeId) -> MetadataResult<ClientTypeId> {
        let name = format!("[{}]", self.get(element)?.full_name());
        Ok(self.shape(Shape::Array(element), &name, ClientTypeKind::Array(element), |_| {}))
    }

    /// `Vec<element>`: a class implementing the collection capability
    pub fn list_of(&self, element: ClientTypeId) -> MetadataResult<ClientTypeId> {
        let name = format!("Vec<{}>", self.get(element)?.full_name());
        Ok(self.shape(Shape::List(element), &name, ClientTypeKind::Class, |ty| {
            ty.collection_of.push(element)
        }))
    }

    /// `BTreeMap<String, value>`: a class with a string-keyed indexer
    pub fn map_of(&self, value: ClientTypeId) -> MetadataResult<ClientTypeId> {
        let name = format!("BTreeMap<String, {}>", self.get(value)?.full_name());
        Ok(self.shape(Shape::Map(value), &name, ClientTypeKind::Class, |ty| {
            ty.dictionary_of = Some(value)
        }))
    }

    fn shape(
        &self,
        shape: Shape,
        name: &str,
        kind: ClientTypeKind,
        configure: impl FnOnce(&mut ClientType),
    ) -> ClientTypeId {
        let mut shapes = self.shapes.lock();
        if let Some(id) = shapes.get(&shape) {
            return *id;
        }
        let id = self.push_builtin(name, kind, configure);
        shapes.insert(shape, id);
        id
    }

    fn push_builtin(
        &self,
        name: &str,
        kind: ClientTypeKind,
        configure: impl FnOnce(&mut ClientType),
    ) -> ClientTypeId {
        let mut types = self.types.write();
        let id = ClientTypeId(types.len() as u32);
        let mut ty = builtin(id, name, kind);
        configure(&mut ty);
        types.push(Some(Arc::new(ty)));
        id
    }

    /// Look up a defined type
    pub fn get(&self, id: ClientTypeId) -> MetadataResult<Arc<ClientType>> {
        self.types
            .read()
            .get(id.index())
            .and_then(Clone::clone)
            .ok_or(MetadataError::UnknownClientType { id: id.raw() })
    }

    /// Every defined type, taken without holding the lock afterwards
    pub fn snapshot(&self) -> Vec<Arc<ClientType>> {
        self.types.read().iter().flatten().cloned().collect()
    }

    /// Number of registered handles, reserved ones included
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether the universe holds no handles (never true after `new`)
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// The type followed by its ancestors, most-derived first
    pub fn base_chain(&self, id: ClientTypeId) -> MetadataResult<Vec<Arc<ClientType>>> {
        let mut chain: Vec<Arc<ClientType>> = Vec::new();
        let mut current = Some(id);
        while let Some(ty_id) = current {
            // a malformed chain that loops back ends the walk
            if chain.iter().any(|seen| seen.id == ty_id) {
                break;
            }
            let ty = self.get(ty_id)?;
            current = ty.base;
            chain.push(ty);
        }
        Ok(chain)
    }

    /// Whether a value of `candidate` can stand where `expected` is required
    pub fn is_assignable_from(&self, expected: ClientTypeId, candidate: ClientTypeId) -> bool {
        self.base_chain(candidate)
            .map(|chain| chain.iter().any(|ty| ty.id == expected))
            .unwrap_or(false)
    }

    /// Strip one `Option<_>` layer
    pub fn non_nullable(&self, id: ClientTypeId) -> MetadataResult<ClientTypeId> {
        Ok(self.get(id)?.nullable_underlying().unwrap_or(id))
    }
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}
