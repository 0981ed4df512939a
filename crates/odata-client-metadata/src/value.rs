//! Dynamic values crossing the accessor boundary
//!
//! Readers and writers above this layer move property values around as
//! [`ClientValue`]s. Compiled accessors convert between these and the
//! concrete Rust field types through the [`ClientData`] trait.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared reference to an application object (entity, complex value, ...)
///
/// Equality is identity: two references are equal when they point at the
/// same allocation, which is what entity collections compare by.
#[derive(Clone)]
pub struct ObjectRef {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wrap a shared application object
    pub fn new<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: value,
        }
    }

    /// Rust type name of the referenced object
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the typed reference
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {:p})", self.type_name, Arc::as_ptr(&self.inner))
    }
}

/// A property value in transit between the wire layer and application objects
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClientValue {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Unsigned byte
    Byte(u8),
    /// 16-bit integer
    Int16(i16),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// Single-precision float
    Single(f32),
    /// Double-precision float
    Double(f64),
    /// Text
    String(String),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Enum member by name
    Enum(String),
    /// Shared application object
    Object(ObjectRef),
    /// Collection of values
    Collection(Vec<ClientValue>),
    /// String-keyed map of values (dictionary members)
    Map(BTreeMap<String, ClientValue>),
}

impl ClientValue {
    /// Wrap a shared application object
    pub fn object<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        ClientValue::Object(ObjectRef::new(value))
    }

    /// Whether this is [`ClientValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, ClientValue::Null)
    }

    /// Runtime type name used in diagnostics
    pub fn runtime_type_name(&self) -> String {
        match self {
            ClientValue::Null => "null".to_string(),
            ClientValue::Bool(_) => "bool".to_string(),
            ClientValue::Byte(_) => "u8".to_string(),
            ClientValue::Int16(_) => "i16".to_string(),
            ClientValue::Int32(_) => "i32".to_string(),
            ClientValue::Int64(_) => "i64".to_string(),
            ClientValue::Single(_) => "f32".to_string(),
            ClientValue::Double(_) => "f64".to_string(),
            ClientValue::String(_) => "String".to_string(),
            ClientValue::Binary(_) => "Vec<u8>".to_string(),
            ClientValue::Enum(member) => format!("enum member '{}'", member),
            ClientValue::Object(object) => object.type_name().to_string(),
            ClientValue::Collection(_) => "collection".to_string(),
            ClientValue::Map(_) => "map".to_string(),
        }
    }
}

/// Conversion between Rust field types and [`ClientValue`]
///
/// On a failed conversion the original value is handed back so the caller
/// can report its runtime type.
pub trait ClientData: Sized + Send + Sync + 'static {
    /// Produce the dynamic representation of `self`
    fn to_client_value(&self) -> ClientValue;

    /// Convert a dynamic value back into `Self`
    fn from_client_value(value: ClientValue) -> Result<Self, ClientValue>;
}

macro_rules! impl_client_data {
    ($ty:ty, $variant:ident) => {
        impl ClientData for $ty {
            fn to_client_value(&self) -> ClientValue {
                ClientValue::$variant(self.clone())
            }

            fn from_client_value(value: ClientValue) -> Result<Self, ClientValue> {
                match value {
                    ClientValue::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }
    };
}

impl_client_data!(bool, Bool);
impl_client_data!(u8, Byte);
impl_client_data!(i16, Int16);
impl_client_data!(i32, Int32);
impl_client_data!(i64, Int64);
impl_client_data!(f32, Single);
impl_client_data!(f64, Double);
impl_client_data!(String, String);
impl_client_data!(Vec<u8>, Binary);

impl ClientData for ClientValue {
    fn to_client_value(&self) -> ClientValue {
        self.clone()
    }

    fn from_client_value(value: ClientValue) -> Result<Self, ClientValue> {
        Ok(value)
    }
}

impl<T: ClientData> ClientData for Option<T> {
    fn to_client_value(&self) -> ClientValue {
        match self {
            Some(inner) => inner.to_client_value(),
            None => ClientValue::Null,
        }
    }

    fn from_client_value(value: ClientValue) -> Result<Self, ClientValue> {
        match value {
            ClientValue::Null => Ok(None),
            other => T::from_client_value(other).map(Some),
        }
    }
}

impl<T: Any + Send + Sync> ClientData for Arc<T> {
    fn to_client_value(&self) -> ClientValue {
        ClientValue::Object(ObjectRef::new(self.clone()))
    }

    fn from_client_value(value: ClientValue) -> Result<Self, ClientValue> {
        match value {
            ClientValue::Object(object) => match object.downcast::<T>() {
                Some(typed) => Ok(typed),
                None => Err(ClientValue::Object(object)),
            },
            other => Err(other),
        }
    }
}
