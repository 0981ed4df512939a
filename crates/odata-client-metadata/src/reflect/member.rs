//! Application members and their typed access hooks
//!
//! A [`ClientMember`] is built from plain Rust closures and field
//! projections. Each hook is type-erased once, here, into a small stored
//! callable over `dyn Any`; property metadata later picks the hooks that
//! apply to the member's classification.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{MetadataError, MetadataResult};
use crate::value::{ClientData, ClientValue};

use super::client_type::ClientTypeId;

/// Reads a member from an instance
pub type GetFn = Arc<dyn Fn(&dyn Any) -> MetadataResult<ClientValue> + Send + Sync>;

/// Writes a member on an instance
pub type SetFn = Arc<dyn Fn(&mut dyn Any, ClientValue) -> MetadataResult<()> + Send + Sync>;

/// Writes one entry of a string-keyed dictionary member
pub type DictionarySetFn =
    Arc<dyn Fn(&mut dyn Any, &str, ClientValue) -> MetadataResult<()> + Send + Sync>;

/// Adds a value to a collection member
pub type CollectionAddFn = Arc<dyn Fn(&mut dyn Any, ClientValue) -> MetadataResult<()> + Send + Sync>;

/// Removes a value from a collection member, reporting whether it was present
pub type CollectionRemoveFn =
    Arc<dyn Fn(&mut dyn Any, &ClientValue) -> MetadataResult<bool> + Send + Sync>;

/// Tests a collection member for a value
pub type CollectionContainsFn =
    Arc<dyn Fn(&dyn Any, &ClientValue) -> MetadataResult<bool> + Send + Sync>;

/// Empties a collection member
pub type CollectionClearFn = Arc<dyn Fn(&mut dyn Any) -> MetadataResult<()> + Send + Sync>;

/// The four collection operations, always provided together
#[derive(Clone)]
pub struct CollectionOps {
    /// Append a value
    pub add: CollectionAddFn,
    /// Remove the first equal value
    pub remove: CollectionRemoveFn,
    /// Membership test
    pub contains: CollectionContainsFn,
    /// Remove every value
    pub clear: CollectionClearFn,
}

#[derive(Clone, Default)]
pub(crate) struct MemberHooks {
    pub(crate) get: Option<GetFn>,
    pub(crate) set: Option<SetFn>,
    pub(crate) dictionary_set: Option<DictionarySetFn>,
    pub(crate) collection: Option<CollectionOps>,
}

/// A property-like member of an application type
#[derive(Clone)]
pub struct ClientMember {
    name: String,
    declared_type: ClientTypeId,
    original_name: Option<String>,
    ignored: bool,
    pub(crate) hooks: MemberHooks,
}

fn downcast_ref<'a, T: Any>(instance: &'a dyn Any, property: &str) -> MetadataResult<&'a T> {
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| MetadataError::InstanceTypeMismatch {
            property: property.to_string(),
            expected: type_name::<T>(),
        })
}

fn downcast_mut<'a, T: Any>(instance: &'a mut dyn Any, property: &str) -> MetadataResult<&'a mut T> {
    instance
        .downcast_mut::<T>()
        .ok_or_else(|| MetadataError::InstanceTypeMismatch {
            property: property.to_string(),
            expected: type_name::<T>(),
        })
}

fn convert<V: ClientData>(value: ClientValue, property: &str) -> MetadataResult<V> {
    V::from_client_value(value).map_err(|rejected| MetadataError::ValueTypeMismatch {
        property: property.to_string(),
        expected: type_name::<V>(),
        actual: rejected.runtime_type_name(),
    })
}

impl ClientMember {
    /// A member named `name` whose declared type is `declared_type`
    pub fn new(name: &str, declared_type: ClientTypeId) -> Self {
        Self {
            name: name.to_string(),
            declared_type,
            original_name: None,
            ignored: false,
            hooks: MemberHooks::default(),
        }
    }

    /// Member name in the application
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn declared_type(&self) -> ClientTypeId {
        self.declared_type
    }

    /// Name the service uses for this member, when renamed
    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    /// Whether the member is excluded from serialization
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Whether the member can be read
    pub fn is_readable(&self) -> bool {
        self.hooks.get.is_some()
    }

    /// Whether the member can be assigned
    pub fn is_writable(&self) -> bool {
        self.hooks.set.is_some()
    }

    /// Record the name the service uses for this member
    pub fn renamed_from(mut self, original: &str) -> Self {
        self.original_name = Some(original.to_string());
        self
    }

    /// Exclude the member from serialization
    pub fn ignore(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Install a read accessor
    pub fn getter<T, V, F>(mut self, get: F) -> Self
    where
        T: Any,
        V: ClientData,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let property = self.name.clone();
        self.hooks.get = Some(Arc::new(move |instance: &dyn Any| {
            let typed = downcast_ref::<T>(instance, &property)?;
            Ok(get(typed).to_client_value())
        }));
        self
    }

    /// Install a write accessor
    pub fn setter<T, V, F>(mut self, set: F) -> Self
    where
        T: Any,
        V: ClientData,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let property = self.name.clone();
        self.hooks.set = Some(Arc::new(move |instance: &mut dyn Any, value: ClientValue| {
            let typed = downcast_mut::<T>(instance, &property)?;
            let value = convert::<V>(value, &property)?;
            set(typed, value);
            Ok(())
        }));
        self
    }

    /// Install read and write accessors over a plain field
    pub fn field<T, V>(self, get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self
    where
        T: Any,
        V: ClientData + Clone,
    {
        self.getter(move |instance: &T| get(instance).clone())
            .setter(move |instance: &mut T, value: V| *get_mut(instance) = value)
    }

    /// Read-only accessor over a plain field
    pub fn read_only<T, V>(self, get: fn(&T) -> &V) -> Self
    where
        T: Any,
        V: ClientData + Clone,
    {
        self.getter(move |instance: &T| get(instance).clone())
    }

    /// Install collection operations over a `Vec` field
    ///
    /// Also installs whole-value read/write accessors when none exist yet.
    /// Membership compares dynamic values, so shared objects compare by
    /// identity.
    pub fn collection<T, V>(mut self, items: fn(&T) -> &Vec<V>, items_mut: fn(&mut T) -> &mut Vec<V>) -> Self
    where
        T: Any,
        V: ClientData,
    {
        let property: Arc<str> = Arc::from(self.name.as_str());

        let add: CollectionAddFn = {
            let property = property.clone();
            Arc::new(move |instance: &mut dyn Any, value: ClientValue| {
                let typed = downcast_mut::<T>(instance, &property)?;
                let value = convert::<V>(value, &property)?;
                items_mut(typed).push(value);
                Ok(())
            })
        };
        let remove: CollectionRemoveFn = {
            let property = property.clone();
            Arc::new(move |instance: &mut dyn Any, value: &ClientValue| {
                let list = items_mut(downcast_mut::<T>(instance, &property)?);
                match list.iter().position(|item| item.to_client_value() == *value) {
                    Some(index) => {
                        list.remove(index);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            })
        };
        let contains: CollectionContainsFn = {
            let property = property.clone();
            Arc::new(move |instance: &dyn Any, value: &ClientValue| {
                let list = items(downcast_ref::<T>(instance, &property)?);
                Ok(list.iter().any(|item| item.to_client_value() == *value))
            })
        };
        let clear: CollectionClearFn = {
            let property = property.clone();
            Arc::new(move |instance: &mut dyn Any| {
                items_mut(downcast_mut::<T>(instance, &property)?).clear();
                Ok(())
            })
        };
        self.hooks.collection = Some(CollectionOps {
            add,
            remove,
            contains,
            clear,
        });

        if self.hooks.get.is_none() {
            let property = property.clone();
            self.hooks.get = Some(Arc::new(move |instance: &dyn Any| {
                let list = items(downcast_ref::<T>(instance, &property)?);
                Ok(ClientValue::Collection(
                    list.iter().map(ClientData::to_client_value).collect(),
                ))
            }));
        }
        if self.hooks.set.is_none() {
            self.hooks.set = Some(Arc::new(move |instance: &mut dyn Any, value: ClientValue| {
                let typed = downcast_mut::<T>(instance, &property)?;
                let values = match value {
                    ClientValue::Collection(values) => values,
                    ClientValue::Null => Vec::new(),
                    other => {
                        return Err(MetadataError::ValueTypeMismatch {
                            property: property.to_string(),
                            expected: type_name::<Vec<V>>(),
                            actual: other.runtime_type_name(),
                        })
                    }
                };
                let converted = values
                    .into_iter()
                    .map(|value| convert::<V>(value, &property))
                    .collect::<MetadataResult<Vec<V>>>()?;
                *items_mut(typed) = converted;
                Ok(())
            }));
        }
        self
    }

    /// Install a string-keyed indexer over a map field
    ///
    /// Also installs a read accessor returning the whole map when none
    /// exists yet.
    pub fn dictionary<T, V>(
        mut self,
        entries: fn(&T) -> &BTreeMap<String, V>,
        entries_mut: fn(&mut T) -> &mut BTreeMap<String, V>,
    ) -> Self
    where
        T: Any,
        V: ClientData,
    {
        let property: Arc<str> = Arc::from(self.name.as_str());

        {
            let property = property.clone();
            self.hooks.dictionary_set = Some(Arc::new(
                move |instance: &mut dyn Any, key: &str, value: ClientValue| {
                    let typed = downcast_mut::<T>(instance, &property)?;
                    let value = convert::<V>(value, &property)?;
                    entries_mut(typed).insert(key.to_string(), value);
                    Ok(())
                },
            ));
        }

        if self.hooks.get.is_none() {
            self.hooks.get = Some(Arc::new(move |instance: &dyn Any| {
                let map = entries(downcast_ref::<T>(instance, &property)?);
                Ok(ClientValue::Map(
                    map.iter()
                        .map(|(key, value)| (key.clone(), value.to_client_value()))
                        .collect(),
                ))
            }));
        }
        self
    }
}

impl fmt::Debug for ClientMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientMember")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("original_name", &self.original_name)
            .field("ignored", &self.ignored)
            .field("readable", &self.hooks.get.is_some())
            .field("writable", &self.hooks.set.is_some())
            .field("dictionary", &self.hooks.dictionary_set.is_some())
            .field("collection", &self.hooks.collection.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Bag {
        name: String,
        tags: Vec<String>,
        extra: BTreeMap<String, ClientValue>,
    }

    const DUMMY: ClientTypeId = ClientTypeId(0);

    #[test]
    fn test_field_hooks() {
        let member = ClientMember::new("Name", DUMMY).field(|b: &Bag| &b.name, |b: &mut Bag| &mut b.name);
        let mut bag = Bag::default();

        let set = member.hooks.set.clone().unwrap();
        set(&mut bag, ClientValue::String("box".into())).unwrap();
        let get = member.hooks.get.clone().unwrap();
        assert_eq!(get(&bag).unwrap(), ClientValue::String("box".into()));
    }

    #[test]
    fn test_wrong_instance_type() {
        let member = ClientMember::new("Name", DUMMY).field(|b: &Bag| &b.name, |b: &mut Bag| &mut b.name);
        let get = member.hooks.get.clone().unwrap();

        let err = get(&5u32).unwrap_err();
        assert!(matches!(err, MetadataError::InstanceTypeMismatch { .. }));
    }

    #[test]
    fn test_wrong_value_type() {
        let member = ClientMember::new("Name", DUMMY).field(|b: &Bag| &b.name, |b: &mut Bag| &mut b.name);
        let set = member.hooks.set.clone().unwrap();
        let mut bag = Bag::default();

        let err = set(&mut bag, ClientValue::Int32(3)).unwrap_err();
        assert!(matches!(err, MetadataError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn test_collection_hooks() {
        let member =
            ClientMember::new("Tags", DUMMY).collection(|b: &Bag| &b.tags, |b: &mut Bag| &mut b.tags);
        let ops = member.hooks.collection.clone().unwrap();
        let mut bag = Bag::default();
        let red = ClientValue::String("red".into());

        (ops.add)(&mut bag, red.clone()).unwrap();
        assert!((ops.contains)(&bag, &red).unwrap());
        assert!((ops.remove)(&mut bag, &red).unwrap());
        assert!(!(ops.remove)(&mut bag, &red).unwrap());

        (ops.add)(&mut bag, red.clone()).unwrap();
        (ops.clear)(&mut bag).unwrap();
        assert!(bag.tags.is_empty());
        assert!(member.is_readable());
        assert!(member.is_writable());
    }

    #[test]
    fn test_dictionary_hooks() {
        let member = ClientMember::new("Extra", DUMMY)
            .dictionary(|b: &Bag| &b.extra, |b: &mut Bag| &mut b.extra);
        let set = member.hooks.dictionary_set.clone().unwrap();
        let mut bag = Bag::default();

        set(&mut bag, "Color", ClientValue::String("blue".into())).unwrap();
        assert_eq!(bag.extra.get("Color"), Some(&ClientValue::String("blue".into())));
        assert!(member.is_readable());
        assert!(!member.is_writable());
    }
}
