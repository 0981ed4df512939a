//! Key discovery and name mapping for application types
//!
//! Key members are found by precedence: explicitly declared key names win
//! over a member named `<TypeName>ID`, which wins over a member named
//! exactly `ID`. Names are compared by their server-defined form, so a
//! renamed member is matched by the name the service knows it by.

use tracing::{debug, trace};

use crate::error::{MetadataError, MetadataResult};
use crate::options::UndeclaredPropertyBehavior;
use crate::reflect::{properties_on_type, ClientMember, ClientType, ClientTypeId, MemberRef, TypeUniverse};

/// Precedence of a key candidate, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyKind {
    /// Not a key member
    NotKey,
    /// Named exactly `ID`
    Id,
    /// Named `<DeclaringTypeName>ID`
    TypeNameId,
    /// Listed in an explicit key declaration
    AttributedKey,
}

/// Name the service uses for a member
pub fn server_defined_name(member: &ClientMember) -> &str {
    member.original_name().unwrap_or_else(|| member.name())
}

/// Name the service uses for a type
pub fn server_defined_type_name(ty: &ClientType) -> &str {
    ty.declarations()
        .original_name
        .as_deref()
        .unwrap_or_else(|| ty.name())
}

/// Namespace-qualified name the service uses for a type
pub fn full_server_defined_type_name(ty: &ClientType) -> String {
    match (&ty.declarations().original_name, ty.namespace()) {
        (Some(original), Some(namespace)) => format!("{}.{}", namespace, original),
        (Some(original), None) => original.clone(),
        (None, _) => ty.full_name(),
    }
}

/// Classify one member against the type's key declaration
fn key_kind(member: &MemberRef, declared_keys: Option<&[String]>) -> KeyKind {
    let name = server_defined_name(member.member());

    if declared_keys.is_some_and(|keys| keys.iter().any(|key| key == name)) {
        return KeyKind::AttributedKey;
    }

    if name.ends_with("ID") {
        let type_name = member.declaring_type().name();
        if name.len() == type_name.len() + 2 && name.starts_with(type_name) {
            return KeyKind::TypeNameId;
        }
        if name.len() == 2 {
            return KeyKind::Id;
        }
    }

    KeyKind::NotKey
}

/// Key names declared on the type or inherited from a base
fn declared_keys(universe: &TypeUniverse, id: ClientTypeId) -> MetadataResult<Option<Vec<String>>> {
    Ok(universe
        .base_chain(id)?
        .iter()
        .find_map(|ty| ty.declarations().key.clone()))
}

/// Whether the type or a base carries the entity marker
fn has_entity_marker(universe: &TypeUniverse, id: ClientTypeId) -> MetadataResult<bool> {
    Ok(universe
        .base_chain(id)?
        .iter()
        .any(|ty| ty.declarations().entity || ty.declarations().key.is_some()))
}

/// Whether a key member's type is simple enough to form an identity
fn is_simple_key_type(universe: &TypeUniverse, member: &ClientMember) -> MetadataResult<bool> {
    let declared = universe.get(member.declared_type())?;
    if declared.is_known_primitive() {
        return Ok(true);
    }
    match declared.nullable_underlying() {
        Some(inner) => {
            let inner = universe.get(inner)?;
            Ok(inner.is_known_primitive() || inner.is_enum())
        }
        None => Ok(false),
    }
}

/// Discover the key members of a type
///
/// Returns `None` when the type has no key members and is not marked as an
/// entity, and an empty list for a marked entity without keys.
///
/// The declared-key count check runs only when the *last* member scanned
/// was itself a declared key; a declared key found earlier followed by a
/// non-key member skips it.
pub fn key_members(universe: &TypeUniverse, id: ClientTypeId) -> MetadataResult<Option<Vec<MemberRef>>> {
    let ty = universe.get(id)?;
    let declared = declared_keys(universe, id)?;
    let is_entity = has_entity_marker(universe, id)?;
    let members = properties_on_type(universe, id, false)?;

    let mut keys: Vec<MemberRef> = Vec::new();
    let mut current_kind = KeyKind::NotKey;
    let mut new_kind = KeyKind::NotKey;

    for member in &members {
        new_kind = key_kind(member, declared.as_deref());
        if new_kind == KeyKind::NotKey {
            continue;
        }
        if new_kind > current_kind {
            keys.clear();
            current_kind = new_kind;
            keys.push(member.clone());
        } else if new_kind == current_kind {
            keys.push(member.clone());
        }
    }

    if let Some(order) = &declared {
        if current_kind == KeyKind::AttributedKey {
            keys.sort_by_key(|key| {
                let name = server_defined_name(key.member());
                order.iter().position(|declared| declared == name)
            });
        }
    }

    let mut key_declaring_type: Option<ClientTypeId> = None;
    for key in &keys {
        let declaring = key.declaring_type().id();
        match key_declaring_type {
            None => key_declaring_type = Some(declaring),
            Some(first) if first != declaring => {
                return Err(MetadataError::KeysOnDifferentDeclaredTypes {
                    type_name: ty.full_name(),
                });
            }
            Some(_) => {}
        }

        if !is_simple_key_type(universe, key.member())? {
            return Err(MetadataError::KeysMustBeSimpleTypes {
                property: key.name().to_string(),
                type_name: ty.full_name(),
                property_type: universe.get(key.member().declared_type())?.full_name(),
            });
        }
    }

    if new_kind == KeyKind::AttributedKey {
        if let Some(names) = &declared {
            if keys.len() != names.len() {
                let missing = names
                    .iter()
                    .find(|name| {
                        !members
                            .iter()
                            .any(|member| server_defined_name(member.member()) == name.as_str())
                    })
                    .cloned()
                    .unwrap_or_default();
                return Err(MetadataError::missing_property(ty.full_name(), missing));
            }
        }
    }

    debug!(
        client_type = %ty,
        key_kind = ?current_kind,
        keys = keys.len(),
        is_entity,
        "discovered key members"
    );

    if !keys.is_empty() {
        Ok(Some(keys))
    } else if is_entity {
        Ok(Some(Vec::new()))
    } else {
        Ok(None)
    }
}

/// Whether the type is an entity: it has key members or an entity marker
pub fn is_entity_type(universe: &TypeUniverse, id: ClientTypeId) -> MetadataResult<bool> {
    let ty = universe.get(id)?;
    if !ty.is_structured() {
        return Ok(false);
    }
    Ok(key_members(universe, id)?.is_some())
}

/// Whether the type, or the element type of a collection type, is an entity
pub fn type_or_element_is_entity(universe: &TypeUniverse, id: ClientTypeId) -> MetadataResult<bool> {
    let id = universe.non_nullable(id)?;
    let ty = universe.get(id)?;
    match ty.collection_of() {
        [element] => is_entity_type(universe, universe.non_nullable(*element)?),
        _ => is_entity_type(universe, id),
    }
}

/// Find the member a wire name refers to
///
/// An exact member-name match wins; otherwise the member renamed from
/// `wire_name` is used.
fn find_member(universe: &TypeUniverse, id: ClientTypeId, wire_name: &str) -> MetadataResult<Option<MemberRef>> {
    let members = properties_on_type(universe, id, false)?;
    if let Some(exact) = members.iter().find(|member| member.name() == wire_name) {
        return Ok(Some(exact.clone()));
    }
    let renamed = members
        .into_iter()
        .find(|member| member.member().original_name() == Some(wire_name));
    if let Some(member) = &renamed {
        trace!(wire_name, member = member.name(), "resolved renamed member");
    }
    Ok(renamed)
}

/// Application member name for a wire name, if there is one
pub fn client_field_name(
    universe: &TypeUniverse,
    id: ClientTypeId,
    wire_name: &str,
) -> MetadataResult<Option<String>> {
    Ok(find_member(universe, id, wire_name)?.map(|member| member.name().to_string()))
}

/// Application member for a wire name
///
/// A miss is an error only under
/// [`UndeclaredPropertyBehavior::ThrowException`].
pub fn client_member(
    universe: &TypeUniverse,
    id: ClientTypeId,
    wire_name: &str,
    behavior: UndeclaredPropertyBehavior,
) -> MetadataResult<Option<MemberRef>> {
    match find_member(universe, id, wire_name)? {
        Some(member) => Ok(Some(member)),
        None if behavior == UndeclaredPropertyBehavior::ThrowException => Err(
            MetadataError::missing_property(universe.get(id)?.full_name(), wire_name),
        ),
        None => Ok(None),
    }
}
