//! Application type reflection
//!
//! The metadata layer never inspects Rust types directly. Applications
//! describe their types to a [`TypeUniverse`] as [`ClientType`]s whose
//! members carry typed accessor hooks, and everything above this module
//! works from those descriptors.

mod client_type;
mod member;
mod universe;

use std::sync::Arc;

use rustc_hash::FxHashSet;

pub use client_type::{
    ClientType, ClientTypeBuilder, ClientTypeId, ClientTypeKind, MimeTypeDeclaration,
    TypeDeclarations,
};
pub use member::{
    ClientMember, CollectionAddFn, CollectionClearFn, CollectionContainsFn, CollectionOps,
    CollectionRemoveFn, DictionarySetFn, GetFn, SetFn,
};
pub use universe::TypeUniverse;

use crate::error::MetadataResult;

/// A member together with the type that declares it
#[derive(Debug, Clone)]
pub struct MemberRef {
    declaring_type: Arc<ClientType>,
    index: usize,
}

impl MemberRef {
    /// Type declaring the member
    pub fn declaring_type(&self) -> &Arc<ClientType> {
        &self.declaring_type
    }

    /// The member itself
    pub fn member(&self) -> &ClientMember {
        // index comes from enumerating `declaring_type.members`
        &self.declaring_type.members[self.index]
    }

    /// Member name
    pub fn name(&self) -> &str {
        self.member().name()
    }
}

/// Whether a member can be bound as a property
///
/// It must be readable, writable unless its type is a reference type, not
/// pointer-shaped, and an array only when the element is a byte.
fn is_accessible(universe: &TypeUniverse, member: &ClientMember) -> MetadataResult<bool> {
    if !member.is_readable() {
        return Ok(false);
    }

    let declared = universe.get(member.declared_type())?;
    if !member.is_writable() && declared.is_value_type() {
        return Ok(false);
    }

    Ok(match declared.kind() {
        ClientTypeKind::Pointer => false,
        ClientTypeKind::Array(element) => matches!(
            universe.get(element)?.kind(),
            ClientTypeKind::Primitive(odata_edm::EdmPrimitiveKind::Byte)
        ),
        _ => true,
    })
}

/// Accessible members of a type
///
/// With `declared_only` only the type's own members are reported.
/// Otherwise the base chain is walked most-derived first and a base member
/// whose name is already taken by a derived member is skipped.
pub fn properties_on_type(
    universe: &TypeUniverse,
    id: ClientTypeId,
    declared_only: bool,
) -> MetadataResult<Vec<MemberRef>> {
    let chain = if declared_only {
        vec![universe.get(id)?]
    } else {
        universe.base_chain(id)?
    };

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut result = Vec::new();
    for ty in chain {
        for (index, member) in ty.members.iter().enumerate() {
            if !seen.insert(member.name().to_string()) {
                continue;
            }
            if is_accessible(universe, member)? {
                result.push(MemberRef {
                    declaring_type: ty.clone(),
                    index,
                });
            }
        }
    }
    Ok(result)
}
