use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::structure::{ErasedMut, Member, Structure};

/// Struct path of a field, one segment per struct level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<&'static str>);

impl FieldPath {
    /// Path segments from the outermost struct inwards.
    #[must_use]
    pub fn segments(&self) -> &[&'static str] {
        &self.0
    }

    /// The field's own name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.last().copied().unwrap_or_default()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Resolved identity of one field of one struct type.
pub struct FieldDescriptor {
    path: FieldPath,
    type_name: &'static str,
    item_type_name: &'static str,
    chain: Vec<Arc<ErasedMut>>,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("path", &self.path)
            .field("type_name", &self.type_name)
            .field("item_type_name", &self.item_type_name)
            .finish_non_exhaustive()
    }
}

impl FieldDescriptor {
    /// Struct path of the field.
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Declared type, e.g. `Option<u16>`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type the rules inspect after unwrapping options and slices.
    #[must_use]
    pub fn item_type_name(&self) -> &'static str {
        self.item_type_name
    }

    /// The same field on another instance of the owner type.
    ///
    /// `None` when an optional nested struct on the way is absent.
    pub(crate) fn field_mut<'a, F: 'static>(&self, instance: &'a mut dyn Any) -> Option<&'a mut F> {
        let mut current = instance;
        for step in &self.chain {
            current = step(current)?;
        }
        current.downcast_mut::<F>()
    }
}

struct Target {
    address: *const (),
    type_id: TypeId,
}

impl Target {
    fn matches(&self, value: &dyn Any) -> bool {
        std::ptr::addr_eq(value as *const dyn Any, self.address) && value.type_id() == self.type_id
    }
}

/// Find the described field of `template` that `field` points at.
///
/// Matching is by address and type, so the first field of a nested struct
/// is told apart from the struct itself.
pub(crate) fn resolve<T: Structure, F: 'static>(
    template: &T,
    field: &F,
    item_type_name: &'static str,
) -> Result<FieldDescriptor, ConfigError> {
    let target = Target {
        address: std::ptr::from_ref(field).cast(),
        type_id: TypeId::of::<F>(),
    };

    let mut path = Vec::new();
    let mut chain = Vec::new();
    if search(template, &T::members(), &target, &mut path, &mut chain) {
        return Ok(FieldDescriptor {
            path: FieldPath(path),
            type_name: type_name::<F>(),
            item_type_name,
            chain,
        });
    }

    let base = std::ptr::from_ref(template).addr();
    let address = target.address.addr();
    if (base..base + size_of::<T>()).contains(&address) {
        Err(ConfigError::UndescribedField {
            owner: type_name::<T>(),
            field_type: type_name::<F>(),
            offset: address - base,
        })
    } else {
        Err(ConfigError::ForeignField {
            owner: type_name::<T>(),
            field_type: type_name::<F>(),
        })
    }
}

fn search(
    parent: &dyn Any,
    members: &[Member],
    target: &Target,
    path: &mut Vec<&'static str>,
    chain: &mut Vec<Arc<ErasedMut>>,
) -> bool {
    for member in members {
        let Some(value) = (member.get)(parent) else {
            continue;
        };

        path.push(member.name);
        chain.push(Arc::clone(&member.get_mut));

        if target.matches(value) {
            return true;
        }
        if let Some(children) = member.nested {
            if search(value, &children(), target, path, chain) {
                return true;
            }
        }

        path.pop();
        chain.pop();
    }
    false
}
