//! Static field tables.
//!
//! Rust has no runtime reflection, so each validated struct lists its
//! fields once through [`Structure`], usually generated by
//! [`structure!`](crate::structure). The table lets the resolver find a
//! field from a plain reference into a template instance and gives the
//! executor an accessor chain that reaches the same field on any instance.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::error::ConfigError;

pub(crate) type ErasedRef = dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync;
pub(crate) type ErasedMut =
    dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync;
type Fill = dyn Fn(&mut dyn Any) -> Result<(), ConfigError> + Send + Sync;

/// A struct whose fields can be targeted by validation rules.
///
/// The `Default` value is used as the configuration template.
pub trait Structure: Default + Send + Sync + 'static {
    /// Describe every field rules may be registered on, plus every nested
    /// struct the resolver should descend into.
    fn members() -> Vec<Member>;
}

/// One entry of a [`Structure`] table.
pub struct Member {
    pub(crate) name: &'static str,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) get: Arc<ErasedRef>,
    pub(crate) get_mut: Arc<ErasedMut>,
    pub(crate) nested: Option<fn() -> Vec<Member>>,
    fill: Option<Arc<Fill>>,
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("nested", &self.nested.is_some())
            .finish_non_exhaustive()
    }
}

impl Member {
    /// A leaf field stored inline in `S`.
    pub fn value<S, F, R, W>(name: &'static str, get: R, get_mut: W) -> Self
    where
        S: 'static,
        F: 'static,
        R: Fn(&S) -> &F + Send + Sync + 'static,
        W: Fn(&mut S) -> &mut F + Send + Sync + 'static,
    {
        Self {
            name: display_name(name),
            type_id: TypeId::of::<F>(),
            type_name: type_name::<F>(),
            get: erase_ref(move |parent| parent.downcast_ref::<S>().map(|s| get(s) as &dyn Any)),
            get_mut: erase_mut(move |parent| {
                parent
                    .downcast_mut::<S>()
                    .map(|s| get_mut(s) as &mut dyn Any)
            }),
            nested: None,
            fill: None,
        }
    }

    /// A nested struct stored inline in `S`. Its own fields become
    /// reachable with this member's name as a path prefix.
    pub fn nested<S, N, R, W>(name: &'static str, get: R, get_mut: W) -> Self
    where
        S: 'static,
        N: Structure,
        R: Fn(&S) -> &N + Send + Sync + 'static,
        W: Fn(&mut S) -> &mut N + Send + Sync + 'static,
    {
        Self {
            nested: Some(N::members),
            ..Self::value(name, get, get_mut)
        }
    }

    /// A nested struct behind an indirection (`Box<N>` or
    /// `Option<Box<N>>`). The zero pass allocates it in the template; at
    /// validate time rules under an absent struct are skipped.
    pub fn optional<S, P, R, W>(name: &'static str, get: R, get_mut: W) -> Self
    where
        S: 'static,
        P: Indirect,
        R: Fn(&S) -> &P + Send + Sync + 'static,
        W: Fn(&mut S) -> &mut P + Send + Sync + 'static,
    {
        let name = display_name(name);
        let access = Arc::new(get_mut);
        let fill_access = Arc::clone(&access);

        Self {
            name,
            type_id: TypeId::of::<P::Target>(),
            type_name: type_name::<P::Target>(),
            get: erase_ref(move |parent| {
                parent
                    .downcast_ref::<S>()
                    .and_then(|s| get(s).target())
                    .map(|n| n as &dyn Any)
            }),
            get_mut: erase_mut(move |parent| {
                parent
                    .downcast_mut::<S>()
                    .and_then(|s| (*access)(s).target_mut())
                    .map(|n| n as &mut dyn Any)
            }),
            nested: Some(<P::Target as Structure>::members),
            fill: Some(Arc::new(move |parent: &mut dyn Any| {
                let s = parent
                    .downcast_mut::<S>()
                    .ok_or(ConfigError::ShapeMismatch {
                        owner: type_name::<S>(),
                        member: name,
                    })?;
                (*fill_access)(s).fill();
                Ok(())
            })),
        }
    }
}

/// Pointer-like holders of a nested [`Structure`].
pub trait Indirect: Send + Sync + 'static {
    /// The nested struct.
    type Target: Structure;

    /// Shared access, `None` when absent.
    fn target(&self) -> Option<&Self::Target>;

    /// Exclusive access, `None` when absent.
    fn target_mut(&mut self) -> Option<&mut Self::Target>;

    /// Allocate a default target if absent.
    fn fill(&mut self);
}

impl<N: Structure> Indirect for Box<N> {
    type Target = N;

    fn target(&self) -> Option<&N> {
        Some(self)
    }

    fn target_mut(&mut self) -> Option<&mut N> {
        Some(self)
    }

    fn fill(&mut self) {}
}

impl<N: Structure> Indirect for Option<Box<N>> {
    type Target = N;

    fn target(&self) -> Option<&N> {
        self.as_deref()
    }

    fn target_mut(&mut self) -> Option<&mut N> {
        self.as_deref_mut()
    }

    fn fill(&mut self) {
        if self.is_none() {
            *self = Some(Box::default());
        }
    }
}

/// Allocate every absent optional nested struct reachable from `value`.
///
/// Self-referential members are left untouched: a member whose type
/// already appears on the current path, root included, is not filled.
///
/// # Errors
///
/// Returns [`ConfigError::ShapeMismatch`] if a table cannot reach one of
/// its own members, which means the `Structure` impl was written for a
/// different type.
pub fn zero<T: Structure>(value: &mut T) -> Result<(), ConfigError> {
    let mut ancestors = vec![TypeId::of::<T>()];
    zero_members(value, &T::members(), type_name::<T>(), &mut ancestors)
}

fn zero_members(
    parent: &mut dyn Any,
    members: &[Member],
    owner: &'static str,
    ancestors: &mut Vec<TypeId>,
) -> Result<(), ConfigError> {
    for member in members {
        let Some(children) = member.nested else {
            continue;
        };
        if ancestors.contains(&member.type_id) {
            continue;
        }
        if let Some(fill) = &member.fill {
            fill(parent)?;
        }

        let child = (member.get_mut)(parent).ok_or(ConfigError::ShapeMismatch {
            owner,
            member: member.name,
        })?;
        ancestors.push(member.type_id);
        let result = zero_members(child, &children(), member.type_name, ancestors);
        ancestors.pop();
        result?;
    }
    Ok(())
}

fn display_name(name: &'static str) -> &'static str {
    name.strip_prefix("r#").unwrap_or(name)
}

fn erase_ref<G>(g: G) -> Arc<ErasedRef>
where
    G: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(g)
}

fn erase_mut<G>(g: G) -> Arc<ErasedMut>
where
    G: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(g)
}

/// Implement [`Structure`] for one or more structs.
///
/// List every field rules will target. Mark inline nested structs with
/// `nested` and boxed ones (`Box<N>`, `Option<Box<N>>`) with `optional`;
/// their own fields must be described by their own `structure!` call.
/// Raw identifiers lose their `r#` prefix in violation locations.
///
/// ```
/// #[derive(Default)]
/// struct Address {
///     city: String,
/// }
///
/// #[derive(Default)]
/// struct Customer {
///     name: String,
///     r#type: String,
///     home: Address,
///     billing: Option<Box<Address>>,
/// }
///
/// fieldguard::structure! {
///     Address { city }
///     Customer { name, r#type, home: nested, billing: optional }
/// }
/// ```
#[macro_export]
macro_rules! structure {
    ($($ty:ident { $($field:ident $(: $shape:ident)?),* $(,)? })*) => {
        $(
            impl $crate::Structure for $ty {
                fn members() -> ::std::vec::Vec<$crate::Member> {
                    ::std::vec![$($crate::__structure_member!($ty, $field $(, $shape)?)),*]
                }
            }
        )*
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __structure_member {
    ($ty:ident, $field:ident) => {
        $crate::Member::value(
            ::core::stringify!($field),
            |s: &$ty| &s.$field,
            |s: &mut $ty| &mut s.$field,
        )
    };
    ($ty:ident, $field:ident, nested) => {
        $crate::Member::nested(
            ::core::stringify!($field),
            |s: &$ty| &s.$field,
            |s: &mut $ty| &mut s.$field,
        )
    };
    ($ty:ident, $field:ident, optional) => {
        $crate::Member::optional(
            ::core::stringify!($field),
            |s: &$ty| &s.$field,
            |s: &mut $ty| &mut s.$field,
        )
    };
}

#[cfg(test)]
mod tests {
    use super::{Structure, zero};

    #[derive(Debug, Default)]
    struct Leaf {
        code: String,
    }

    #[derive(Debug, Default)]
    struct Node {
        label: String,
        leaf: Leaf,
        extra: Option<Box<Leaf>>,
        next: Option<Box<Node>>,
    }

    crate::structure! {
        Leaf { code }
        Node { label, leaf: nested, extra: optional, next: optional }
    }

    #[test]
    fn members_strip_raw_prefix_and_record_types() {
        #[derive(Default)]
        struct Raw {
            r#type: u8,
        }
        crate::structure! { Raw { r#type } }

        let members = Raw::members();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "type");
        assert_eq!(members[0].type_name, "u8");
    }

    #[test]
    fn zero_allocates_optional_structs() {
        let mut node = Node::default();
        zero(&mut node).expect("table matches type");

        assert!(node.extra.is_some());
        assert!(node.next.is_none());
    }

    #[test]
    fn zero_keeps_existing_values() {
        let mut node = Node {
            extra: Some(Box::new(Leaf {
                code: "kept".to_owned(),
            })),
            ..Node::default()
        };
        zero(&mut node).expect("table matches type");
        assert_eq!(node.extra.as_ref().map(|l| l.code.as_str()), Some("kept"));
    }

    #[test]
    fn optional_member_reads_through_the_box() {
        let members = Node::members();
        let extra = members
            .iter()
            .find(|m| m.name == "extra")
            .expect("extra is described");

        let empty = Node::default();
        assert!((extra.get)(&empty).is_none());

        let filled = Node {
            extra: Some(Box::default()),
            ..Node::default()
        };
        let target = (extra.get)(&filled).expect("present");
        assert!(target.downcast_ref::<Leaf>().is_some());
    }
}
