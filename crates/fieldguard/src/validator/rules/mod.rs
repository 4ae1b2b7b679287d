//! Rule families and the holder shapes they accept.

pub(crate) mod number;
pub(crate) mod string;
pub(crate) mod uuid_rules;

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::helper::Helper;
use crate::structure::Structure;
use crate::violation::{FieldValue, Violation};

use super::builder::{Append, Registration, gated, rule_fn};
use super::resolve::FieldDescriptor;

pub use self::number::NumberRules;
pub use self::string::{PatternOption, StringRules};
pub use self::uuid_rules::UuidRules;

/// A single value rules can inspect.
pub trait Scalar: Clone + PartialEq + fmt::Display + Send + Sync + 'static {
    /// Whether this is the kind's zero value (`""`, `0`, nil UUID).
    fn is_zero(&self) -> bool;

    /// Snapshot for [`Violation::value`].
    fn to_field_value(&self) -> FieldValue;
}

/// Scalars with an order, accepted by [`NumberRules`].
pub trait Number: Scalar + Copy + PartialOrd {}

/// The shape a field stores its items in: the value itself, `Option`,
/// `Vec` or `Vec<Option>`.
pub trait Holder: Send + Sync + 'static {
    /// Item type rules inspect.
    type Item: Scalar;

    /// What custom rules receive: the item for single holders, a slice for
    /// vectors.
    type Target: ?Sized;

    /// Whether `required` fails: zero value, `None` or `Some(zero)`, or an
    /// empty vector.
    fn is_missing(&self) -> bool;

    /// The dereferenced value, `None` when absent.
    fn target(&self) -> Option<&Self::Target>;

    /// First present item satisfying `pred`.
    fn first_item_where(&self, pred: impl FnMut(&Self::Item) -> bool) -> Option<&Self::Item>;

    /// Apply `f` to every present item.
    fn items_mut(&mut self, f: impl FnMut(&mut Self::Item));

    /// Snapshot of the whole field.
    fn snapshot(&self) -> FieldValue;
}

macro_rules! scalar {
    (int: $($ty:ty),*) => {$(
        impl Scalar for $ty {
            fn is_zero(&self) -> bool {
                *self == 0
            }

            fn to_field_value(&self) -> FieldValue {
                FieldValue::from(*self)
            }
        }

        impl Number for $ty {}
    )*};
    (float: $($ty:ty),*) => {$(
        impl Scalar for $ty {
            #[allow(clippy::float_cmp)]
            fn is_zero(&self) -> bool {
                *self == 0.0
            }

            fn to_field_value(&self) -> FieldValue {
                FieldValue::from(*self)
            }
        }

        impl Number for $ty {}
    )*};
}

scalar!(int: i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
scalar!(float: f32, f64);

impl Scalar for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::from(self)
    }
}

impl Scalar for ::uuid::Uuid {
    fn is_zero(&self) -> bool {
        self.is_nil()
    }

    fn to_field_value(&self) -> FieldValue {
        FieldValue::from(*self)
    }
}

macro_rules! holders {
    ($($s:ty),*) => {$(
        impl Holder for $s {
            type Item = $s;
            type Target = $s;

            fn is_missing(&self) -> bool {
                self.is_zero()
            }

            fn target(&self) -> Option<&$s> {
                Some(self)
            }

            fn first_item_where(&self, mut pred: impl FnMut(&$s) -> bool) -> Option<&$s> {
                pred(self).then_some(self)
            }

            fn items_mut(&mut self, mut f: impl FnMut(&mut $s)) {
                f(self);
            }

            fn snapshot(&self) -> FieldValue {
                self.to_field_value()
            }
        }

        impl Holder for Option<$s> {
            type Item = $s;
            type Target = $s;

            fn is_missing(&self) -> bool {
                self.as_ref().is_none_or(Scalar::is_zero)
            }

            fn target(&self) -> Option<&$s> {
                self.as_ref()
            }

            fn first_item_where(&self, mut pred: impl FnMut(&$s) -> bool) -> Option<&$s> {
                self.as_ref().filter(|&v| pred(v))
            }

            fn items_mut(&mut self, mut f: impl FnMut(&mut $s)) {
                if let Some(v) = self.as_mut() {
                    f(v);
                }
            }

            fn snapshot(&self) -> FieldValue {
                self.as_ref().map_or(FieldValue::Null, Scalar::to_field_value)
            }
        }

        impl Holder for Vec<$s> {
            type Item = $s;
            type Target = [$s];

            fn is_missing(&self) -> bool {
                self.is_empty()
            }

            fn target(&self) -> Option<&[$s]> {
                Some(self.as_slice())
            }

            fn first_item_where(&self, mut pred: impl FnMut(&$s) -> bool) -> Option<&$s> {
                self.iter().find(|&v| pred(v))
            }

            fn items_mut(&mut self, f: impl FnMut(&mut $s)) {
                self.iter_mut().for_each(f);
            }

            fn snapshot(&self) -> FieldValue {
                FieldValue::List(self.iter().map(Scalar::to_field_value).collect())
            }
        }

        impl Holder for Vec<Option<$s>> {
            type Item = $s;
            type Target = [Option<$s>];

            fn is_missing(&self) -> bool {
                self.is_empty()
            }

            fn target(&self) -> Option<&[Option<$s>]> {
                Some(self.as_slice())
            }

            fn first_item_where(&self, mut pred: impl FnMut(&$s) -> bool) -> Option<&$s> {
                self.iter().flatten().find(|&v| pred(v))
            }

            fn items_mut(&mut self, f: impl FnMut(&mut $s)) {
                self.iter_mut().flatten().for_each(f);
            }

            fn snapshot(&self) -> FieldValue {
                FieldValue::List(
                    self.iter()
                        .map(|v| v.as_ref().map_or(FieldValue::Null, Scalar::to_field_value))
                        .collect(),
                )
            }
        }
    )*};
}

holders!(
    String,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    ::uuid::Uuid
);

/// State shared by every rule family: the resolved field and where its
/// rules go.
pub(crate) struct FieldRules<T, F> {
    descriptor: Option<Arc<FieldDescriptor>>,
    append: Append<T>,
    registration: Rc<Registration<T>>,
    field: PhantomData<fn() -> F>,
}

impl<T: Structure, F: Holder> FieldRules<T, F> {
    pub(crate) fn new(
        descriptor: Option<Arc<FieldDescriptor>>,
        append: Append<T>,
        registration: Rc<Registration<T>>,
    ) -> Self {
        Self {
            descriptor,
            append,
            registration,
            field: PhantomData,
        }
    }

    /// Rendered path for configuration diagnostics.
    pub(crate) fn path(&self) -> String {
        self.descriptor
            .as_ref()
            .map(|d| d.path().to_string())
            .unwrap_or_default()
    }

    pub(crate) fn fail(&self, err: ConfigError) {
        self.registration.fail(err);
    }

    /// Register a rule over the field. Instances where the field cannot be
    /// reached (absent optional struct on the way) pass.
    pub(crate) fn push<R>(&self, rule: R)
    where
        R: Fn(&Helper<'_>, &mut F) -> Vec<Violation> + Send + Sync + 'static,
    {
        let Some(descriptor) = &self.descriptor else {
            return;
        };
        let access = Arc::clone(descriptor);
        (self.append)(
            descriptor,
            rule_fn(move |instance: &mut T, helper| {
                access
                    .field_mut::<F>(instance)
                    .map_or_else(Vec::new, |field| rule(helper, field))
            }),
        );
    }

    /// Register an item rule: the first present item failing `passes`
    /// produces the only violation.
    pub(crate) fn check_items<P>(&self, key: Cow<'static, str>, args: Vec<String>, passes: P)
    where
        P: Fn(&F::Item) -> bool + Send + Sync + 'static,
    {
        self.push(move |helper, field: &mut F| {
            let Some(bad) = field.first_item_where(|item| !passes(item)) else {
                return Vec::new();
            };
            let args: Vec<&dyn fmt::Display> =
                args.iter().map(|a| a as &dyn fmt::Display).collect();
            vec![helper.violation(bad.to_field_value(), &key, &args)]
        });
    }

    pub(crate) fn required(&self, key: &'static str) {
        self.push(move |helper, field: &mut F| {
            if field.is_missing() {
                vec![helper.violation(field.snapshot(), key, &[])]
            } else {
                Vec::new()
            }
        });
    }

    pub(crate) fn any_of(&self, key: &'static str, allowed: Vec<F::Item>) {
        let listed = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        self.check_items(Cow::Borrowed(key), vec![listed], move |item| {
            allowed.contains(item)
        });
    }

    pub(crate) fn custom<C>(&self, check: C)
    where
        C: Fn(&Helper<'_>, &F::Target) -> Vec<Violation> + Send + Sync + 'static,
    {
        self.push(move |helper, field: &mut F| {
            field
                .target()
                .map_or_else(Vec::new, |target| check(helper, target))
        });
    }

    pub(crate) fn when<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            descriptor: self.descriptor.clone(),
            append: gated(&self.append, Arc::new(predicate)),
            registration: Rc::clone(&self.registration),
            field: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Holder;
    use crate::violation::FieldValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_per_holder_shape() {
        assert!(String::new().is_missing());
        assert!(!"x".to_owned().is_missing());
        assert!(0_i32.is_missing());
        assert!(Option::<u16>::None.is_missing());
        assert!(Some(0_u16).is_missing());
        assert!(!Some(25_u16).is_missing());
        assert!(Vec::<String>::new().is_missing());
        assert!(!vec![String::new()].is_missing());
        assert!(!vec![None::<f64>].is_missing());
        assert!(uuid::Uuid::nil().is_missing());
    }

    #[test]
    fn item_search_skips_absent_elements() {
        let values = vec![None, Some(3_i64), Some(-1)];
        assert_eq!(values.first_item_where(|v| *v < 0), Some(&-1));
        assert_eq!(Some(4_u8).first_item_where(|v| *v > 9), None);

        let mut names = vec![Some(" a ".to_owned()), None];
        names.items_mut(|s| s.push('!'));
        assert_eq!(names, [Some(" a !".to_owned()), None]);
    }

    #[test]
    fn snapshots_keep_absent_elements() {
        assert_eq!(
            vec![Some(1_u32), None].snapshot(),
            FieldValue::List(vec![FieldValue::UInt(1), FieldValue::Null])
        );
        assert_eq!(Option::<String>::None.snapshot(), FieldValue::Null);
        assert_eq!(
            "FTP".to_owned().snapshot(),
            FieldValue::String("FTP".to_owned())
        );
    }
}
