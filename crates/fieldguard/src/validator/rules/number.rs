use std::borrow::Cow;
use std::fmt;

use crate::helper::Helper;
use crate::structure::Structure;
use crate::violation::Violation;

use super::{FieldRules, Holder, Number};

const REQUIRED: &str = "validation:number:required";
const ANY_OF: &str = "validation:number:any_of";
const ANY_OF_INTERVAL: &str = "validation:number:any_of_interval";
const MIN: &str = "validation:number:min";
const MAX: &str = "validation:number:max";

/// Rules for integer and floating point fields of any width.
pub struct NumberRules<T, F> {
    core: FieldRules<T, F>,
}

impl<T, F> fmt::Debug for NumberRules<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberRules").finish_non_exhaustive()
    }
}

impl<T, F> NumberRules<T, F>
where
    T: Structure,
    F: Holder,
    F::Item: Number,
{
    pub(crate) fn new(core: FieldRules<T, F>) -> Self {
        Self { core }
    }

    /// Fail on `0`, `None`, `Some(0)` or an empty vector.
    pub fn required(&self) -> &Self {
        self.core.required(REQUIRED);
        self
    }

    /// Fail unless the value equals one of `allowed`.
    pub fn any_of(&self, allowed: impl IntoIterator<Item = F::Item>) -> &Self {
        self.core.any_of(ANY_OF, allowed.into_iter().collect());
        self
    }

    /// Fail unless `begin < value < end`. Both bounds are excluded.
    pub fn any_of_interval(&self, begin: F::Item, end: F::Item) -> &Self {
        self.core.check_items(
            Cow::Borrowed(ANY_OF_INTERVAL),
            vec![begin.to_string(), end.to_string()],
            move |v| begin < *v && *v < end,
        );
        self
    }

    /// Fail unless `value >= min`.
    pub fn min(&self, min: F::Item) -> &Self {
        self.core
            .check_items(Cow::Borrowed(MIN), vec![min.to_string()], move |v| *v >= min);
        self
    }

    /// Fail unless `value <= max`.
    pub fn max(&self, max: F::Item) -> &Self {
        self.core
            .check_items(Cow::Borrowed(MAX), vec![max.to_string()], move |v| *v <= max);
        self
    }

    /// Run caller logic over the value. Skipped when the field is absent.
    pub fn custom<C>(&self, check: C) -> &Self
    where
        C: Fn(&Helper<'_>, &F::Target) -> Vec<Violation> + Send + Sync + 'static,
    {
        self.core.custom(check);
        self
    }

    /// Rules registered through the returned value only run while
    /// `predicate` holds.
    #[must_use]
    pub fn when<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            core: self.core.when(predicate),
        }
    }
}
