use std::fmt;

use uuid::Uuid;

use crate::helper::Helper;
use crate::structure::Structure;
use crate::violation::Violation;

use super::{FieldRules, Holder};

const REQUIRED: &str = "validation:uuid:required";
const ANY_OF: &str = "validation:uuid:any_of";

/// Rules for [`Uuid`] fields.
pub struct UuidRules<T, F> {
    core: FieldRules<T, F>,
}

impl<T, F> fmt::Debug for UuidRules<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UuidRules").finish_non_exhaustive()
    }
}

impl<T: Structure, F: Holder<Item = Uuid>> UuidRules<T, F> {
    pub(crate) fn new(core: FieldRules<T, F>) -> Self {
        Self { core }
    }

    /// Fail on the nil UUID, `None` or an empty vector.
    pub fn required(&self) -> &Self {
        self.core.required(REQUIRED);
        self
    }

    /// Fail unless the value is one of `allowed`.
    pub fn any_of(&self, allowed: impl IntoIterator<Item = Uuid>) -> &Self {
        self.core.any_of(ANY_OF, allowed.into_iter().collect());
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

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::context::Context;
    use crate::validator::Validator;
    use crate::violation::FieldValue;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Order {
        id: Uuid,
        parent: Option<Uuid>,
        related: Vec<Uuid>,
    }

    crate::structure! { Order { id, parent, related } }

    #[test]
    fn nil_and_absent_fail_required() {
        let validator = Validator::new();
        validator.configure::<Order, _>(|v, t| {
            v.uuid(&t.id).required();
            v.uuid(&t.parent).required();
        });

        let mut order = Order::default();
        let violations = validator.validate(&Context::new(), &mut order);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].value(), &FieldValue::Uuid(Uuid::nil()));
        assert_eq!(violations[1].value(), &FieldValue::Null);

        let mut order = Order {
            id: Uuid::new_v4(),
            parent: Some(Uuid::new_v4()),
            related: Vec::new(),
        };
        assert!(validator.validate(&Context::new(), &mut order).is_empty());
    }

    #[test]
    fn any_of_checks_every_element() {
        let known = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        let validator = Validator::new();
        validator.configure::<Order, _>(|v, t| {
            v.uuid(&t.related).any_of([known]);
        });

        let mut order = Order {
            related: vec![known, stranger],
            ..Order::default()
        };
        let violations = validator.validate(&Context::new(), &mut order);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].value(), &FieldValue::Uuid(stranger));
        assert_eq!(violations[0].message(), format!("must be one of: {known}"));
    }
}
