use std::any::{TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::FieldNaming;
use crate::error::ConfigError;
use crate::helper::Helper;
use crate::structure::Structure;
use crate::violation::Violation;

use super::plan::{Plan, PlanEntry};
use super::resolve::{FieldDescriptor, resolve};
use super::rules::{FieldRules, Holder, Number, NumberRules, StringRules, UuidRules};

/// A compiled rule over the whole owner instance.
pub(crate) type RuleFn<T> = Arc<dyn Fn(&mut T, &Helper<'_>) -> Vec<Violation> + Send + Sync>;

/// Validate-time condition over the owner instance.
pub(crate) type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Where configurators send their rules. Gating wraps it.
pub(crate) type Append<T> = Rc<dyn Fn(&Arc<FieldDescriptor>, RuleFn<T>)>;

pub(crate) fn rule_fn<T, R>(rule: R) -> RuleFn<T>
where
    R: Fn(&mut T, &Helper<'_>) -> Vec<Violation> + Send + Sync + 'static,
{
    Arc::new(rule)
}

fn gate<T: 'static>(predicate: Predicate<T>, rule: RuleFn<T>) -> RuleFn<T> {
    rule_fn(move |instance: &mut T, helper| {
        if predicate(instance) {
            rule(instance, helper)
        } else {
            Vec::new()
        }
    })
}

/// An append continuation that only lets rules run when `predicate` holds.
pub(crate) fn gated<T: 'static>(inner: &Append<T>, predicate: Predicate<T>) -> Append<T> {
    let inner = Rc::clone(inner);
    Rc::new(move |descriptor: &Arc<FieldDescriptor>, rule: RuleFn<T>| {
        inner(descriptor, gate(Arc::clone(&predicate), rule));
    })
}

struct Bucket<T> {
    descriptor: Arc<FieldDescriptor>,
    rules: Vec<RuleFn<T>>,
}

struct State<T> {
    descriptors: HashMap<(usize, TypeId), Arc<FieldDescriptor>>,
    buckets: Vec<Bucket<T>>,
    error: Option<ConfigError>,
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self {
            descriptors: HashMap::new(),
            buckets: Vec::new(),
            error: None,
        }
    }
}

/// Rules collected during one configure pass, grouped per field in
/// first-registration order.
pub(crate) struct Registration<T> {
    state: RefCell<State<T>>,
}

impl<T> Default for Registration<T> {
    fn default() -> Self {
        Self {
            state: RefCell::new(State::default()),
        }
    }
}

impl<T: Structure> Registration<T> {
    /// Resolve `field` once per pass. `None` once the pass has failed.
    fn descriptor<F: 'static>(
        &self,
        template: &T,
        field: &F,
        item_type_name: &'static str,
    ) -> Option<Arc<FieldDescriptor>> {
        let mut state = self.state.borrow_mut();
        if state.error.is_some() {
            return None;
        }

        let key = (std::ptr::from_ref(field).addr(), TypeId::of::<F>());
        if let Some(descriptor) = state.descriptors.get(&key) {
            return Some(Arc::clone(descriptor));
        }

        match resolve(template, field, item_type_name) {
            Ok(descriptor) => {
                let descriptor = Arc::new(descriptor);
                state.descriptors.insert(key, Arc::clone(&descriptor));
                Some(descriptor)
            }
            Err(err) => {
                state.error = Some(err);
                None
            }
        }
    }

    /// Record a configuration error. Only the first one is kept.
    pub(crate) fn fail(&self, err: ConfigError) {
        let mut state = self.state.borrow_mut();
        if state.error.is_none() {
            state.error = Some(err);
        }
    }

    fn append(&self, descriptor: &Arc<FieldDescriptor>, rule: RuleFn<T>) {
        let mut state = self.state.borrow_mut();
        if state.error.is_some() {
            return;
        }

        match state
            .buckets
            .iter_mut()
            .find(|b| Arc::ptr_eq(&b.descriptor, descriptor))
        {
            Some(bucket) => bucket.rules.push(rule),
            None => state.buckets.push(Bucket {
                descriptor: Arc::clone(descriptor),
                rules: vec![rule],
            }),
        }
    }

    /// Flatten the buckets into a plan, field by field.
    pub(crate) fn compile(&self, naming: &FieldNaming) -> Result<Plan<T>, ConfigError> {
        let state = self.state.take();
        if let Some(err) = state.error {
            return Err(err);
        }

        let mut entries = Vec::new();
        for bucket in state.buckets {
            let location = naming(bucket.descriptor.path());
            for rule in bucket.rules {
                entries.push(PlanEntry {
                    descriptor: Arc::clone(&bucket.descriptor),
                    location: location.clone(),
                    rule,
                });
            }
        }
        Ok(Plan::new(entries))
    }
}

/// Entry point handed to the configure closure.
///
/// Every method takes a reference to a field of the template passed next
/// to the builder and returns the rule family for that field's kind.
///
/// ```
/// use fieldguard::{Context, Validator};
///
/// #[derive(Default)]
/// struct Login {
///     user: String,
///     attempts: Option<u8>,
/// }
///
/// fieldguard::structure! { Login { user, attempts } }
///
/// let validator = Validator::new();
/// validator.configure::<Login, _>(|v, t| {
///     v.string(&t.user).trim().required().max_len(32);
///     v.number(&t.attempts).max(5);
/// });
///
/// let mut login = Login { user: "  ada ".to_owned(), attempts: Some(9) };
/// let violations = validator.validate(&Context::new(), &mut login);
/// assert_eq!(login.user, "ada");
/// assert_eq!(violations.len(), 1);
/// assert_eq!(violations[0].location(), "attempts");
/// ```
pub struct Builder<'a, T> {
    template: &'a T,
    registration: Rc<Registration<T>>,
    append: Append<T>,
}

impl<T> fmt::Debug for Builder<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("owner", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<'a, T: Structure> Builder<'a, T> {
    pub(crate) fn new(template: &'a T, registration: Rc<Registration<T>>) -> Self {
        let sink = Rc::clone(&registration);
        Self {
            template,
            registration,
            append: Rc::new(move |descriptor: &Arc<FieldDescriptor>, rule: RuleFn<T>| {
                sink.append(descriptor, rule);
            }),
        }
    }

    fn rules<F: Holder>(&self, field: &F) -> FieldRules<T, F> {
        let descriptor =
            self.registration
                .descriptor(self.template, field, type_name::<F::Item>());
        FieldRules::new(
            descriptor,
            Rc::clone(&self.append),
            Rc::clone(&self.registration),
        )
    }

    /// Rules for a string field (`String`, `Option<String>`, `Vec<String>`,
    /// `Vec<Option<String>>`).
    pub fn string<F>(&self, field: &F) -> StringRules<T, F>
    where
        F: Holder<Item = String>,
    {
        StringRules::new(self.rules(field))
    }

    /// Rules for an integer or floating point field, in any holder shape.
    pub fn number<F>(&self, field: &F) -> NumberRules<T, F>
    where
        F: Holder,
        F::Item: Number,
    {
        NumberRules::new(self.rules(field))
    }

    /// Rules for a UUID field, in any holder shape.
    pub fn uuid<F>(&self, field: &F) -> UuidRules<T, F>
    where
        F: Holder<Item = uuid::Uuid>,
    {
        UuidRules::new(self.rules(field))
    }

    /// A builder whose rules only run while `predicate` holds for the
    /// instance being validated.
    #[must_use]
    pub fn when<P>(&self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            template: self.template,
            registration: Rc::clone(&self.registration),
            append: gated(&self.append, Arc::new(predicate)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;

    use super::{Builder, Registration};
    use crate::config::default_naming;
    use crate::context::Context;
    use crate::error::ConfigError;
    use crate::i18n::Catalog;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Account {
        name: String,
        age: u8,
        aliases: Vec<String>,
    }

    crate::structure! { Account { name, age, aliases } }

    fn compile_with<C>(configure: C) -> Result<super::Plan<Account>, ConfigError>
    where
        C: FnOnce(&Builder<'_, Account>, &Account),
    {
        let template = Account::default();
        let registration = Rc::new(Registration::default());
        let builder = Builder::new(&template, Rc::clone(&registration));
        configure(&builder, &template);
        drop(builder);
        registration.compile(&default_naming())
    }

    #[test]
    fn entries_are_grouped_by_field_in_first_registration_order() {
        let plan = compile_with(|v, t| {
            v.number(&t.age).min(18);
            v.string(&t.name).required();
            v.number(&t.age).max(99);
            v.string(&t.aliases).max_len(8);
            v.string(&t.name).max_len(10);
        })
        .expect("valid configuration");

        assert_eq!(plan.field_count(), 3);
        assert_eq!(
            plan.locations(),
            [
                ("age", "u8"),
                ("age", "u8"),
                ("name", "alloc::string::String"),
                ("name", "alloc::string::String"),
                ("aliases", "alloc::string::String"),
            ]
        );
    }

    #[test]
    fn gated_builder_skips_rules_while_predicate_is_false() {
        let plan = compile_with(|v, t| {
            v.when(|a: &Account| a.age >= 18).string(&t.name).required();
        })
        .expect("valid configuration");

        let catalog = Catalog::builtin();
        let mut minor = Account {
            age: 10,
            ..Account::default()
        };
        assert!(plan.execute(&catalog, &Context::new(), &mut minor).is_empty());

        let mut adult = Account {
            age: 30,
            ..Account::default()
        };
        let violations = plan.execute(&catalog, &Context::new(), &mut adult);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location(), "name");
    }

    #[test]
    fn first_error_wins_and_disables_later_rules() {
        let foreign = Account::default();
        let err = compile_with(|v, t| {
            v.string(&t.name).required();
            v.string(&foreign.name).required();
            v.string(&t.name).regexp("(", &[]);
        })
        .map(|_| ())
        .expect_err("foreign field");
        assert!(matches!(err, ConfigError::ForeignField { .. }));
    }

    #[test]
    fn descriptors_are_shared_per_field() {
        let template = Account::default();
        let registration: Rc<Registration<Account>> = Rc::new(Registration::default());
        let first = registration
            .descriptor(&template, &template.name, "String")
            .expect("described");
        let second = registration
            .descriptor(&template, &template.name, "String")
            .expect("described");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
