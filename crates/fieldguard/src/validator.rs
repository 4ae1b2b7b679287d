use std::any::type_name;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::{FieldNaming, ValidatorOption, default_naming};
use crate::context::Context;
use crate::error::{ConfigError, ValidationError};
use crate::i18n::{Catalog, Translator};
use crate::structure::{Structure, zero};
use crate::violation::Violation;

mod builder;
mod plan;
mod resolve;
pub(crate) mod rules;

pub use builder::Builder;
pub use resolve::{FieldDescriptor, FieldPath};

use builder::Registration;
use plan::PlanStore;

/// Thread-safe store of compiled validation plans, one per struct type.
///
/// Rules are configured once per type, usually at startup, and compiled
/// into an immutable plan. Validation afterwards only takes a short read
/// lock to fetch the plan, so one `Validator` can be shared freely across
/// threads.
pub struct Validator {
    store: PlanStore,
    translator: Arc<dyn Translator>,
    naming: FieldNaming,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

impl Validator {
    /// Create a new `Validator` with the built-in English messages and
    /// dotted field locations.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(&[])
    }

    /// Create a new `Validator` with the given options.
    #[must_use]
    pub fn with_options(options: &[ValidatorOption]) -> Self {
        let mut translator: Arc<dyn Translator> = Arc::new(Catalog::builtin());
        let mut naming = default_naming();

        for opt in options {
            match opt {
                ValidatorOption::Translator(t) => translator = Arc::clone(t),
                ValidatorOption::FieldLocationNaming(n) => naming = Arc::clone(n),
            }
        }

        Self {
            store: PlanStore::default(),
            translator,
            naming,
        }
    }

    /// Register the rules for `T`.
    ///
    /// `configure` receives a [`Builder`] and a zeroed template of `T`;
    /// rules are attached by passing references to the template's fields.
    ///
    /// # Panics
    ///
    /// Panics with the [`ConfigError`] message when a field reference does
    /// not belong to the template, a pattern does not compile, or `T` is
    /// already configured. Use [`Validator::try_configure`] to handle these
    /// instead.
    pub fn configure<T, C>(&self, configure: C)
    where
        T: Structure,
        C: FnOnce(&Builder<'_, T>, &T),
    {
        if let Err(err) = self.try_configure(configure) {
            panic!("{err}");
        }
    }

    /// Register the rules for `T`, returning configuration errors instead
    /// of panicking. On error no plan is stored.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] of the pass, or
    /// [`ConfigError::AlreadyConfigured`] if `T` already has a plan.
    pub fn try_configure<T, C>(&self, configure: C) -> Result<(), ConfigError>
    where
        T: Structure,
        C: FnOnce(&Builder<'_, T>, &T),
    {
        let result = self.build_plan(configure);
        if let Err(err) = &result {
            tracing::warn!(owner = type_name::<T>(), error = %err, "rejected validation rules");
        }
        result
    }

    fn build_plan<T, C>(&self, configure: C) -> Result<(), ConfigError>
    where
        T: Structure,
        C: FnOnce(&Builder<'_, T>, &T),
    {
        let already = || ConfigError::AlreadyConfigured {
            owner: type_name::<T>(),
        };

        let _guard = self.store.lock_build();
        if self.store.contains::<T>() {
            return Err(already());
        }

        let mut template = T::default();
        zero(&mut template)?;

        let registration = Rc::new(Registration::default());
        {
            let builder = Builder::new(&template, Rc::clone(&registration));
            configure(&builder, &template);
        }
        let plan = registration.compile(&self.naming)?;

        tracing::debug!(
            owner = type_name::<T>(),
            fields = plan.field_count(),
            rules = plan.rule_count(),
            "compiled validation plan"
        );

        if self.store.insert(plan) {
            Ok(())
        } else {
            Err(already())
        }
    }

    /// Whether rules for `T` have been configured.
    #[must_use]
    pub fn is_configured<T: 'static>(&self) -> bool {
        self.store.contains::<T>()
    }

    /// Run every rule configured for `T` against `instance`.
    ///
    /// Returns all violations in plan order; an empty vector means the
    /// instance is valid, as does a type that was never configured.
    /// Normalizing rules such as `trim` modify `instance` in place.
    pub fn validate<T>(&self, ctx: &Context, instance: &mut T) -> Vec<Violation>
    where
        T: Send + Sync + 'static,
    {
        let Some(plan) = self.store.get::<T>() else {
            return Vec::new();
        };

        let violations = plan.execute(self.translator.as_ref(), ctx, instance);
        tracing::trace!(
            owner = type_name::<T>(),
            violations = violations.len(),
            "validated"
        );
        violations
    }

    /// Like [`Validator::validate`], for callers that propagate with `?`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] holding every violation found.
    pub fn check<T>(&self, ctx: &Context, instance: &mut T) -> Result<(), ValidationError>
    where
        T: Send + Sync + 'static,
    {
        let violations = self.validate(ctx, instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
