use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::context::Context;
use crate::helper::Helper;
use crate::i18n::Translator;
use crate::violation::Violation;

use super::builder::RuleFn;
use super::resolve::FieldDescriptor;

/// Frozen, ordered rules for one struct type.
pub(crate) struct Plan<T> {
    entries: Vec<PlanEntry<T>>,
}

pub(crate) struct PlanEntry<T> {
    pub(crate) descriptor: Arc<FieldDescriptor>,
    pub(crate) location: String,
    pub(crate) rule: RuleFn<T>,
}

impl<T> Plan<T> {
    pub(crate) fn new(entries: Vec<PlanEntry<T>>) -> Self {
        Self { entries }
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries are grouped per field, so runs of one descriptor count once.
    pub(crate) fn field_count(&self) -> usize {
        let mut fields: Vec<_> = self.entries.iter().map(|e| &e.descriptor).collect();
        fields.dedup_by(|a, b| Arc::ptr_eq(*a, *b));
        fields.len()
    }

    /// Run every rule in order and collect all violations.
    pub(crate) fn execute(
        &self,
        translator: &dyn Translator,
        ctx: &Context,
        instance: &mut T,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        for entry in &self.entries {
            let helper = Helper::new(translator, ctx.languages(), &entry.location);
            violations.extend((entry.rule)(instance, &helper));
        }
        violations
    }

    #[cfg(test)]
    pub(crate) fn locations(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.location.as_str(), e.descriptor.item_type_name()))
            .collect()
    }
}

type ErasedPlan = Arc<dyn Any + Send + Sync>;

/// Plans keyed by the type they validate.
///
/// Lookups take the read lock just long enough to clone an `Arc`; inserts
/// are serialized by the build lock.
#[derive(Default)]
pub(crate) struct PlanStore {
    build_lock: Mutex<()>,
    plans: RwLock<HashMap<TypeId, ErasedPlan>>,
}

impl PlanStore {
    fn read_plans(&self) -> RwLockReadGuard<'_, HashMap<TypeId, ErasedPlan>> {
        self.plans.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_plans(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, ErasedPlan>> {
        self.plans.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn lock_build(&self) -> MutexGuard<'_, ()> {
        self.build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn contains<T: 'static>(&self) -> bool {
        self.read_plans().contains_key(&TypeId::of::<T>())
    }

    pub(crate) fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<Plan<T>>> {
        let erased = Arc::clone(self.read_plans().get(&TypeId::of::<T>())?);
        erased.downcast::<Plan<T>>().ok()
    }

    /// Store `plan` unless `T` already has one. Callers hold the build
    /// lock.
    pub(crate) fn insert<T: Send + Sync + 'static>(&self, plan: Plan<T>) -> bool {
        let mut plans = self.write_plans();
        if plans.contains_key(&TypeId::of::<T>()) {
            return false;
        }
        plans.insert(TypeId::of::<T>(), Arc::new(plan));
        true
    }
}
