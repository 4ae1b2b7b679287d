use std::sync::Arc;

use crate::i18n::Translator;
use crate::validator::FieldPath;

/// Renders a field path into [`Violation::location`](crate::Violation::location).
pub type FieldNaming = Arc<dyn Fn(&FieldPath) -> String + Send + Sync>;

/// Options for configuring the `Validator` at construction time.
#[non_exhaustive]
pub enum ValidatorOption {
    /// Override message lookup. Defaults to [`Catalog::builtin`](crate::Catalog::builtin).
    Translator(Arc<dyn Translator>),

    /// Override how field paths appear in violation locations. Defaults to
    /// joining path segments with `.`.
    FieldLocationNaming(FieldNaming),
}

impl std::fmt::Debug for ValidatorOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Translator(_) => f.write_str("Translator(..)"),
            Self::FieldLocationNaming(_) => f.write_str("FieldLocationNaming(..)"),
        }
    }
}

/// Dotted path, e.g. `billing.zip`.
pub(crate) fn default_naming() -> FieldNaming {
    Arc::new(FieldPath::to_string)
}
