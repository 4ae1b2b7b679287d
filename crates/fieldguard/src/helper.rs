use std::fmt;

use crate::i18n::Translator;
use crate::violation::{FieldValue, Violation};

/// Per-rule view handed to rule closures at validate time.
///
/// Knows where the current field lives and which languages the caller
/// prefers, so custom rules can build violations the same way the
/// built-in ones do.
#[derive(Clone, Copy)]
pub struct Helper<'a> {
    translator: &'a dyn Translator,
    languages: &'a [String],
    location: &'a str,
}

impl fmt::Debug for Helper<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Helper")
            .field("languages", &self.languages)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<'a> Helper<'a> {
    pub(crate) fn new(
        translator: &'a dyn Translator,
        languages: &'a [String],
        location: &'a str,
    ) -> Self {
        Self {
            translator,
            languages,
            location,
        }
    }

    /// Rendered location of the field being validated.
    #[must_use]
    pub fn location(&self) -> &'a str {
        self.location
    }

    /// Caller's preferred languages, most preferred first.
    #[must_use]
    pub fn languages(&self) -> &'a [String] {
        self.languages
    }

    /// Render a locale key in the caller's language.
    #[must_use]
    pub fn translate(&self, key: &str, args: &[&dyn fmt::Display]) -> String {
        self.translator.translate(self.languages, key, args)
    }

    /// Build a violation at the current location.
    #[must_use]
    pub fn violation(
        &self,
        value: impl Into<FieldValue>,
        key: &str,
        args: &[&dyn fmt::Display],
    ) -> Violation {
        Violation::new(self.location, self.translate(key, args), value)
    }
}
