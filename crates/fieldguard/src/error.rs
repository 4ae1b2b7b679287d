use std::fmt;

use crate::violation::Violation;

/// Programmer errors detected while rules are being configured.
///
/// These never depend on the data being validated. [`Validator::configure`]
/// panics with the error's message, [`Validator::try_configure`] returns it.
///
/// [`Validator::configure`]: crate::Validator::configure
/// [`Validator::try_configure`]: crate::Validator::try_configure
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The reference points inside the template but at no described field.
    #[error(
        "field of type `{field_type}` at offset {offset} of `{owner}` is not listed in its `Structure` table"
    )]
    UndescribedField {
        /// Type owning the template.
        owner: &'static str,
        /// Declared type of the referenced field.
        field_type: &'static str,
        /// Byte offset of the reference inside the template.
        offset: usize,
    },

    /// The reference does not point into the template at all.
    #[error("field of type `{field_type}` does not belong to the `{owner}` template")]
    ForeignField {
        /// Type owning the template.
        owner: &'static str,
        /// Declared type of the referenced field.
        field_type: &'static str,
    },

    /// A `Structure` table does not match the value it was applied to.
    #[error("`Structure` table of `{owner}` cannot reach member `{member}`")]
    ShapeMismatch {
        /// Type whose table is inconsistent.
        owner: &'static str,
        /// Name of the unreachable member.
        member: &'static str,
    },

    /// A `regexp` rule was given a pattern that does not compile.
    #[error("invalid pattern `{pattern}` for `{field}`: {source}")]
    InvalidPattern {
        /// Path of the field the rule was registered on.
        field: String,
        /// The rejected pattern.
        pattern: String,
        /// Compiler diagnostic.
        source: regex::Error,
    },

    /// Rules for this type were already compiled into a plan.
    #[error("validation rules for `{owner}` are already configured")]
    AlreadyConfigured {
        /// The configured type.
        owner: &'static str,
    },
}

/// Returned when a message catalog document cannot be loaded.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The document is not valid JSON.
    #[error("invalid catalog document for `{language}`: {source}")]
    Parse {
        /// Language the document was loaded for.
        language: String,
        /// Parser diagnostic.
        source: serde_json::Error,
    },

    /// The document root is not an object.
    #[error("catalog document for `{language}` must be an object")]
    NotAnObject {
        /// Language the document was loaded for.
        language: String,
    },

    /// A leaf is neither a string nor a nested object.
    #[error("catalog entry `{key}` for `{language}` must be a string or an object")]
    InvalidEntry {
        /// Language the document was loaded for.
        language: String,
        /// Flattened key of the offending entry.
        key: String,
    },
}

/// Returned by [`Validator::check`](crate::Validator::check) when at least
/// one rule is violated.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Every violation found, in plan order.
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.len() {
            0 => Ok(()),
            1 => write!(f, "validation error: {}", self.violations[0]),
            _ => {
                write!(f, "validation errors:")?;
                for v in &self.violations {
                    write!(f, "\n - {v}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ValidationError};
    use crate::violation::{FieldValue, Violation};

    #[test]
    fn validation_error_display_matches_single_and_multiple_formats() {
        let single = ValidationError::new(vec![Violation::new(
            "smtp_host",
            "value is required",
            FieldValue::from(""),
        )]);
        assert_eq!(
            single.to_string(),
            "validation error: smtp_host: value is required"
        );

        let multiple = ValidationError::new(vec![
            Violation::new("smtp_host", "value is required", FieldValue::from("")),
            Violation::new("type", "must be one of: SMTP, HTTP", FieldValue::from("FTP")),
        ]);
        assert_eq!(
            multiple.to_string(),
            "validation errors:\n - smtp_host: value is required\n - type: must be one of: SMTP, HTTP"
        );
    }

    #[test]
    fn config_error_messages_name_the_owner() {
        let err = ConfigError::AlreadyConfigured { owner: "app::Sender" };
        assert_eq!(
            err.to_string(),
            "validation rules for `app::Sender` are already configured"
        );

        let err = ConfigError::ForeignField {
            owner: "app::Sender",
            field_type: "alloc::string::String",
        };
        assert!(err.to_string().contains("does not belong to the `app::Sender` template"));
    }
}
