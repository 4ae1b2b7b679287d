use std::borrow::Cow;
use std::fmt;

use regex::Regex;

use crate::error::ConfigError;
use crate::helper::Helper;
use crate::structure::Structure;
use crate::violation::Violation;

use super::{FieldRules, Holder};

const REQUIRED: &str = "validation:string:required";
const MIN_LEN: &str = "validation:string:min_len";
const MAX_LEN: &str = "validation:string:max_len";
const ANY_OF: &str = "validation:string:any_of";
const REGEXP: &str = "validation:string:regexp";

/// Options for [`StringRules::regexp`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PatternOption {
    /// Report mismatches under this locale key instead of the default
    /// `validation:string:regexp`. The pattern is still passed as `{0}`.
    LocaleKey(String),
}

/// Rules for string fields.
///
/// Lengths count characters, not bytes. On vector fields item rules check
/// every present element and report the first one that fails.
pub struct StringRules<T, F> {
    core: FieldRules<T, F>,
}

impl<T, F> fmt::Debug for StringRules<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringRules").finish_non_exhaustive()
    }
}

impl<T: Structure, F: Holder<Item = String>> StringRules<T, F> {
    pub(crate) fn new(core: FieldRules<T, F>) -> Self {
        Self { core }
    }

    /// Strip leading and trailing whitespace in place. Never fails.
    ///
    /// Runs in registration order, so later rules on the same field see
    /// the trimmed value.
    pub fn trim(&self) -> &Self {
        self.core.push(|_, field: &mut F| {
            field.items_mut(trim_in_place);
            Vec::new()
        });
        self
    }

    /// Fail on `""`, `None`, `Some("")` or an empty vector.
    pub fn required(&self) -> &Self {
        self.core.required(REQUIRED);
        self
    }

    /// At least `min` characters.
    pub fn min_len(&self, min: usize) -> &Self {
        self.core.check_items(
            Cow::Borrowed(MIN_LEN),
            vec![min.to_string()],
            move |s| s.chars().count() >= min,
        );
        self
    }

    /// At most `max` characters.
    pub fn max_len(&self, max: usize) -> &Self {
        self.core.check_items(
            Cow::Borrowed(MAX_LEN),
            vec![max.to_string()],
            move |s| s.chars().count() <= max,
        );
        self
    }

    /// Both length bounds, inclusive.
    pub fn len_between(&self, min: usize, max: usize) -> &Self {
        self.min_len(min).max_len(max)
    }

    /// Fail unless the value equals one of `allowed`.
    pub fn any_of<I, S>(&self, allowed: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core
            .any_of(ANY_OF, allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Fail unless the whole value matches `pattern`.
    ///
    /// The pattern is anchored at both ends and compiled immediately; an
    /// invalid pattern fails the configure pass with
    /// [`ConfigError::InvalidPattern`].
    pub fn regexp(&self, pattern: &str, options: &[PatternOption]) -> &Self {
        let mut key = Cow::Borrowed(REGEXP);
        for option in options {
            match option {
                PatternOption::LocaleKey(custom) => key = Cow::Owned(custom.clone()),
            }
        }

        match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(re) => self
                .core
                .check_items(key, vec![pattern.to_owned()], move |s| re.is_match(s)),
            Err(source) => self.core.fail(ConfigError::InvalidPattern {
                field: self.core.path(),
                pattern: pattern.to_owned(),
                source,
            }),
        }
        self
    }

    /// Run caller logic over the value: `&String` for single fields, a
    /// slice for vectors. Skipped when the field is absent.
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

fn trim_in_place(s: &mut String) {
    let end = s.trim_end().len();
    s.truncate(end);
    let start = s.len() - s.trim_start().len();
    s.drain(..start);
}

#[cfg(test)]
mod tests {
    use super::{PatternOption, trim_in_place};
    use crate::context::Context;
    use crate::error::ConfigError;
    use crate::validator::Validator;
    use crate::violation::{FieldValue, Violation};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[derive(Debug, Default)]
    struct Profile {
        handle: String,
        bio: Option<String>,
        tags: Vec<String>,
        nicknames: Vec<Option<String>>,
    }

    crate::structure! { Profile { handle, bio, tags, nicknames } }

    fn messages(violations: &[Violation]) -> Vec<(&str, &str)> {
        violations
            .iter()
            .map(|v| (v.location(), v.message()))
            .collect()
    }

    #[test]
    fn trim_mutates_every_present_item() {
        let validator = Validator::new();
        validator.configure::<Profile, _>(|v, t| {
            v.string(&t.handle).trim();
            v.string(&t.bio).trim();
            v.string(&t.nicknames).trim();
        });

        let mut profile = Profile {
            handle: "\t ada \n".to_owned(),
            bio: Some("  hi".to_owned()),
            tags: vec![],
            nicknames: vec![Some(" a ".to_owned()), None],
        };
        assert!(validator.validate(&Context::new(), &mut profile).is_empty());
        assert_eq!(profile.handle, "ada");
        assert_eq!(profile.bio.as_deref(), Some("hi"));
        assert_eq!(profile.nicknames, [Some("a".to_owned()), None]);
    }

    #[test]
    fn required_after_trim_sees_trimmed_value() {
        let validator = Validator::new();
        validator.configure::<Profile, _>(|v, t| {
            v.string(&t.handle).trim().required();
            v.string(&t.bio).required();
            v.string(&t.tags).required();
        });

        let mut profile = Profile {
            handle: "   ".to_owned(),
            bio: Some(String::new()),
            ..Profile::default()
        };
        let violations = validator.validate(&Context::new(), &mut profile);
        assert_eq!(
            messages(&violations),
            [
                ("handle", "value is required"),
                ("bio", "value is required"),
                ("tags", "value is required"),
            ]
        );
        assert_eq!(violations[2].value(), &FieldValue::List(vec![]));
    }

    #[test]
    fn length_counts_characters_inclusively() {
        let validator = Validator::new();
        validator.configure::<Profile, _>(|v, t| {
            v.string(&t.handle).len_between(2, 3);
        });

        let check = |handle: &str| {
            let mut profile = Profile {
                handle: handle.to_owned(),
                ..Profile::default()
            };
            validator
                .validate(&Context::new(), &mut profile)
                .iter()
                .map(|v| v.message().to_owned())
                .collect::<Vec<_>>()
        };

        assert_eq!(check("ab"), Vec::<String>::new());
        assert_eq!(check("äöü"), Vec::<String>::new());
        assert_eq!(check("a"), ["must be at least 2 characters long"]);
        assert_eq!(check("abcd"), ["must be at most 3 characters long"]);
    }

    #[test]
    fn slice_rules_report_the_first_bad_element_only() {
        let validator = Validator::new();
        validator.configure::<Profile, _>(|v, t| {
            v.string(&t.tags).max_len(3);
            v.string(&t.nicknames).any_of(["x", "y"]);
        });

        let mut profile = Profile {
            tags: vec!["ok".into(), "long".into(), "longer".into()],
            nicknames: vec![None, Some("x".into()), Some("z".into()), Some("w".into())],
            ..Profile::default()
        };
        let violations = validator.validate(&Context::new(), &mut profile);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].location(), "tags");
        assert_eq!(violations[0].value(), &FieldValue::from("long"));
        assert_eq!(violations[1].location(), "nicknames");
        assert_eq!(violations[1].message(), "must be one of: x, y");
        assert_eq!(violations[1].value(), &FieldValue::from("z"));
    }

    #[test]
    fn absent_optional_is_skipped_by_item_rules() {
        let validator = Validator::new();
        validator.configure::<Profile, _>(|v, t| {
            v.string(&t.bio).min_len(5).regexp("[a-z]+", &[]);
        });

        let mut profile = Profile::default();
        assert!(validator.validate(&Context::new(), &mut profile).is_empty());
    }

    #[test]
    fn regexp_matches_whole_value_and_honours_locale_key() {
        let validator = Validator::new();
        validator.configure::<Profile, _>(|v, t| {
            v.string(&t.handle).regexp("[a-z]+", &[]);
            v.string(&t.tags).regexp(
                "[a-zA-Z0-9.]+",
                &[PatternOption::LocaleKey("tag {0} is malformed".to_owned())],
            );
        });

        let mut profile = Profile {
            handle: "abc1".to_owned(),
            tags: vec!["ok".to_owned(), "bad!".to_owned()],
            ..Profile::default()
        };
        let violations = validator.validate(&Context::new(), &mut profile);
        assert_eq!(
            messages(&violations),
            [
                ("handle", "must match the pattern [a-z]+"),
                ("tags", "tag [a-zA-Z0-9.]+ is malformed"),
            ]
        );
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let validator = Validator::new();
        let err = validator
            .try_configure::<Profile, _>(|v, t| {
                v.string(&t.handle).regexp("([a-z", &[]);
            })
            .expect_err("pattern does not compile");
        match err {
            ConfigError::InvalidPattern { field, pattern, .. } => {
                assert_eq!(field, "handle");
                assert_eq!(pattern, "([a-z");
            }
            other => panic!("unexpected error type: {other}"),
        }
        assert!(!validator.is_configured::<Profile>());
    }

    #[test]
    fn custom_receives_the_dereferenced_value() {
        let validator = Validator::new();
        validator.configure::<Profile, _>(|v, t| {
            v.string(&t.bio).custom(|h, bio: &String| {
                if bio.contains("http") {
                    vec![h.violation(bio, "links are not allowed", &[])]
                } else {
                    Vec::new()
                }
            });
            v.string(&t.tags).custom(|h, tags: &[String]| {
                if tags.len() > 2 {
                    vec![h.violation(tags.len(), "at most {0} tags", &[&2])]
                } else {
                    Vec::new()
                }
            });
        });

        let mut profile = Profile {
            bio: Some("see http://x".to_owned()),
            tags: vec!["a".into(), "b".into(), "c".into()],
            ..Profile::default()
        };
        let violations = validator.validate(&Context::new(), &mut profile);
        assert_eq!(
            messages(&violations),
            [("bio", "links are not allowed"), ("tags", "at most 2 tags")]
        );

        let mut quiet = Profile::default();
        assert!(validator.validate(&Context::new(), &mut quiet).is_empty());
    }

    proptest! {
        #[test]
        fn trim_is_idempotent(s in "\\PC*") {
            let mut once = s.clone();
            trim_in_place(&mut once);
            let mut twice = once.clone();
            trim_in_place(&mut twice);
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.as_str(), s.trim());
        }
    }
}
