//! Message lookup for violations.
//!
//! Rules never build message text themselves: they hand a locale key and
//! positional arguments to a [`Translator`]. The bundled [`Catalog`] reads
//! nested JSON documents, one per language, and flattens them into
//! colon-joined keys such as `validation:string:required`.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::CatalogError;

/// Language used by [`Catalog::builtin`] when no preference matches.
pub const DEFAULT_LANGUAGE: &str = "en";

static BUILTIN_EN: LazyLock<HashMap<String, String>> = LazyLock::new(|| {
    flatten_document(DEFAULT_LANGUAGE, include_str!("../locales/en.json"))
        .expect("embedded English catalog must parse")
});

/// Resolves a locale key to a message in the caller's preferred language.
pub trait Translator: Send + Sync {
    /// Render `key` for the first language in `languages` that has it.
    ///
    /// Implementations must not fail; when nothing matches they fall back
    /// to formatting the key itself with `args`.
    fn translate(&self, languages: &[String], key: &str, args: &[&dyn fmt::Display]) -> String;
}

/// In-memory message catalog keyed by language tag.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    languages: HashMap<String, HashMap<String, String>>,
    default_language: Option<String>,
}

impl Catalog {
    /// An empty catalog. Every lookup falls back to the raw key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The English messages shipped with the crate, with English as the
    /// default language.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new().with_default_language(DEFAULT_LANGUAGE);
        catalog
            .languages
            .insert(DEFAULT_LANGUAGE.to_owned(), BUILTIN_EN.clone());
        catalog
    }

    /// Language tried after every caller preference has missed.
    #[must_use]
    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = Some(normalize_tag(language));
        self
    }

    /// Merge a nested JSON document into `language`.
    ///
    /// Objects nest keys (`{"validation": {"string": {"required": ..}}}`
    /// becomes `validation:string:required`); leaves must be strings.
    /// Later documents override earlier entries with the same key.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the document is not valid JSON, its
    /// root is not an object, or a leaf is not a string.
    pub fn add_json(&mut self, language: &str, document: &str) -> Result<(), CatalogError> {
        let messages = flatten_document(language, document)?;
        self.languages
            .entry(normalize_tag(language))
            .or_default()
            .extend(messages);
        Ok(())
    }

    /// Insert a single message.
    pub fn insert(
        &mut self,
        language: &str,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> &mut Self {
        self.languages
            .entry(normalize_tag(language))
            .or_default()
            .insert(key.into(), message.into());
        self
    }

    /// Find the raw message template for `key`.
    ///
    /// Each preference is tried as given, then by its primary subtag
    /// (`de-AT` falls back to `de`), then the default language.
    #[must_use]
    pub fn lookup(&self, languages: &[String], key: &str) -> Option<&str> {
        let preferred = languages.iter().flat_map(|tag| {
            let tag = normalize_tag(tag);
            let primary = tag.split('-').next().map(str::to_owned);
            std::iter::once(tag).chain(primary)
        });

        preferred
            .chain(self.default_language.clone())
            .find_map(|tag| self.languages.get(&tag)?.get(key))
            .map(String::as_str)
    }
}

impl Translator for Catalog {
    fn translate(&self, languages: &[String], key: &str, args: &[&dyn fmt::Display]) -> String {
        format_message(self.lookup(languages, key).unwrap_or(key), args)
    }
}

/// Substitute positional `{0}`, `{1}`, ... placeholders.
///
/// `{{` and `}}` produce literal braces. Placeholders without a matching
/// argument are kept verbatim.
///
/// ```
/// use fieldguard::format_message;
///
/// assert_eq!(
///     format_message("must be between {0} and {1}", &[&1, &10]),
///     "must be between 1 and 10",
/// );
/// ```
#[must_use]
pub fn format_message(template: &str, args: &[&dyn fmt::Display]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if let Some(end) = tail.strip_prefix('{').and_then(|t| t.find('}')).map(|e| e + 1) {
            if let Some(arg) = tail[1..end]
                .parse::<usize>()
                .ok()
                .and_then(|index| args.get(index))
            {
                let _ = write!(out, "{arg}");
                rest = &tail[end + 1..];
                continue;
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

fn flatten_document(
    language: &str,
    document: &str,
) -> Result<HashMap<String, String>, CatalogError> {
    let root: serde_json::Value =
        serde_json::from_str(document).map_err(|source| CatalogError::Parse {
            language: language.to_owned(),
            source,
        })?;

    let serde_json::Value::Object(root) = root else {
        return Err(CatalogError::NotAnObject {
            language: language.to_owned(),
        });
    };

    let mut out = HashMap::new();
    flatten_into(language, "", root, &mut out)?;
    Ok(out)
}

fn flatten_into(
    language: &str,
    prefix: &str,
    object: serde_json::Map<String, serde_json::Value>,
    out: &mut HashMap<String, String>,
) -> Result<(), CatalogError> {
    for (name, value) in object {
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}:{name}")
        };
        match value {
            serde_json::Value::String(message) => {
                out.insert(key, message);
            }
            serde_json::Value::Object(nested) => flatten_into(language, &key, nested, out)?,
            _ => {
                return Err(CatalogError::InvalidEntry {
                    language: language.to_owned(),
                    key,
                });
            }
        }
    }
    Ok(())
}
