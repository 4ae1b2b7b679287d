/// Per-call state threaded through validation.
///
/// Carries the caller's preferred languages, most preferred first. The
/// translator consults them when rendering messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    languages: Vec<String>,
}

impl Context {
    /// A context without language preferences.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context preferring the given languages, in order.
    #[must_use]
    pub fn with_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a context from an `Accept-Language` header value.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Self {
        Self {
            languages: parse_accept_language(header),
        }
    }

    /// Preferred languages, most preferred first.
    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }
}

/// Parse an `Accept-Language` header into language tags.
///
/// Tags are ordered by descending quality; ties keep header order. Wildcards,
/// entries with `q=0` and entries with an unreadable quality are dropped, and
/// duplicates (compared case-insensitively) keep their best-ranked position.
///
/// ```
/// use fieldguard::parse_accept_language;
///
/// let tags = parse_accept_language("fr;q=0.8, en-US, en;q=0.9, *;q=0.1");
/// assert_eq!(tags, ["en-US", "en", "fr"]);
/// ```
#[must_use]
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<(&str, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut params = part.split(';');
            let tag = params.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let mut quality = 1.0_f32;
            for param in params {
                let param = param.trim();
                if let Some(q) = param
                    .strip_prefix("q=")
                    .or_else(|| param.strip_prefix("Q="))
                {
                    quality = q.trim().parse().ok()?;
                }
            }

            (quality > 0.0).then_some((tag, quality))
        })
        .collect();

    // Stable, so equal qualities keep header order.
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut tags: Vec<String> = Vec::with_capacity(entries.len());
    for (tag, _) in entries {
        if !tags.iter().any(|seen| seen.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_owned());
        }
    }
    tags
}
