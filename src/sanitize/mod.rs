//! Fragment sanitization and route parameter validation.
//!
//! The fragment step is a fixed denylist: it strips the characters and
//! protocol prefixes that matter when a fragment is reflected into markup or
//! meta tags. It is not a general-purpose XSS filter.

use std::borrow::Cow;
use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use thiserror::Error;

pub const DEFAULT_PATH: &str = "/";
pub const MAX_FRAGMENT_LEN: usize = 200;
pub const MAX_PARAM_LEN: usize = 100;
pub const MAX_SEARCH_QUERY_LEN: usize = 100;

const FRAGMENT_DENIED_CHARS: [char; 4] = ['<', '>', '\'', '"'];
const FRAGMENT_DENIED_PROTOCOLS: [&str; 3] = ["javascript:", "data:", "vbscript:"];
const URL_DENIED_PROTOCOLS: [&str; 5] = ["javascript:", "data:", "vbscript:", "file:", "about:"];

fn protocol_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FRAGMENT_DENIED_PROTOCOLS
            .iter()
            .map(|p| Regex::new(&format!("(?i){}", regex::escape(p))).expect("static regex"))
            .collect()
    })
}

fn slug_pattern() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"(?i)^[a-z0-9-]+$").expect("static regex"))
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Turns a raw fragment (`#/game/foo`, `/game/foo`, or empty) into a path.
///
/// Removes `<`, `>` and quotes, then each denied protocol prefix
/// case-insensitively, then truncates to [`MAX_FRAGMENT_LEN`] characters.
/// An empty result becomes [`DEFAULT_PATH`].
pub fn sanitize_fragment(raw: &str) -> String {
    let path = raw.strip_prefix('#').unwrap_or(raw);
    if path.is_empty() {
        return DEFAULT_PATH.to_string();
    }

    let mut cleaned: String = path
        .chars()
        .filter(|c| !FRAGMENT_DENIED_CHARS.contains(c))
        .collect();
    for re in protocol_patterns() {
        if let Cow::Owned(replaced) = re.replace_all(&cleaned, "") {
            cleaned = replaced;
        }
    }
    let truncated: String = cleaned.chars().take(MAX_FRAGMENT_LEN).collect();

    if truncated.is_empty() {
        DEFAULT_PATH.to_string()
    } else {
        truncated
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("malformed percent escape in '{value}'")]
    MalformedEscape { value: String },

    #[error("decoded value is not valid UTF-8: '{value}'")]
    InvalidUtf8 { value: String },

    #[error("parameter '{name}' is empty")]
    Empty { name: String },

    #[error("parameter '{name}' has invalid characters: '{value}'")]
    InvalidCharacters { name: String, value: String },

    #[error("parameter '{name}' attempts path traversal: '{value}'")]
    PathTraversal { name: String, value: String },

    #[error("parameter '{name}' is too long (max {max})")]
    TooLong { name: String, max: usize },
}

/// Validation rule applied to a `:param` segment, chosen by parameter name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Slug,
    Category,
    Generic,
}

impl ParamKind {
    pub fn for_name(name: &str) -> Self {
        match name {
            "slug" => Self::Slug,
            "category" => Self::Category,
            _ => Self::Generic,
        }
    }
}

/// `decodeURIComponent` semantics: every `%` must start a two-digit hex
/// escape and the decoded bytes must be UTF-8.
pub fn percent_decode(value: &str) -> Result<String, ParamError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(ParamError::MalformedEscape {
                    value: value.to_string(),
                });
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    urlencoding::decode(value)
        .map(Cow::into_owned)
        .map_err(|_| ParamError::InvalidUtf8 {
            value: value.to_string(),
        })
}

pub fn validate_param(name: &str, value: &str) -> Result<(), ParamError> {
    if value.is_empty() {
        return Err(ParamError::Empty {
            name: name.to_string(),
        });
    }
    match ParamKind::for_name(name) {
        ParamKind::Slug | ParamKind::Category => {
            if value.contains("..") || value.contains('/') || value.contains('\\') {
                return Err(ParamError::PathTraversal {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
            if !slug_pattern().is_match(value) {
                return Err(ParamError::InvalidCharacters {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        ParamKind::Generic => {
            if value.contains("..") {
                return Err(ParamError::PathTraversal {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
            if value.contains('<') || value.contains('>') {
                return Err(ParamError::InvalidCharacters {
                    name: name.to_string(),
                    value: value.to_string(),
                });
            }
            if value.chars().count() > MAX_PARAM_LEN {
                return Err(ParamError::TooLong {
                    name: name.to_string(),
                    max: MAX_PARAM_LEN,
                });
            }
        }
    }
    Ok(())
}

/// Decodes a raw path segment and validates it for `name`.
pub fn decode_param(name: &str, raw: &str) -> Result<String, ParamError> {
    let decoded = percent_decode(raw)?;
    validate_param(name, &decoded)?;
    Ok(decoded)
}

pub fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for ch in unsafe_text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            '/' => out.push_str("&#x2F;"),
            c => out.push(c),
        }
    }
    out
}

/// Returns the URL when it is http(s), a relative path, or has no scheme.
pub fn sanitize_url(url: &str) -> Option<&str> {
    let lowered = url.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if URL_DENIED_PROTOCOLS.iter().any(|p| lowered.starts_with(p)) {
        warn!("blocked dangerous URL: {url}");
        return None;
    }
    let allowed = ["http://", "https://", "/", "./", "../"]
        .iter()
        .any(|p| lowered.starts_with(p));
    if allowed || !lowered.contains(':') {
        return Some(url);
    }
    warn!("blocked suspicious URL: {url}");
    None
}

pub fn sanitize_slug(slug: &str) -> Option<&str> {
    validate_param("slug", slug).ok().map(|_| slug)
}

/// Numeric ids only.
pub fn sanitize_game_id(id: &str) -> Option<&str> {
    if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
        Some(id)
    } else {
        None
    }
}

/// Caps a search query at [`MAX_SEARCH_QUERY_LEN`] characters, leaving the
/// text itself untouched for literal matching.
pub fn clamp_search_query(query: &str) -> String {
    query.chars().take(MAX_SEARCH_QUERY_LEN).collect()
}

/// Truncates, strips tags, escapes and trims a free-text search query for
/// display.
pub fn sanitize_search_query(query: &str) -> String {
    let truncated: String = query.chars().take(MAX_SEARCH_QUERY_LEN).collect();
    let stripped = tag_pattern().replace_all(&truncated, "");
    escape_html(&stripped).trim().to_string()
}
