// src/core/arg_parser.rs

//! Token classification for free-form message arguments.
//!
//! Hosts hand over message text already split on whitespace, exactly as the
//! user typed it. Two named syntaxes are recognized per token (`key=value`
//! and `-key value...`); whatever a command declares positionally is paired
//! by [`bind_positional`]. The scan works on an owned copy of the stream
//! because a closing quote can leave a remainder that must be tokenized
//! again in place.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

lazy_static! {
    /// `key=value`: split at the first `=`, both sides non-empty.
    static ref EQUALS_RE: Regex = Regex::new(r"^([^=]+)=(.+)$").unwrap();
}

lazy_static! {
    /// `-key` / `--key`: token-initial dashes, remainder free of `=`.
    static ref DASH_RE: Regex = Regex::new(r"^-{1,2}([^=]+)$").unwrap();
}

// --- DATA STRUCTS ---

/// Declarative description of one argument slot a command accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    /// Display-only tag rendered inside usage fragments (`<User user>`).
    pub type_label: Option<String>,
    pub required: bool,
    /// Hidden slots render as an empty usage fragment.
    pub hidden: bool,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>, type_label: Option<&str>, required: bool) -> Self {
        Self {
            name: name.into(),
            type_label: type_label.map(str::to_string),
            required,
            hidden: false,
        }
    }

    pub fn required(name: impl Into<String>, type_label: Option<&str>) -> Self {
        Self::new(name, type_label, true)
    }

    pub fn optional(name: impl Into<String>, type_label: Option<&str>) -> Self {
        Self::new(name, type_label, false)
    }

    /// Unnamed, optional, invisible slot backing a variable-arity tail.
    fn placeholder() -> Self {
        Self {
            name: String::new(),
            type_label: None,
            required: false,
            hidden: true,
        }
    }

    /// `<label name>` when required, `[label name]` otherwise, nothing when
    /// hidden.
    pub fn usage_fragment(&self) -> String {
        if self.hidden {
            return String::new();
        }
        let label = self
            .type_label
            .as_deref()
            .map(|t| format!("{} ", t))
            .unwrap_or_default();
        if self.required {
            format!("<{}{}>", label, self.name)
        } else {
            format!("[{}{}]", label, self.name)
        }
    }
}

/// Value bound to a named argument: free text, or a bare flag that carried
/// no usable value token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Flag,
}

impl ArgValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag => None,
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Self::Flag)
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Flag => write!(f, "true"),
        }
    }
}

// --- TOKEN SCAN ---

/// True when a token would itself open a named argument. Such a token ends
/// a running dash-value concatenation.
fn is_argument_token(token: &str) -> bool {
    EQUALS_RE.is_match(token) || DASH_RE.is_match(token)
}

/// Position of the first `"` in a token, unless that quote is escaped. The
/// escape check looks only at the character immediately before the first
/// occurrence.
fn unescaped_quote_at(token: &str) -> Option<usize> {
    let pos = token.find('"')?;
    if pos > 0 && token.as_bytes().get(pos.wrapping_sub(1)) == Some(&b'\\') {
        return None;
    }
    Some(pos)
}

/// Keys are lower-cased with token-initial dashes dropped, so `--Other=1`
/// and `other=1` bind the same slot.
fn normalize_key(raw: &str) -> String {
    raw.trim_start_matches('-').to_lowercase()
}

/// Classifies free-form tokens into a map of named arguments.
///
/// # Logic:
/// - `key=value`: the key is everything before the first `=`. A value
///   opening with `"` swallows the following tokens (space-joined) until
///   one carries an unescaped `"`; that token is split at the quote and its
///   tail re-enters the scan as a fresh token. Without a closing quote the
///   same-token text is kept literally, opening quote included.
/// - `-key` / `--key`: with at least two tokens remaining, the next token
///   starts the value and subsequent ones are concatenated until the next
///   recognized argument token. With fewer remaining, a single following
///   token becomes the value unless it is itself dash-shaped; otherwise the
///   key binds [`ArgValue::Flag`].
/// - Anything else is skipped.
///
/// Later bindings of the same key overwrite earlier ones. Values keep their
/// original casing.
pub fn parse_named_args(tokens: &[String]) -> HashMap<String, ArgValue> {
    let mut parsed = HashMap::new();
    let mut stream: Vec<String> = tokens.to_vec();
    let mut i = 0;

    while i < stream.len() {
        let Some(token) = stream.get(i).cloned() else {
            break;
        };

        if let Some(caps) = EQUALS_RE.captures(&token) {
            let key = normalize_key(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
            let raw_value = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            if key.is_empty() {
                // A key that was nothing but dashes.
                i += 1;
                continue;
            }

            if let Some(opened) = raw_value.strip_prefix('"') {
                let mut span = opened.to_string();
                let mut closing: Option<usize> = None;
                let mut j = i + 1;
                while j < stream.len() {
                    let Some(candidate) = stream.get(j).cloned() else {
                        break;
                    };
                    span.push(' ');
                    if let Some(pos) = unescaped_quote_at(&candidate) {
                        let (before, rest) = candidate.split_at(pos);
                        span.push_str(before);
                        // The text after the quote goes back into the
                        // stream so later iterations can tokenize it.
                        if let Some(slot) = stream.get_mut(j) {
                            *slot = rest.get(1..).unwrap_or_default().to_string();
                        }
                        closing = Some(j);
                        break;
                    }
                    span.push_str(&candidate);
                    j += 1;
                }
                match closing {
                    Some(resume) => {
                        parsed.insert(key, ArgValue::Text(span));
                        i = resume;
                    }
                    None => {
                        parsed.insert(key, ArgValue::Text(raw_value));
                        i += 1;
                    }
                }
            } else {
                parsed.insert(key, ArgValue::Text(raw_value));
                i += 1;
            }
            continue;
        }

        if let Some(caps) = DASH_RE.captures(&token) {
            let key = normalize_key(caps.get(1).map(|m| m.as_str()).unwrap_or_default());

            // Exact threshold: two-or-more following tokens switch to the
            // greedy concatenation path.
            if i + 2 < stream.len() {
                let mut value = stream.get(i + 1).cloned().unwrap_or_default();
                let mut j = i + 2;
                while j < stream.len() {
                    let Some(candidate) = stream.get(j) else {
                        break;
                    };
                    if is_argument_token(candidate) {
                        break;
                    }
                    value.push(' ');
                    value.push_str(candidate);
                    j += 1;
                }
                parsed.insert(key, ArgValue::Text(value));
                i = j;
                continue;
            }

            match stream.get(i + 1) {
                Some(following) if !DASH_RE.is_match(following) => {
                    parsed.insert(key, ArgValue::Text(following.clone()));
                    i += 2;
                }
                _ => {
                    parsed.insert(key, ArgValue::Flag);
                    i += 1;
                }
            }
            continue;
        }

        i += 1;
    }

    parsed
}

// --- POSITIONAL BINDING ---

/// Pairs tokens with declared slots in order. Tokens beyond the declared
/// list land in the last slot; a slot that receives a second value keeps
/// both, space-joined.
pub fn bind_positional(tokens: &[String], specs: &[ArgSpec]) -> HashMap<String, String> {
    let mut bound = HashMap::new();
    let Some(last) = specs.last() else {
        return bound;
    };
    for (i, token) in tokens.iter().enumerate() {
        let spec = specs.get(i).unwrap_or(last);
        bound
            .entry(spec.name.clone())
            .and_modify(|value: &mut String| {
                value.push(' ');
                value.push_str(token);
            })
            .or_insert_with(|| token.clone());
    }
    bound
}

/// Builds `count` slots for a variable-arity argument: one visible head
/// named `name` and labelled `"<type_label>[]"`, followed by hidden
/// placeholders that soak up the remaining positions.
pub fn variable_args(
    count: usize,
    name: &str,
    type_label: Option<&str>,
    required: bool,
) -> Vec<ArgSpec> {
    let Some(placeholders) = count.checked_sub(1) else {
        return Vec::new();
    };
    let mut specs = Vec::with_capacity(count);
    specs.push(ArgSpec {
        name: name.to_string(),
        type_label: Some(format!("{}[]", type_label.unwrap_or_default())),
        required,
        hidden: false,
    });
    for _ in 0..placeholders {
        specs.push(ArgSpec::placeholder());
    }
    specs
}

// MARK: --- UNIT TESTS ---
