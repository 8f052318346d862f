use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of one index entry (a story or a docs page).
///
/// Entry ids are assigned by whoever builds the index; the store never
/// invents them, but story ids derived from module exports use [`to_id`] so
/// the two agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for EntryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Punctuation and whitespace replaced by dashes in id parts.
const SEPARATORS: &str = " \u{2019}\u{2013}\u{2014}\u{2015}\u{2032}\u{bf}'`~!@#$%^&*()_|+-=?;:\",.<>{}[]\\/";

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || SEPARATORS.contains(ch)
}

/// Lowercase a string and collapse every run of punctuation or whitespace
/// into a single dash, trimming dashes at both ends.
///
/// Letters outside ASCII are kept, so `Über/Button` becomes `über-button`.
pub fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut pending_dash = false;
    for ch in part.chars().flat_map(char::to_lowercase) {
        if is_separator(ch) {
            pending_dash = true;
            continue;
        }
        if pending_dash && !out.is_empty() {
            out.push('-');
        }
        pending_dash = false;
        out.push(ch);
    }
    out
}

fn sanitize_part(part: &str) -> Result<String, DomainError> {
    let sanitized = sanitize(part);
    if sanitized.is_empty() {
        return Err(DomainError::InvalidIdPart(part.to_string()));
    }
    Ok(sanitized)
}

/// Build a story id from a component id (or title) and a story name.
pub fn to_id(kind: &str, name: &str) -> Result<EntryId, DomainError> {
    Ok(EntryId(format!(
        "{}--{}",
        sanitize_part(kind)?,
        sanitize_part(name)?
    )))
}

/// Turn an export name into a human readable story name.
///
/// `PrimaryButton` becomes `Primary Button`, `with_icon` becomes
/// `With Icon`, `Size2XL` becomes `Size 2 XL`.
pub fn story_name_from_export(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = key.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(prev) = current.chars().last() {
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && ch.is_uppercase())
                || (prev.is_alphabetic() != ch.is_alphabetic())
                || (prev.is_uppercase()
                    && ch.is_uppercase()
                    && next.is_some_and(|n| n.is_lowercase()));
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
