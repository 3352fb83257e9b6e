//! # JSON Pointers — Locating Values in Payloads and Schemas
//!
//! `JsonPointer` is an RFC 6901 pointer held as a sequence of unescaped
//! reference tokens. Violations carry two of them: one into the payload
//! (where the offending value lives) and one into the schema (which rule
//! was broken).
//!
//! ## Walking
//!
//! [`JsonPointer::resolve`] is a small recursive walker over
//! `serde_json::Value`. Object tokens are member names; array tokens must
//! be canonical decimal indices (`0`, `17`, never `017` or `-`). Walking
//! the root pointer returns the document unchanged. The first token that
//! cannot be followed produces a [`ResolutionError`] naming the depth.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{PointerError, ResolutionError};
use crate::kind::JsonKind;

/// An RFC 6901 JSON pointer.
///
/// Ordering is lexicographic over tokens, which gives a stable order for
/// sorting edits by target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse pointer text such as `/properties/head_commit/type`.
    ///
    /// # Errors
    ///
    /// Returns [`PointerError::MissingLeadingSlash`] for non-empty text not
    /// starting with `/`, and [`PointerError::InvalidEscape`] for a `~` that
    /// is not part of `~0` or `~1`.
    pub fn parse(text: &str) -> Result<Self, PointerError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = text.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(text.to_string()));
        };
        rest.split('/')
            .map(|raw| unescape(raw, text))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Build a pointer from already-unescaped tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// The unescaped reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the root pointer.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a token in place.
    pub fn push(&mut self, token: impl Into<String>) {
        self.0.push(token.into());
    }

    /// A new pointer with `token` appended.
    pub fn child(&self, token: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(token);
        next
    }

    /// A new pointer with all of `suffix`'s tokens appended.
    pub fn concat(&self, suffix: &JsonPointer) -> Self {
        let mut next = self.clone();
        next.0.extend(suffix.0.iter().cloned());
        next
    }

    /// The pointer with its last token removed, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    /// The last token, or `None` at the root.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// True when `prefix`'s tokens are a leading run of this pointer's tokens.
    pub fn starts_with(&self, prefix: &JsonPointer) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Walk `root` along this pointer.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] for a missing member, an out-of-range
    /// or non-numeric array index, or an attempt to descend into a scalar.
    pub fn resolve<'a>(&self, root: &'a Value) -> Result<&'a Value, ResolutionError> {
        walk(root, &self.0, self, 0)
    }

    /// Walk `root` along this pointer, yielding a mutable reference.
    ///
    /// # Errors
    ///
    /// Same conditions as [`JsonPointer::resolve`].
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Result<&'a mut Value, ResolutionError> {
        walk_mut(root, &self.0, self, 0)
    }

    pub(crate) fn failure(&self, depth: usize, reason: String) -> ResolutionError {
        ResolutionError {
            pointer: self.to_string(),
            depth,
            reason,
        }
    }
}

fn walk<'a>(
    value: &'a Value,
    tokens: &[String],
    pointer: &JsonPointer,
    depth: usize,
) -> Result<&'a Value, ResolutionError> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(value);
    };
    let next = match value {
        Value::Object(map) => map
            .get(token)
            .ok_or_else(|| pointer.failure(depth, format!("object has no member '{token}'")))?,
        Value::Array(items) => {
            let index = array_index(token, items.len())
                .map_err(|reason| pointer.failure(depth, reason))?;
            &items[index]
        }
        scalar => {
            return Err(pointer.failure(
                depth,
                format!("cannot descend into {} with '{token}'", JsonKind::of(scalar)),
            ))
        }
    };
    walk(next, rest, pointer, depth + 1)
}

fn walk_mut<'a>(
    value: &'a mut Value,
    tokens: &[String],
    pointer: &JsonPointer,
    depth: usize,
) -> Result<&'a mut Value, ResolutionError> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(value);
    };
    let next = match value {
        Value::Object(map) => map
            .get_mut(token)
            .ok_or_else(|| pointer.failure(depth, format!("object has no member '{token}'")))?,
        Value::Array(items) => {
            let index = array_index(token, items.len())
                .map_err(|reason| pointer.failure(depth, reason))?;
            &mut items[index]
        }
        scalar => {
            let kind = JsonKind::of(scalar);
            return Err(pointer.failure(
                depth,
                format!("cannot descend into {kind} with '{token}'"),
            ));
        }
    };
    walk_mut(next, rest, pointer, depth + 1)
}

/// Interpret `token` as an index into an array of `len` items.
fn array_index(token: &str, len: usize) -> Result<usize, String> {
    let canonical = token == "0"
        || (!token.is_empty()
            && !token.starts_with('0')
            && token.bytes().all(|b| b.is_ascii_digit()));
    if !canonical {
        return Err(format!("'{token}' is not an array index"));
    }
    let index: usize = token
        .parse()
        .map_err(|_| format!("'{token}' is not an array index"))?;
    if index >= len {
        return Err(format!("index {index} out of bounds for array of {len}"));
    }
    Ok(index)
}

fn unescape(raw: &str, whole: &str) -> Result<String, PointerError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            other => {
                return Err(PointerError::InvalidEscape {
                    pointer: whole.to_string(),
                    escape: other.map(String::from).unwrap_or_default(),
                })
            }
        }
    }
    Ok(out)
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            f.write_str("/")?;
            f.write_str(&token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for JsonPointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for JsonPointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_root_is_empty() {
        let p = JsonPointer::parse("").unwrap();
        assert!(p.is_root());
        assert_eq!(p.to_string(), "");
    }

    #[test]
    fn parse_unescapes_tokens() {
        let p = JsonPointer::parse("/a~1b/c~0d/0").unwrap();
        assert_eq!(p.tokens(), &["a/b", "c~d", "0"]);
        assert_eq!(p.to_string(), "/a~1b/c~0d/0");
    }

    #[test]
    fn parse_rejects_missing_slash() {
        assert_eq!(
            JsonPointer::parse("properties"),
            Err(PointerError::MissingLeadingSlash("properties".into()))
        );
    }

    #[test]
    fn parse_rejects_bad_escape() {
        assert!(matches!(
            JsonPointer::parse("/a~2"),
            Err(PointerError::InvalidEscape { .. })
        ));
        assert!(matches!(
            JsonPointer::parse("/a~"),
            Err(PointerError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn empty_token_is_a_key() {
        let doc = json!({"": {"x": 1}});
        let p = JsonPointer::parse("//x").unwrap();
        assert_eq!(p.resolve(&doc).unwrap(), &json!(1));
    }

    #[test]
    fn resolve_root_returns_document() {
        let doc = json!({"a": 1});
        assert_eq!(JsonPointer::root().resolve(&doc).unwrap(), &doc);
    }

    #[test]
    fn resolve_nested_object_and_array() {
        let doc = json!({"commits": [{"id": "a"}, {"id": "b"}]});
        let p = JsonPointer::parse("/commits/1/id").unwrap();
        assert_eq!(p.resolve(&doc).unwrap(), &json!("b"));
    }

    #[test]
    fn resolve_missing_member_reports_depth() {
        let doc = json!({"repository": {"name": "x"}});
        let p = JsonPointer::parse("/repository/owner/login").unwrap();
        let err = p.resolve(&doc).unwrap_err();
        assert_eq!(err.depth, 1);
        assert_eq!(err.pointer, "/repository/owner/login");
        assert!(err.reason.contains("owner"));
    }

    #[test]
    fn resolve_rejects_non_canonical_index() {
        let doc = json!([1, 2, 3]);
        assert!(JsonPointer::parse("/01").unwrap().resolve(&doc).is_err());
        assert!(JsonPointer::parse("/-").unwrap().resolve(&doc).is_err());
        assert!(JsonPointer::parse("/3").unwrap().resolve(&doc).is_err());
        assert_eq!(
            JsonPointer::parse("/0").unwrap().resolve(&doc).unwrap(),
            &json!(1)
        );
    }

    #[test]
    fn resolve_into_scalar_fails() {
        let doc = json!({"a": null});
        let err = JsonPointer::parse("/a/b").unwrap().resolve(&doc).unwrap_err();
        assert!(err.reason.contains("null"));
    }

    #[test]
    fn resolve_mut_allows_in_place_edit() {
        let mut doc = json!({"properties": {"action": {"enum": ["opened"]}}});
        let p = JsonPointer::parse("/properties/action/enum").unwrap();
        p.resolve_mut(&mut doc)
            .unwrap()
            .as_array_mut()
            .unwrap()
            .push(json!("closed"));
        assert_eq!(doc["properties"]["action"]["enum"], json!(["opened", "closed"]));
    }

    #[test]
    fn parent_child_and_prefix() {
        let p = JsonPointer::parse("/oneOf/2/type").unwrap();
        assert_eq!(p.last(), Some("type"));
        let parent = p.parent().unwrap();
        assert_eq!(parent.to_string(), "/oneOf/2");
        assert!(p.starts_with(&parent));
        assert_eq!(parent.child("type"), p);
        assert!(JsonPointer::root().parent().is_none());
    }

    #[test]
    fn serde_uses_pointer_text() {
        let p = JsonPointer::parse("/a~1b").unwrap();
        let s = serde_json::to_string(&p).unwrap();
        assert_eq!(s, r#""/a~1b""#);
        let back: JsonPointer = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
    }
}
