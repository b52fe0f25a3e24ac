//! Metadata queries.
//!
//! Linear search over a parent's children, preserving insertion order. A
//! child matches when the queried key is present in its metadata and the
//! stored value satisfies the query value:
//!
//! - exact mode: the literal value `"*"` matches any present key, anything
//!   else is compared with type-sensitive JSON equality;
//! - regex mode: the query value is a pattern that must match a prefix of
//!   the stringified stored value. Prefix, not full match: `^abc` style
//!   anchoring is implied, a match anywhere past offset zero does not count.
//!
//! A child without the key is skipped, never an error.

use crate::error::CatalogError;
use crate::index::Metadata;
use regex::Regex;
use serde_json::Value;

/// Whether one child's metadata satisfies the query.
pub fn matches(
    metadata: &Metadata,
    key: &str,
    value: &Value,
    use_regex: bool,
) -> Result<bool, CatalogError> {
    let Some(stored) = metadata.get(key) else {
        return Ok(false);
    };
    if !use_regex {
        if let Value::String(s) = value {
            if s == "*" {
                return Ok(true);
            }
        }
        return Ok(stored == value);
    }

    let pattern = value.as_str().ok_or_else(|| {
        CatalogError::InvalidInput("regex query value must be a string".to_string())
    })?;
    let re = Regex::new(pattern)
        .map_err(|e| CatalogError::InvalidInput(format!("invalid query pattern: {e}")))?;
    let text = stringify(stored);
    // Leftmost match at offset zero is exactly "matches a prefix".
    Ok(re.find(&text).is_some_and(|m| m.start() == 0))
}

/// Positions of matching children, in their original order.
pub fn matching_positions<'a>(
    children: impl Iterator<Item = &'a Metadata>,
    key: &str,
    value: &Value,
    use_regex: bool,
) -> Result<Vec<usize>, CatalogError> {
    let mut positions = Vec::new();
    for (i, metadata) in children.enumerate() {
        if matches(metadata, key, value, use_regex)? {
            positions.push(i);
        }
    }
    Ok(positions)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
