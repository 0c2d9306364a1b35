//! Normalization of loosely-typed venue columns
//!
//! The venue table accumulated several storage shapes for the same logical
//! fields: JSON-encoded strings, comma-separated strings, concatenated
//! camel-case strings, and native arrays. Every function here is total:
//! malformed input degrades to best-effort extraction and never returns an
//! error to the caller.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::db::models::{DayHours, OwnerInfo, VenueRule};

/// Known category labels that appear concatenated in camel-case form
/// (e.g. `"WeddingVenuesBanquetHalls"`). Extraction walks this list in
/// order, greedy, first match wins; unmatched remainder is discarded.
pub const CATEGORY_VOCABULARY: &[&str] = &[
    "Wedding Venues",
    "Banquet Halls",
    "Conference Rooms",
    "Corporate Events",
    "Party Halls",
    "Birthday Parties",
    "Outdoor Venues",
    "Exhibition Centers",
    "Meeting Rooms",
    "Training Rooms",
];

/// Coerce any stored representation of an array-ish field into `Vec<String>`
///
/// Handles, in order: null, native arrays, JSON-array strings (after
/// single-to-double quote substitution), comma lists, known-vocabulary
/// camel-case concatenations, a camel-case boundary fallback split, and
/// finally the scalar string itself. The result never contains empty
/// elements.
pub fn normalize_array_field(raw: &Value) -> Vec<String> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => normalize_string_field(s),
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        // Objects carry no array semantics; nothing to extract
        Value::Object(_) => Vec::new(),
    }
}

/// Convenience wrapper for optional raw values
pub fn normalize_optional_array_field(raw: Option<&Value>) -> Vec<String> {
    raw.map(normalize_array_field).unwrap_or_default()
}

fn normalize_string_field(s: &str) -> Vec<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    // JSON array, possibly written with single quotes
    if trimmed.starts_with('[') {
        let candidate = trimmed.replace('\'', "\"");
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&candidate) {
            return items
                .iter()
                .filter_map(scalar_to_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    // Comma list
    if trimmed.contains(',') {
        return trimmed
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // Known labels concatenated without separators
    let known = extract_known_labels(trimmed);
    if !known.is_empty() {
        return known;
    }

    // camelCase boundary fallback
    if has_camel_boundary(trimmed) {
        return split_camel_case(trimmed);
    }

    vec![trimmed.to_string()]
}

/// Extract known vocabulary labels embedded in a concatenated string
///
/// Each label is searched in both its spaced and compact (space-stripped)
/// form; a found occurrence is removed from the working copy so overlapping
/// matches cannot double-count.
fn extract_known_labels(s: &str) -> Vec<String> {
    let mut remaining = s.to_string();
    let mut found = Vec::new();
    for label in CATEGORY_VOCABULARY {
        let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        for needle in [*label, compact.as_str()] {
            if let Some(pos) = remaining.find(needle) {
                found.push((*label).to_string());
                remaining.replace_range(pos..pos + needle.len(), "");
                break;
            }
        }
    }
    found
}

fn has_camel_boundary(s: &str) -> bool {
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() && prev_lower {
            return true;
        }
        prev_lower = c.is_lowercase();
    }
    false
}

/// Split on lower-to-upper boundaries: `"lowerUpper"` -> `["lower", "Upper"]`
fn split_camel_case(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            parts.push(current.trim().to_string());
            current = String::new();
        }
        prev_lower = c.is_lowercase();
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Parse the `owner_info` column (JSON object or JSON-encoded string)
///
/// Returns `None` on null or parse failure. On success every field is filled
/// with an empty default rather than left optional.
pub fn normalize_owner_info(raw: &Value) -> Option<OwnerInfo> {
    let obj = match as_object(raw) {
        Some(obj) => obj,
        None => return None,
    };

    let mut social_links = BTreeMap::new();
    if let Some(Value::Object(links)) = pick(&obj, &["socialLinks", "social_links"]) {
        for (k, v) in links {
            if let Some(url) = scalar_to_string(v) {
                social_links.insert(k.clone(), url);
            }
        }
    }

    Some(OwnerInfo {
        name: pick_string(&obj, &["name"]),
        contact: pick_string(&obj, &["contact"]),
        response_time: pick_string(&obj, &["responseTime", "response_time"]),
        user_id: pick_string(&obj, &["user_id", "userId"]),
        social_links,
    })
}

/// Parse the `rules_and_regulations` column into a fixed shape
pub fn normalize_rules(raw: &Value) -> Vec<VenueRule> {
    let items = match decoded(raw) {
        Value::Array(items) => items,
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            Some(VenueRule {
                category: pick_string(obj, &["category"]),
                title: pick_string(obj, &["title"]),
                description: pick_string(obj, &["description"]),
            })
        })
        .collect()
}

/// Parse the `opening_hours` column into a day -> open/close map
pub fn normalize_opening_hours(raw: &Value) -> Option<BTreeMap<String, DayHours>> {
    let obj = as_object(raw)?;
    let mut hours = BTreeMap::new();
    for (day, value) in &obj {
        if let Some(day_obj) = value.as_object() {
            hours.insert(
                day.to_lowercase(),
                DayHours {
                    open: pick_string(day_obj, &["open"]),
                    close: pick_string(day_obj, &["close"]),
                },
            );
        }
    }
    if hours.is_empty() {
        None
    } else {
        Some(hours)
    }
}

/// Coerce a numeric or numeric-string value into a non-negative integer
///
/// Non-numeric input yields 0.
pub fn parse_int_field(raw: &Value) -> i64 {
    let parsed = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>()
                .ok()
                .or_else(|| t.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    };
    parsed.unwrap_or(0).max(0)
}

/// Same as [`parse_int_field`] for floating-point columns
pub fn parse_float_field(raw: &Value) -> f64 {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.unwrap_or(0.0).max(0.0)
}

/// Coerce boolean-ish storage (0/1, "true"/"false") into bool
pub fn parse_bool_field(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

/// Resolve a value that may itself be a JSON-encoded string
fn decoded(raw: &Value) -> Value {
    if let Value::String(s) = raw {
        let trimmed = s.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
                return parsed;
            }
        }
        return Value::Null;
    }
    raw.clone()
}

fn as_object(raw: &Value) -> Option<serde_json::Map<String, Value>> {
    match decoded(raw) {
        Value::Object(obj) => Some(obj),
        _ => None,
    }
}

fn pick<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn pick_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> String {
    pick(obj, keys)
        .and_then(scalar_to_string)
        .unwrap_or_default()
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
