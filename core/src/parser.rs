//! Tolerant extraction of key/value maps from raw model replies.
//!
//! Models wrap the requested JSON object in markdown fences, prose, or both,
//! and sometimes return nothing usable at all. Parsing therefore never
//! fails: an unusable reply degrades to the identity mapping so the rest of
//! the pipeline keeps running with untranslated text.

use std::collections::HashMap;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::translate::SourceEntry;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("valid fenced-JSON regex")
});

/// Maps each batch entry's key to its translated text.
///
/// Extraction order: a fenced ```json block, then the first `{` through the
/// last `}`. When neither yields a JSON object, every entry falls back to
/// its own source text.
pub fn parse_translation_response(
    raw: &str,
    entries: &[SourceEntry],
) -> HashMap<String, String> {
    match extract_object(raw) {
        Some(map) => map,
        None => {
            warn!(
                "unusable translation reply, keeping source text for {} entries",
                entries.len()
            );
            entries
                .iter()
                .map(|entry| (entry.key.clone(), entry.value.clone()))
                .collect()
        }
    }
}

fn extract_object(raw: &str) -> Option<HashMap<String, String>> {
    let candidate = FENCED_JSON
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|capture| capture.as_str())
        .or_else(|| brace_delimited(raw))?;

    let value: Value = serde_json::from_str(candidate).ok()?;
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(key, value)| {
                value
                    .as_str()
                    .map(|text| (key.clone(), text.to_string()))
            })
            .collect(),
    )
}

/// First `{` through last `}`.
fn brace_delimited(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}
