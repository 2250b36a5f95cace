//! Translation orchestration: token budgeting, batching, prompt
//! construction and result merging.
//!
//! Cost is estimated once for the whole entry list and spread evenly across
//! batches, instead of accumulating per batch until the ceiling is hit. The
//! estimate is a character-count heuristic, not a tokenizer.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::sleep;

use crate::llm::{ChatRequest, LlmClient, LlmError};
use crate::parser::parse_translation_response;
use crate::progress::{emit_progress, ProgressEvent, ProgressSink};

/// Conservative per-request budget, leaving room for the reply.
pub const MAX_TOKENS_PER_REQUEST: usize = 3000;

const TEMPERATURE: f32 = 0.3;
const BATCH_COMPLETION_MAX_TOKENS: u32 = 8000;
const TEXT_COMPLETION_MAX_TOKENS: u32 = 2000;
/// Pause between consecutive single-text requests to stay under rate limits.
const RATE_LIMIT_DELAY: Duration = Duration::from_millis(500);

const SYSTEM_PROMPT: &str = "You are a professional Minecraft mod translator who renders \
English game text into natural, fluent Simplified Chinese.";

const JSON_SYSTEM_PROMPT: &str = "You are a professional Minecraft mod translator who renders \
English game text into natural, fluent Simplified Chinese. Always return the result strictly \
as a JSON object, exactly as instructed.";

const BATCH_PROMPT_TEMPLATE: &str = "Translate the following Minecraft mod strings from \
English into Simplified Chinese. Keep the original formatting and special characters \
(color codes such as \u{00a7}, placeholders such as %s or %d, and escapes) intact.

Rules:
1. Return one JSON object; keep every key unchanged and translate only the values.
2. Preserve all special characters and format codes.
3. The translations must read naturally in Chinese.
4. Return only the JSON object, with no explanation around it.

Strings to translate:
{CONTENT}

Return the translations as a JSON object:";

const TEXT_PROMPT_TEMPLATE: &str = "Translate the following Minecraft mod text from English \
into Simplified Chinese. Keep the original formatting and special characters (color codes, \
placeholders and escapes) intact. Return only the translation, with no explanation.

Source:
{TEXT}

Translation:";

/// A key and its source text, queued for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub key: String,
    pub value: String,
}

/// Per-key result row, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    pub key: String,
    pub original: String,
    pub translation: String,
}

/// Result of one single-text translation from [`translate_texts`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTranslation {
    pub original: String,
    pub translation: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything a resource translation produces.
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    /// The source mapping with translated values substituted in; entries
    /// that were skipped pass through untouched.
    pub translated_data: Map<String, Value>,
    /// One row per translated entry, ordered as extracted from the source.
    pub entries: Vec<TranslationEntry>,
}

/// `ceil(len / 4)` characters-per-token heuristic.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Spreads the estimated cost evenly: the entry list is split into
/// `ceil(estimate / ceiling)` slices of equal size (the last may be short).
pub fn batch_size_for(entry_count: usize, estimated_tokens: usize, ceiling: usize) -> usize {
    let batches = estimated_tokens.div_ceil(ceiling).max(1);
    (entry_count / batches).max(1)
}

fn render_entry_list(entries: &[SourceEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            format!(
                "{}. Key: \"{}\"\n   Value: \"{}\"",
                index + 1,
                entry.key,
                entry.value
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn scaled_percentage(current: usize, total: usize, scale: f64) -> u8 {
    if total == 0 {
        return 0;
    }
    ((current as f64 / total as f64) * scale).round() as u8
}

/// Translates one lang mapping and merges the results.
///
/// Entries whose value is not a non-empty string are excluded from the work
/// but pass through the merged map untouched. The whole entry list goes out
/// in one request when its estimate fits the per-request ceiling, otherwise
/// in contiguous batches submitted strictly one after another. A failed
/// request aborts the whole operation with no partial result; an unparsable
/// reply does not (the affected batch keeps its source text).
pub async fn translate_resource(
    client: &LlmClient,
    data: &Map<String, Value>,
    sink: &mut dyn ProgressSink,
) -> Result<TranslationOutcome, LlmError> {
    let entries: Vec<SourceEntry> = data
        .iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) if !text.trim().is_empty() => Some(SourceEntry {
                key: key.clone(),
                value: text.clone(),
            }),
            _ => None,
        })
        .collect();

    if entries.is_empty() {
        return Ok(TranslationOutcome {
            translated_data: data.clone(),
            entries: Vec::new(),
        });
    }

    let total = entries.len();
    emit_progress(sink, ProgressEvent {
        current: 0,
        total,
        percentage: 0,
    });

    let entry_list = render_entry_list(&entries);
    let estimated = estimate_tokens(&entry_list) + estimate_tokens(BATCH_PROMPT_TEMPLATE);

    let mut translated: HashMap<String, String> = HashMap::new();
    if estimated > MAX_TOKENS_PER_REQUEST {
        let batch_size = batch_size_for(total, estimated, MAX_TOKENS_PER_REQUEST);
        for (index, batch) in entries.chunks(batch_size).enumerate() {
            let done = index * batch_size;
            // 90% ceiling leaves headroom for the merge step
            emit_progress(sink, ProgressEvent {
                current: done,
                total,
                percentage: scaled_percentage(done, total, 90.0),
            });

            let reply = request_batch(client, batch).await?;
            translated.extend(parse_translation_response(&reply, batch));
        }
    } else {
        emit_progress(sink, ProgressEvent {
            current: total / 2,
            total,
            percentage: 50,
        });

        let reply = request_batch(client, &entries).await?;
        translated.extend(parse_translation_response(&reply, &entries));
    }

    let mut translated_data = data.clone();
    let mut rows = Vec::with_capacity(total);
    for entry in &entries {
        let translation = translated
            .get(&entry.key)
            .filter(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| entry.value.clone());
        translated_data.insert(entry.key.clone(), Value::String(translation.clone()));
        rows.push(TranslationEntry {
            key: entry.key.clone(),
            original: entry.value.clone(),
            translation,
        });
    }

    emit_progress(sink, ProgressEvent {
        current: total,
        total,
        percentage: 100,
    });

    Ok(TranslationOutcome {
        translated_data,
        entries: rows,
    })
}

async fn request_batch(client: &LlmClient, batch: &[SourceEntry]) -> Result<String, LlmError> {
    let prompt = BATCH_PROMPT_TEMPLATE.replace("{CONTENT}", &render_entry_list(batch));
    client
        .complete(ChatRequest {
            system: JSON_SYSTEM_PROMPT,
            user: &prompt,
            temperature: TEMPERATURE,
            max_tokens: BATCH_COMPLETION_MAX_TOKENS,
        })
        .await
}

/// Translates free-standing texts one request at a time.
///
/// Unlike the batched path, a failed request only fails its own item: the
/// text is kept as its own translation, the error recorded, and the loop
/// moves on. A fixed delay separates consecutive successful requests.
pub async fn translate_texts(
    client: &LlmClient,
    texts: &[String],
    sink: &mut dyn ProgressSink,
) -> Vec<TextTranslation> {
    let total = texts.len();
    let mut results = Vec::with_capacity(total);

    for (index, text) in texts.iter().enumerate() {
        match translate_text(client, text).await {
            Ok(translation) => {
                results.push(TextTranslation {
                    original: text.clone(),
                    translation,
                    success: true,
                    error: None,
                });
                emit_progress(sink, ProgressEvent {
                    current: index + 1,
                    total,
                    percentage: scaled_percentage(index + 1, total, 100.0),
                });
                if index + 1 < total {
                    sleep(RATE_LIMIT_DELAY).await;
                }
            }
            Err(error) => {
                results.push(TextTranslation {
                    original: text.clone(),
                    translation: text.clone(),
                    success: false,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    results
}

async fn translate_text(client: &LlmClient, text: &str) -> Result<String, LlmError> {
    let prompt = TEXT_PROMPT_TEMPLATE.replace("{TEXT}", text);
    let reply = client
        .complete(ChatRequest {
            system: SYSTEM_PROMPT,
            user: &prompt,
            temperature: TEMPERATURE,
            max_tokens: TEXT_COMPLETION_MAX_TOKENS,
        })
        .await?;

    if reply.is_empty() {
        Ok(text.to_string())
    } else {
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> SourceEntry {
        SourceEntry {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn token_estimate_is_monotonic() {
        let mut text = String::new();
        let mut previous = 0;
        for _ in 0..64 {
            text.push('x');
            let estimate = estimate_tokens(&text);
            assert!(estimate >= previous);
            previous = estimate;
        }
    }

    #[test]
    fn entry_list_format_is_stable() {
        let list = render_entry_list(&[entry("item.sword", "Sword"), entry("item.bow", "Bow")]);
        assert_eq!(
            list,
            "1. Key: \"item.sword\"\n   Value: \"Sword\"\n\n2. Key: \"item.bow\"\n   Value: \"Bow\""
        );
    }

    #[test]
    fn batch_size_spreads_cost_evenly() {
        // estimate of 9000 against a 3000 ceiling = 3 slices of 4 entries
        assert_eq!(batch_size_for(12, 9000, 3000), 4);
        // never below one entry per batch
        assert_eq!(batch_size_for(2, 90_000, 3000), 1);
        // within budget, everything fits one batch
        assert_eq!(batch_size_for(5, 1000, 3000), 5);
    }

    #[test]
    fn chunks_partition_without_loss() {
        let entries: Vec<SourceEntry> = (0..10)
            .map(|i| entry(&format!("key.{i}"), &format!("value {i}")))
            .collect();
        let batch_size = batch_size_for(entries.len(), 9000, 3000);

        let chunks: Vec<&[SourceEntry]> = entries.chunks(batch_size).collect();
        let flattened: Vec<&SourceEntry> = chunks.iter().flat_map(|c| c.iter()).collect();

        assert_eq!(flattened.len(), entries.len());
        for (original, chunked) in entries.iter().zip(flattened) {
            assert_eq!(original, chunked);
        }
    }

    #[test]
    fn percentage_reserves_headroom() {
        assert_eq!(scaled_percentage(0, 10, 90.0), 0);
        assert_eq!(scaled_percentage(5, 10, 90.0), 45);
        assert_eq!(scaled_percentage(10, 10, 90.0), 90);
        assert_eq!(scaled_percentage(0, 0, 90.0), 0);
    }
}
