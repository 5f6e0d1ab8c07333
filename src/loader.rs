use std::fs;
use std::io::Write;
use std::path::Path;

use log::info;
use mongodb::bson;
use serde_json::{json, Value};

use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::models::{empty_object, ChatLog, Message, TokenCost};
use crate::store::ChatlogStore;

/// Counters for a completed (or partially completed) load run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub chunks_completed: usize,
    pub records_inserted: usize,
}

/// Split records into chunks of `chunk_size`, preserving order. The last
/// chunk may be shorter. The iterator is lazy and single-pass; nothing is
/// cloned. A chunk size of zero is a caller contract violation.
pub fn chunk_records<T>(
    records: Vec<T>,
    chunk_size: usize,
) -> Result<impl Iterator<Item = Vec<T>>, LoaderError> {
    if chunk_size == 0 {
        return Err(LoaderError::InvalidChunkSize);
    }
    let mut remaining = records.into_iter();
    Ok(std::iter::from_fn(move || {
        let chunk: Vec<T> = remaining.by_ref().take(chunk_size).collect();
        (!chunk.is_empty()).then_some(chunk)
    }))
}

/// Guarantee a non-null `token_cost` on the message. Absent or null becomes
/// the zero breakdown `{"cost": "0.0", "tokens": 0}`; anything else passes
/// through untouched. Idempotent.
pub fn normalize_message(mut message: Message) -> Message {
    if matches!(message.token_cost, None | Some(Value::Null)) {
        let zero = TokenCost::default();
        message.token_cost = Some(json!({ "cost": zero.cost, "tokens": zero.tokens }));
    }
    message
}

/// Map a raw chat record (loose JSON, possibly missing optional fields) into
/// the canonical document shape. `index` is the record's position in the
/// source array, used only for error reporting.
pub fn project_record(index: usize, record: &Value) -> Result<ChatLog, LoaderError> {
    let raw_messages = record
        .get("messages")
        .and_then(Value::as_array)
        .ok_or(LoaderError::MissingMessages { index })?;

    let mut messages = Vec::with_capacity(raw_messages.len());
    for raw in raw_messages {
        let message: Message = serde_json::from_value(raw.clone())
            .map_err(|source| LoaderError::MalformedMessage { index, source })?;
        messages.push(normalize_message(message));
    }

    Ok(ChatLog {
        stime: value_or_empty(record, "stime"),
        messages,
        last_interact: value_or_empty(record, "last_interact"),
        llm_deployment_name: string_or_empty(record, "llm_deployment_name"),
        llm_model_name: string_or_empty(record, "llm_model_name"),
        vectorstore_index: string_or_empty(record, "vectorstore_index"),
        overall_cost: value_or_empty(record, "overall_cost"),
        // The export writes the owner under a capitalized key while every
        // other field is lowercase. Real export files carry this casing, so
        // the lowercase spelling is deliberately not read here.
        person: string_or_empty(record, "Person"),
    })
}

fn string_or_empty(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn value_or_empty(record: &Value, key: &str) -> Value {
    record.get(key).cloned().unwrap_or_else(empty_object)
}

fn read_source(path: &Path) -> Result<Vec<Value>, LoaderError> {
    let raw = fs::read_to_string(path).map_err(|source| LoaderError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: Value = serde_json::from_str(&raw).map_err(|source| LoaderError::SourceParse {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parsed
        .get("chatlog")
        .and_then(Value::as_array)
        .ok_or_else(|| LoaderError::MissingChatlogKey {
            path: path.to_path_buf(),
        })?;
    Ok(records.to_vec())
}

/// Drive the whole batch load: read the source file, take the `chatlog`
/// array, and insert one document per record, chunk by chunk, in source
/// order. Writes `Inserted chunk {n}` to `progress` after each completed
/// chunk; `main` passes stdout.
///
/// Fail-fast: the first error aborts the run. Documents inserted before the
/// failure are not rolled back; re-running inserts them again.
pub fn load_chatlog(
    config: &LoaderConfig,
    store: &mut dyn ChatlogStore,
    progress: &mut dyn Write,
) -> Result<LoadStats, LoaderError> {
    let records = read_source(&config.source_path)?;
    info!(
        "Loaded {} chat records from {}",
        records.len(),
        config.source_path.display()
    );

    let mut stats = LoadStats::default();
    for (chunk_index, chunk) in chunk_records(records, config.chunk_size)?.enumerate() {
        for (offset, record) in chunk.iter().enumerate() {
            let index = chunk_index * config.chunk_size + offset;
            let chat = project_record(index, record)?;
            let document = bson::to_document(&chat)?;
            store.insert_one(document)?;
            stats.records_inserted += 1;
        }
        stats.chunks_completed = chunk_index + 1;
        writeln!(progress, "Inserted chunk {}", chunk_index + 1)?;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_preserve_order_and_sizes() {
        let records: Vec<u32> = (0..1200).collect();
        let chunks: Vec<Vec<u32>> = chunk_records(records, 500).unwrap().collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 200);
        let flattened: Vec<u32> = chunks.into_iter().flatten().collect();
        assert_eq!(flattened, (0..1200).collect::<Vec<u32>>());
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let chunks: Vec<Vec<u32>> = chunk_records((0..10).collect(), 5).unwrap().collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 5);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks: Vec<Vec<u32>> = chunk_records(Vec::new(), 500).unwrap().collect();
        assert!(chunks.is_empty());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let result = chunk_records(vec![1, 2, 3], 0);
        assert!(matches!(result, Err(LoaderError::InvalidChunkSize)));
    }

    #[test]
    fn normalize_fills_missing_token_cost() {
        let message: Message =
            serde_json::from_value(json!({ "role": "user", "content": "hi" })).unwrap();
        let normalized = normalize_message(message);
        assert_eq!(
            normalized.token_cost,
            Some(json!({ "cost": "0.0", "tokens": 0 }))
        );
    }

    #[test]
    fn normalize_replaces_explicit_null() {
        let message: Message =
            serde_json::from_value(json!({ "role": "user", "content": "hi", "token_cost": null }))
                .unwrap();
        let normalized = normalize_message(message);
        assert_eq!(
            normalized.token_cost,
            Some(json!({ "cost": "0.0", "tokens": 0 }))
        );
    }

    #[test]
    fn normalize_passes_populated_cost_through() {
        let cost = json!({ "cost": "1.5", "tokens": 42 });
        let message: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": "hello",
            "token_cost": cost.clone(),
        }))
        .unwrap();
        let normalized = normalize_message(message);
        assert_eq!(normalized.token_cost, Some(cost));
    }

    #[test]
    fn normalize_is_idempotent() {
        let message: Message =
            serde_json::from_value(json!({ "role": "user", "content": "hi" })).unwrap();
        let once = normalize_message(message);
        let twice = normalize_message(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn project_defaults_missing_optional_fields() {
        let record = json!({
            "messages": [{ "role": "user", "content": "hi", "recorded_on": {} }]
        });
        let chat = project_record(0, &record).unwrap();
        assert_eq!(chat.stime, json!({}));
        assert_eq!(chat.last_interact, json!({}));
        assert_eq!(chat.overall_cost, json!({}));
        assert_eq!(chat.llm_deployment_name, "");
        assert_eq!(chat.llm_model_name, "");
        assert_eq!(chat.vectorstore_index, "");
        assert_eq!(chat.person, "");
    }

    #[test]
    fn project_keeps_present_fields() {
        let record = json!({
            "stime": { "epoch": 1700000000 },
            "messages": [{ "role": "user", "content": "hi" }],
            "last_interact": { "epoch": 1700000100 },
            "llm_deployment_name": "gpt-4-deploy",
            "llm_model_name": "gpt-4",
            "vectorstore_index": "kb-main",
            "overall_cost": { "total": "0.12" },
            "Person": "alice",
        });
        let chat = project_record(0, &record).unwrap();
        assert_eq!(chat.stime, json!({ "epoch": 1700000000 }));
        assert_eq!(chat.last_interact, json!({ "epoch": 1700000100 }));
        assert_eq!(chat.llm_deployment_name, "gpt-4-deploy");
        assert_eq!(chat.llm_model_name, "gpt-4");
        assert_eq!(chat.vectorstore_index, "kb-main");
        assert_eq!(chat.overall_cost, json!({ "total": "0.12" }));
        assert_eq!(chat.person, "alice");
    }

    #[test]
    fn project_passes_message_fields_through_verbatim() {
        let record = json!({
            "messages": [
                {
                    "role": "user",
                    "content": "hi",
                    "attachments": ["a.png"],
                    "feedback": { "score": 1 }
                },
                { "role": "user" }
            ]
        });
        let chat = project_record(0, &record).unwrap();
        assert_eq!(
            chat.messages[0].extra.get("attachments"),
            Some(&json!(["a.png"]))
        );
        assert_eq!(
            chat.messages[0].extra.get("feedback"),
            Some(&json!({ "score": 1 }))
        );
        assert_eq!(chat.messages[1].role.as_deref(), Some("user"));
        assert_eq!(chat.messages[1].content, None);
        assert_eq!(chat.messages[1].recorded_on, None);
    }

    #[test]
    fn project_reads_owner_from_capitalized_key_only() {
        let record = json!({
            "messages": [],
            "person": "lowercase-ignored",
        });
        let chat = project_record(0, &record).unwrap();
        assert_eq!(chat.person, "");
    }

    #[test]
    fn project_requires_messages() {
        let record = json!({ "Person": "alice" });
        let result = project_record(7, &record);
        assert!(matches!(
            result,
            Err(LoaderError::MissingMessages { index: 7 })
        ));
    }
}
