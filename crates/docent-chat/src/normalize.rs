//! Normalizes vendor wire lines into canonical stream events.
//!
//! Three shapes are accepted on the same path:
//!
//! - NDJSON `{"message":{"content":"..."}}` (Ollama)
//! - SSE `data: {"choices":[{"delta":{"content"|"refusal"|"reasoning_content":"..."}}]}`
//!   (OpenAI, DeepSeek)
//! - SSE `data: {"message":{"content"|"reasoning_content":"..."}}`
//!
//! Reasoning text is surfaced as an ordinary text delta.

use std::pin::Pin;

use futures::Stream;
use serde_json::Value;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::error::ChatError;
use crate::types::StreamEvent;

pub const SSE_DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

const DELTA_FIELDS: &[&str] = &["content", "refusal", "reasoning_content"];
const MESSAGE_FIELDS: &[&str] = &["content", "reasoning_content"];

/// What a single wire line amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank, keep-alive, or a frame without text.
    Skip,
    Text(String),
    Done,
}

/// Classify one raw line.
pub fn parse_line(line: &str) -> Result<LineOutcome, ChatError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return Ok(LineOutcome::Skip);
    }

    let payload = line
        .strip_prefix(SSE_DATA_PREFIX)
        .map(str::trim_start)
        .unwrap_or(line);

    if payload == DONE_SENTINEL {
        return Ok(LineOutcome::Done);
    }

    let json: Value = serde_json::from_str(payload)
        .map_err(|e| ChatError::MalformedEvent(format!("{} in {:?}", e, payload)))?;

    Ok(extract_text(&json)
        .map(LineOutcome::Text)
        .unwrap_or(LineOutcome::Skip))
}

fn extract_text(json: &Value) -> Option<String> {
    if let Some(delta) = json.pointer("/choices/0/delta") {
        return first_text(delta, DELTA_FIELDS);
    }
    if let Some(message) = json.get("message") {
        return first_text(message, MESSAGE_FIELDS);
    }
    first_text(json, &["reasoning_content"])
}

fn first_text(object: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|f| object.get(*f).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Turn raw lines into events.
///
/// Ends with exactly one `Done` (sentinel or end of input) or one `Error`
/// (transport failure). Nothing is read past the sentinel.
pub fn normalize<S>(lines: S) -> EventStream
where
    S: Stream<Item = Result<String, ChatError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        tokio::pin!(lines);

        while let Some(item) = lines.next().await {
            let line = match item {
                Ok(line) => line,
                Err(e) => {
                    yield StreamEvent::Error(e.to_string());
                    return;
                }
            };

            match parse_line(&line) {
                Ok(LineOutcome::Text(text)) => yield StreamEvent::TextDelta(text),
                Ok(LineOutcome::Skip) => {}
                Ok(LineOutcome::Done) => {
                    yield StreamEvent::Done;
                    return;
                }
                Err(e) => debug!("Skipping line: {}", e),
            }
        }

        yield StreamEvent::Done;
    })
}
