//! Vendor adapters and the shared HTTP connection pool.
//!
//! Every adapter posts a streaming chat request and hands back the raw
//! response lines untouched. Ollama answers with NDJSON, OpenAI and DeepSeek
//! with SSE; telling them apart is the normalizer's job.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use docent_core::DocentConfig;
use futures::Stream;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::prompt::Prompt;
use crate::types::Manufacturer;

/// Raw upstream lines, newline stripped. An `Err` item ends the sequence.
pub type RawLines = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
pub const MAX_CONCURRENT_STREAMS: usize = 100;
pub const MAX_IDLE_CONNECTIONS: usize = 10;

/// Connection pool shared by all adapters.
///
/// Idle connections are bounded by the client; concurrent upstream streams
/// are bounded by a semaphore whose permit lives as long as the stream.
#[derive(Clone)]
pub struct HttpPool {
    client: Client,
    slots: Arc<Semaphore>,
}

impl HttpPool {
    pub fn new(
        max_concurrent: usize,
        max_idle: usize,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .pool_max_idle_per_host(max_idle)
            .build()?;
        Ok(Self {
            client,
            slots: Arc::new(Semaphore::new(max_concurrent)),
        })
    }

    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(MAX_CONCURRENT_STREAMS, MAX_IDLE_CONNECTIONS, UPSTREAM_TIMEOUT)
    }

    /// Free stream slots.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

/// One vendor endpoint.
#[derive(Clone)]
pub struct ProviderAdapter {
    manufacturer: Manufacturer,
    base_url: String,
    api_key: Option<String>,
    pool: HttpPool,
}

impl ProviderAdapter {
    pub fn new(
        manufacturer: Manufacturer,
        base_url: impl Into<String>,
        api_key: Option<String>,
        pool: HttpPool,
    ) -> Self {
        Self {
            manufacturer,
            base_url: base_url.into(),
            api_key,
            pool,
        }
    }

    fn path(&self) -> &'static str {
        match self.manufacturer {
            Manufacturer::Ollama => "/chat",
            Manufacturer::OpenAI | Manufacturer::DeepSeek => "/chat/completions",
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path())
    }

    /// DeepSeek accepts `prefix` continuation only on its `/beta` base URL.
    fn prefix_endpoint(&self) -> bool {
        self.manufacturer != Manufacturer::DeepSeek
            || self.base_url.trim_end_matches('/').ends_with("/beta")
    }

    /// Vendor request body for a prompt.
    pub fn request_body(&self, prompt: &Prompt, model: &str) -> Value {
        let mut messages: Vec<Value> = prompt
            .messages
            .iter()
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let mut body = json!({
            "model": model,
            "stream": true,
        });

        if prompt.continuation {
            match self.manufacturer {
                Manufacturer::Ollama => body["prefix"] = json!(true),
                Manufacturer::DeepSeek => {
                    if !self.prefix_endpoint() {
                        debug!(
                            "DeepSeek honours prefix continuation only under /beta; {} may reject or ignore it",
                            self.base_url
                        );
                    }
                    if let Some(last) = messages.last_mut() {
                        last["prefix"] = json!(true);
                    }
                }
                Manufacturer::OpenAI => {
                    debug!("OpenAI has no prefix continuation; sending as a normal turn");
                }
            }
        }

        body["messages"] = Value::Array(messages);
        body
    }

    /// Open a streaming chat request.
    ///
    /// Non-2xx answers are read in full and returned as `UpstreamHttp`; no
    /// lines are produced in that case.
    pub async fn stream_chat(&self, prompt: &Prompt, model: &str) -> Result<RawLines, ChatError> {
        let slot = self
            .pool
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ChatError::ConnectionDropped("connection pool closed".into()))?;

        let url = self.endpoint();
        let body = self.request_body(prompt, model);

        debug!("Streaming from {} with model {}", url, model);

        let mut request = self
            .pool
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if self.manufacturer != Manufacturer::Ollama {
            match &self.api_key {
                Some(key) => request = request.bearer_auth(key),
                None => warn!("No API key configured for {}", self.manufacturer),
            }
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("{} returned {}: {}", self.manufacturer, status, body);
            return Err(ChatError::UpstreamHttp { status, body });
        }

        let lines = split_lines(response.bytes_stream());
        Ok(Box::pin(async_stream::stream! {
            let _slot = slot;
            tokio::pin!(lines);
            while let Some(line) = lines.next().await {
                yield line;
            }
        }))
    }
}

/// Split a chunked byte stream into lines, in arrival order.
///
/// A trailing line without a newline is yielded when the source ends. A
/// transport error is yielded once as `ConnectionDropped` and ends the lines.
pub fn split_lines<S, B, E>(chunks: S) -> RawLines
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        tokio::pin!(chunks);
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => buffer.extend_from_slice(bytes.as_ref()),
                Err(e) => {
                    yield Err(ChatError::ConnectionDropped(e.to_string()));
                    return;
                }
            }

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                yield Ok(decode_line(&line));
            }
        }

        if !buffer.is_empty() {
            yield Ok(decode_line(&buffer));
        }
    })
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(|c| c == '\n' || c == '\r')
        .to_string()
}

/// The three adapters, sharing one pool.
#[derive(Clone)]
pub struct ProviderSet {
    ollama: ProviderAdapter,
    openai: ProviderAdapter,
    deepseek: ProviderAdapter,
}

impl ProviderSet {
    pub fn new(ollama: ProviderAdapter, openai: ProviderAdapter, deepseek: ProviderAdapter) -> Self {
        Self {
            ollama,
            openai,
            deepseek,
        }
    }

    /// Build adapters from configured endpoints and keys.
    pub fn from_config(config: &DocentConfig, pool: HttpPool) -> Self {
        Self::new(
            ProviderAdapter::new(
                Manufacturer::Ollama,
                &config.endpoints.ollama,
                None,
                pool.clone(),
            ),
            ProviderAdapter::new(
                Manufacturer::OpenAI,
                &config.endpoints.openai,
                config.openai_api_key.clone(),
                pool.clone(),
            ),
            ProviderAdapter::new(
                Manufacturer::DeepSeek,
                &config.endpoints.deepseek,
                config.deepseek_api_key.clone(),
                pool,
            ),
        )
    }

    pub fn get(&self, manufacturer: Manufacturer) -> &ProviderAdapter {
        match manufacturer {
            Manufacturer::Ollama => &self.ollama,
            Manufacturer::OpenAI => &self.openai,
            Manufacturer::DeepSeek => &self.deepseek,
        }
    }
}
