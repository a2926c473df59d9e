//! Chat orchestration: prompt → adapter → normalizer → plain text.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

use crate::catalog::ModelProfile;
use crate::error::ChatError;
use crate::normalize::{normalize, EventStream};
use crate::prompt::{build_prompt, Params, Prompt, KEY_PROMPT_TYPE, KEY_QUERY, KEY_TEXT};
use crate::providers::ProviderSet;
use crate::templates::TemplateStore;
use crate::types::{ChatMessage, Manufacturer, ModelChoice, StreamEvent};

/// Prefix of the single chunk that reports a failed request.
pub const ERROR_PREFIX: &str = "Error generating response: ";

/// Plain-text chunks for the HTTP layer.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// One chat turn as seen by the orchestrator.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub message: String,
    pub model: ModelChoice,
    pub history: Vec<ChatMessage>,
    pub prompt_type: String,
    /// Extracted document text, if the turn is grounded in a document.
    pub context: Option<String>,
}

#[derive(Clone)]
pub struct ChatService {
    templates: Arc<TemplateStore>,
    providers: ProviderSet,
}

impl ChatService {
    pub fn new(templates: Arc<TemplateStore>, providers: ProviderSet) -> Self {
        Self {
            templates,
            providers,
        }
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    /// Stream the reply to one turn.
    ///
    /// Never fails: any request-level or transport error becomes one final
    /// chunk starting with [`ERROR_PREFIX`].
    pub fn generate_response(&self, turn: ChatTurn) -> TextStream {
        let service = self.clone();

        Box::pin(async_stream::stream! {
            let events = match service.open(&turn).await {
                Ok(events) => events,
                Err(e) => {
                    warn!("Chat request failed: {}", e);
                    yield format!("{}{}", ERROR_PREFIX, e);
                    return;
                }
            };

            tokio::pin!(events);
            while let Some(event) = events.next().await {
                match event {
                    StreamEvent::TextDelta(text) => yield text,
                    StreamEvent::Done => {}
                    StreamEvent::Error(e) => {
                        error!("Chat stream interrupted: {}", e);
                        yield format!("{}{}", ERROR_PREFIX, e);
                    }
                }
            }
        })
    }

    /// Assemble the prompt a turn would send, without touching the network.
    ///
    /// Fails on an unknown vendor or category; an empty prompt is returned
    /// as is.
    pub fn assemble(&self, turn: &ChatTurn) -> Result<(Manufacturer, Prompt), ChatError> {
        let manufacturer: Manufacturer = turn.model.manufacturer.parse()?;
        let profile = ModelProfile::for_model(manufacturer, &turn.model.model);

        let params = Params::new()
            .set(KEY_QUERY, turn.message.as_str())
            .set(KEY_TEXT, turn.context.clone().unwrap_or_default())
            .set(KEY_PROMPT_TYPE, turn.prompt_type.as_str())
            .with_history(turn.history.clone());

        let category = params.category();
        if self.templates.category(&category).is_none() {
            return Err(ChatError::UnknownPromptCategory(category));
        }

        Ok((manufacturer, build_prompt(&self.templates, &params, profile)))
    }

    async fn open(&self, turn: &ChatTurn) -> Result<EventStream, ChatError> {
        let (manufacturer, prompt) = self.assemble(turn)?;
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt(turn.prompt_type.clone()));
        }

        info!(
            "Chat: {} {} category={} messages={} continuation={}",
            manufacturer,
            turn.model.model,
            turn.prompt_type,
            prompt.messages.len(),
            prompt.continuation
        );

        let lines = self
            .providers
            .get(manufacturer)
            .stream_chat(&prompt, &turn.model.model)
            .await?;

        Ok(normalize(lines))
    }
}
