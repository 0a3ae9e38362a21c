use super::{AssistantBackend, ChatError, ChatResult};
use crate::config::AssistantConfig;
use crate::types::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Chat-completion endpoint speaking `{messages, model, web_search}` in and
/// `{choices: [{message: {content}}]}` out.
pub struct HttpAssistant {
    client: Client,
    endpoint: Option<String>,
    model: String,
    web_search: bool,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
    model: &'a str,
    web_search: bool,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ReplyChoice {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
}

/// Pulls the first choice's content out of a response body.
///
/// Anything that is not JSON, has no choices, or carries blank content is a
/// missing reply.
pub fn extract_reply(body: &str) -> ChatResult<String> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|_| ChatError::MissingReply)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(ChatError::MissingReply)
}

impl HttpAssistant {
    pub fn new(config: &AssistantConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &AssistantConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            web_search: config.web_search,
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        }
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistant {
    async fn complete(&self, messages: &[ChatMessage]) -> ChatResult<String> {
        let endpoint = self.endpoint.as_deref().ok_or(ChatError::NotConfigured)?;

        let mut request = self
            .client
            .post(endpoint)
            .timeout(self.timeout)
            .json(&CompletionRequest {
                messages,
                model: &self.model,
                web_search: self.web_search,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(count = messages.len(), model = %self.model, "sending assistant request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        extract_reply(&body)
    }
}
