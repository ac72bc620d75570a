use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use petstore_core::config::{LlmConfig, LlmProvider};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::warn;

const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const OPENAI_BASE_URL: &str = "https://api.openai.com";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 1024;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Text completion over HTTP against the configured provider.
#[derive(Clone, Debug)]
pub struct HttpLlmClient {
    client: Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string());

        Ok(Self {
            client,
            provider: config.provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn endpoint(&self) -> String {
        let path = match self.provider {
            LlmProvider::Ollama => "/api/generate",
            LlmProvider::OpenAi => "/v1/chat/completions",
            LlmProvider::Anthropic => "/v1/messages",
        };
        format!("{}{path}", self.base_url)
    }

    fn request(&self, prompt: &str) -> RequestBuilder {
        let body = request_body(self.provider, &self.model, prompt);
        let builder = self.client.post(self.endpoint()).json(&body);

        match (self.provider, &self.api_key) {
            (LlmProvider::OpenAi, Some(key)) => builder.bearer_auth(key.expose_secret()),
            (LlmProvider::Anthropic, Some(key)) => builder
                .header("x-api-key", key.expose_secret())
                .header("anthropic-version", ANTHROPIC_VERSION),
            _ => builder,
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            let retryable = match self.request(prompt).send().await {
                Ok(response) if response.status().is_success() => {
                    let payload: Value =
                        response.json().await.context("llm response was not valid json")?;
                    return extract_text(self.provider, &payload).ok_or_else(|| {
                        anyhow!("llm response from {:?} carried no text", self.provider)
                    });
                }
                Ok(response) if response.status().is_server_error() => {
                    anyhow!("llm provider returned {}", response.status())
                }
                Ok(response) => {
                    let status = response.status();
                    let detail = response.text().await.unwrap_or_default();
                    bail!("llm provider rejected request with {status}: {}", truncate(&detail));
                }
                Err(error) => anyhow!(error).context("llm request failed"),
            };

            if attempt >= self.max_retries {
                return Err(retryable);
            }
            attempt += 1;
            warn!(
                event_name = "recommendations.llm.retry",
                attempt,
                max_retries = self.max_retries,
                error = %retryable,
                "retrying llm completion"
            );
            tokio::time::sleep(RETRY_BACKOFF * attempt).await;
        }
    }
}

fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => OPENAI_BASE_URL,
        LlmProvider::Anthropic => ANTHROPIC_BASE_URL,
        LlmProvider::Ollama => OLLAMA_BASE_URL,
    }
}

fn request_body(provider: LlmProvider, model: &str, prompt: &str) -> Value {
    match provider {
        LlmProvider::Ollama => json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "format": "json",
        }),
        LlmProvider::OpenAi => json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": { "type": "json_object" },
        }),
        LlmProvider::Anthropic => json!({
            "model": model,
            "max_tokens": MAX_OUTPUT_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        }),
    }
}

fn extract_text(provider: LlmProvider, payload: &Value) -> Option<String> {
    let text = match provider {
        LlmProvider::Ollama => payload.get("response")?.as_str()?.to_string(),
        LlmProvider::OpenAi => {
            payload.pointer("/choices/0/message/content")?.as_str()?.to_string()
        }
        LlmProvider::Anthropic => payload
            .get("content")?
            .as_array()?
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn truncate(detail: &str) -> &str {
    match detail.char_indices().nth(200) {
        Some((index, _)) => &detail[..index],
        None => detail,
    }
}
