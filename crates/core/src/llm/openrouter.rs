use crate::config::Settings;
use crate::llm::json;
use crate::llm::{LlmClient, LlmError, Provider};
use crate::prompt::SYSTEM_PROMPT;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_TITLE: &str = "Islamic Stock Scorer";

#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openrouter_api_key()?;
        let base_url = settings
            .openrouter_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model =
            std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let temperature = std::env::var("OPENROUTER_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);
        let referer = std::env::var("OPENROUTER_REFERER").ok();
        let title =
            std::env::var("OPENROUTER_TITLE").unwrap_or_else(|_| DEFAULT_TITLE.to_string());

        // No timeout unless one is asked for explicitly.
        let timeout = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        Self::new(api_key, base_url, model, temperature, referer.as_deref(), &title, timeout)
    }

    pub fn new(
        api_key: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        referer: Option<&str>,
        title: &str,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .context("OPENROUTER_API_KEY is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        if let Some(referer) = referer {
            headers.insert("HTTP-Referer", HeaderValue::from_str(referer)?);
        }
        headers.insert("X-Title", HeaderValue::from_str(title)?);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build reqwest client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            temperature,
        })
    }

    async fn create_completion(
        &self,
        req: &ChatCompletionRequest<'_>,
    ) -> Result<ChatCompletionResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let res = self.http.post(url).json(req).send().await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(LlmError::Http { status, body: text });
        }

        serde_json::from_str::<ChatCompletionResponse>(&text).map_err(|source| {
            LlmError::Envelope {
                source,
                raw_response: text,
            }
        })
    }

    fn response_payload(res: ChatCompletionResponse) -> Result<Value, LlmError> {
        let content = res
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::MissingContent)?;

        match content {
            Value::String(text) => json::parse_json(&text),
            Value::Null => Err(LlmError::MissingContent),
            // Some providers hand back the JSON object itself when json_object is requested.
            other => Ok(other),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenRouterClient {
    fn provider(&self) -> Provider {
        Provider::OpenRouter
    }

    async fn complete_json(&self, prompt: &str) -> Result<Value, LlmError> {
        let req = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let res = self.create_completion(&req).await.inspect_err(|err| {
            tracing::warn!(model = %self.model, error = %err, "OpenRouter completion failed");
        })?;

        Self::response_payload(res).inspect_err(|err| {
            tracing::warn!(
                model = %self.model,
                error = %err,
                raw_output = err.raw_output().unwrap_or_default(),
                "OpenRouter completion did not contain usable JSON"
            );
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<Value>,
}
