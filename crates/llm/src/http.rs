//! HTTP provider for the generative-text endpoint.
//!
//! One POST per completion to `<base>/models/<model>:generateContent?key=<key>`.
//! The wire format only knows `user` and `model` turns, so a system message is
//! folded into the first user turn.

use crate::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmError, LlmProvider, Role,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Fixed per-call timeout; there is no retry.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Wire types ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Convert chat turns into wire contents. System text is prepended to the
/// first user turn; consecutive turns keep their order.
fn to_contents(messages: &[ChatMessage]) -> Vec<Content> {
    let mut system = Vec::new();
    let mut contents: Vec<Content> = Vec::new();
    for m in messages {
        match m.role {
            Role::System => system.push(m.content.as_str()),
            Role::User | Role::Assistant => {
                let role = if m.role == Role::User { "user" } else { "model" };
                contents.push(Content {
                    role: role.to_owned(),
                    parts: vec![Part { text: m.content.clone() }],
                });
            }
        }
    }

    if !system.is_empty() {
        let preamble = system.join("\n\n");
        match contents.iter_mut().find(|c| c.role == "user") {
            Some(first_user) => {
                if let Some(part) = first_user.parts.first_mut() {
                    part.text = format!("{preamble}\n\n{}", part.text);
                }
            }
            None => contents.insert(
                0,
                Content { role: "user".into(), parts: vec![Part { text: preamble }] },
            ),
        }
    }
    contents
}

// ── Provider ──

/// Generative-text provider with an API key query parameter.
pub struct GeminiProvider {
    model: String,
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Self {
        Self::with_timeout(model, api_key, base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        model: String,
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build http client with timeout, using default client");
                reqwest::Client::new()
            });
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Self {
            model,
            client,
            base_url: base.trim_end_matches('/').to_owned(),
            api_key,
            timeout,
        }
    }

    /// Endpoint without the key; the key is attached as a query parameter.
    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = GenerateRequest {
            contents: to_contents(&request.messages),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        let send = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send();

        let resp = match tokio::time::timeout(self.timeout, send).await {
            Err(_) => return Err(LlmError::Timeout),
            Ok(Err(e)) if e.is_timeout() => return Err(LlmError::Timeout),
            Ok(Err(e)) => return Err(LlmError::RequestFailed(e.to_string())),
            Ok(Ok(resp)) => resp,
        };

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, &text));
        }

        let api: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let content: String = api
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let (input_tokens, output_tokens) = api
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        Ok(CompletionResponse { content, input_tokens, output_tokens })
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>> {
        Box::pin(self.generate(request))
    }
}

/// Build a provider from environment variables.
/// Reads `RESBOT_LLM_API_KEY`, optionally `RESBOT_LLM_MODEL` and `RESBOT_LLM_BASE_URL`.
/// Returns `None` if no key is set.
pub fn from_env() -> Option<GeminiProvider> {
    let api_key = std::env::var("RESBOT_LLM_API_KEY").ok().filter(|k| !k.is_empty())?;
    let model = std::env::var("RESBOT_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
    let base_url = std::env::var("RESBOT_LLM_BASE_URL").ok();
    Some(GeminiProvider::new(model, api_key, base_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uses_model_path() {
        let p = GeminiProvider::new("gemini-1.5-flash".into(), "k".into(), None);
        assert_eq!(
            p.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(p.name(), "gemini");
    }

    #[test]
    fn custom_base_url_trims_slash() {
        let p = GeminiProvider::new("m".into(), "k".into(), Some("http://localhost:9000/".into()));
        assert_eq!(p.endpoint(), "http://localhost:9000/models/m:generateContent");
    }

    #[test]
    fn system_prompt_folds_into_first_user_turn() {
        let contents = to_contents(&[
            ChatMessage::system("konteks toko"),
            ChatMessage::user("halo"),
            ChatMessage::assistant("halo kak"),
            ChatMessage::user("harga netflix?"),
        ]);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert!(contents[0].parts[0].text.starts_with("konteks toko"));
        assert!(contents[0].parts[0].text.ends_with("halo"));
        assert_eq!(contents[1].role, "model");
    }

    #[test]
    fn system_only_becomes_user_turn() {
        let contents = to_contents(&[ChatMessage::system("hanya sistem")]);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, "user");
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: to_contents(&[ChatMessage::user("hi")]),
            generation_config: GenerationConfig { temperature: 0.5, max_output_tokens: 64 },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
    }

    #[test]
    fn response_parsing_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Halo "},{"text":"kak"}]}}],
                      "usageMetadata":{"promptTokenCount":5,"candidatesTokenCount":2}}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let content = parsed.candidates[0].content.as_ref().unwrap();
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(text, "Halo kak");
        assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, 5);
    }
}
