//! Boundary to the reasoning component (the LLM that picks actions).
//!
//! Whatever the model returns is validated into a list of
//! [`ReasoningStep`]s before the dispatcher sees it.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::agent::memory::{Message, Role};
use crate::config::Config;

pub const SYSTEM_PROMPT: &str = "You are a helpful agent that can interact onchain using an Ethereum Account Wallet. \
You have tools to send transactions, query blockchain data, and interact with contracts. \
If you run into a 5XX (internal) error, ask the user to try again later.";

const REASONING_TIMEOUT: Duration = Duration::from_secs(60);

/// Catalogue entry describing one callable action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReasoningStep {
    /// Text addressed directly to the user
    Text { text: String },
    /// Request to run an action
    ToolCall { name: String, arguments: Value },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReasoningOutput {
    pub steps: Vec<ReasoningStep>,
}

impl ReasoningOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            steps: vec![ReasoningStep::Text { text: text.into() }],
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            steps: vec![ReasoningStep::ToolCall {
                name: name.into(),
                arguments,
            }],
        }
    }
}

#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("reasoning request failed: {0}")]
    Transport(String),
    #[error("reasoning API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed reasoning response: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Chooses what to do next given the conversation so far.
    async fn plan(
        &self,
        history: &[Message],
        catalogue: &[ActionSpec],
    ) -> Result<ReasoningOutput, ReasoningError>;
}

/// [`ReasoningEngine`] backed by the Gemini `generateContent` API.
pub struct GeminiReasoner {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiReasoner {
    pub fn new(api_key: &str, model: &str, base_url: &str, temperature: f32) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(REASONING_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: SecretString::new(api_key.to_string()),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = config
            .google_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("GOOGLE_API_KEY must be set to initialize the agent"))?;
        Self::new(
            api_key,
            &config.reasoning_model,
            &config.reasoning_api_url,
            config.reasoning_temperature,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Request body for `generateContent`.
    pub fn build_request(&self, history: &[Message], catalogue: &[ActionSpec]) -> Value {
        let mut contents: Vec<Value> = Vec::new();
        for message in history {
            let (role, text) = match message.role {
                Role::User => ("user", message.content.clone()),
                Role::Agent => ("model", message.content.clone()),
                Role::ToolResult => ("model", format!("[tool result] {}", message.content)),
            };
            // Consecutive turns of the same role are merged into one content.
            let same_role = contents.last().map(|last| last["role"] == role).unwrap_or(false);
            if same_role {
                if let Some(parts) = contents.last_mut().and_then(|last| last["parts"].as_array_mut()) {
                    parts.push(json!({ "text": text }));
                }
            } else {
                contents.push(json!({ "role": role, "parts": [{ "text": text }] }));
            }
        }

        let declarations: Vec<Value> = catalogue.iter().map(function_declaration).collect();

        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": contents,
            "generationConfig": { "temperature": self.temperature },
        });
        if !declarations.is_empty() {
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }
        body
    }
}

fn function_declaration(spec: &ActionSpec) -> Value {
    let mut decl = Map::new();
    decl.insert("name".into(), json!(spec.name));
    decl.insert("description".into(), json!(spec.description));
    // Gemini rejects OBJECT schemas with no properties.
    let has_properties = spec.parameters["properties"]
        .as_object()
        .map(|props| !props.is_empty())
        .unwrap_or(false);
    if has_properties {
        decl.insert("parameters".into(), spec.parameters.clone());
    }
    Value::Object(decl)
}

/// Validates a `generateContent` response into reasoning steps.
pub fn parse_response(body: &Value) -> Result<ReasoningOutput, ReasoningError> {
    let candidate = body["candidates"]
        .as_array()
        .and_then(|candidates| candidates.first())
        .ok_or_else(|| ReasoningError::MalformedResponse("no candidates in response".into()))?;

    let parts = candidate["content"]["parts"].as_array().cloned().unwrap_or_default();

    let mut steps = Vec::new();
    for part in parts {
        if let Some(call) = part.get("functionCall") {
            let name = call["name"]
                .as_str()
                .ok_or_else(|| ReasoningError::MalformedResponse("functionCall without a name".into()))?;
            let arguments = call.get("args").cloned().unwrap_or_else(|| json!({}));
            steps.push(ReasoningStep::ToolCall {
                name: name.to_string(),
                arguments,
            });
        } else if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.trim().is_empty() {
                steps.push(ReasoningStep::Text { text: text.to_string() });
            }
        } else {
            debug!("Ignoring unsupported response part: {}", part);
        }
    }
    Ok(ReasoningOutput { steps })
}

#[async_trait]
impl ReasoningEngine for GeminiReasoner {
    async fn plan(
        &self,
        history: &[Message],
        catalogue: &[ActionSpec],
    ) -> Result<ReasoningOutput, ReasoningError> {
        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&self.build_request(history, catalogue))
            .send()
            .await
            .map_err(|e| ReasoningError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // Gemini errors are JSON; gateways in front of it may send HTML.
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or(body);
            return Err(ReasoningError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ReasoningError::MalformedResponse(e.to_string()))?;
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::mock;

    fn catalogue() -> Vec<ActionSpec> {
        vec![
            ActionSpec {
                name: "buy_token".into(),
                description: "Buy a token".into(),
                parameters: json!({
                    "type": "object",
                    "properties": {"contract_address": {"type": "string"}},
                    "required": ["contract_address"]
                }),
            },
            ActionSpec {
                name: "get_wallet_details".into(),
                description: "Wallet details".into(),
                parameters: json!({"type": "object", "properties": {}, "required": []}),
            },
        ]
    }

    fn reasoner(base_url: &str) -> GeminiReasoner {
        GeminiReasoner::new("test-key", "gemini-2.0-flash", base_url, 0.7).unwrap()
    }

    #[test]
    fn request_merges_roles_and_declares_functions() {
        let history = vec![
            Message::user("buy something"),
            Message::tool_result("buy_token: Purchased"),
            Message::agent("Done"),
            Message::user("thanks"),
        ];
        let body = reasoner("http://localhost").build_request(&history, &catalogue());

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"].as_array().unwrap().len(), 2);

        let decls = body["tools"][0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(decls.len(), 2);
        assert!(decls[0].get("parameters").is_some());
        assert!(decls[1].get("parameters").is_none());
    }

    #[test]
    fn parses_text_and_function_calls_in_order() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Buying now."},
                        {"functionCall": {"name": "buy_token", "args": {"contract_address": "0xabc"}}},
                        {"inlineData": {"mimeType": "image/png"}}
                    ]
                }
            }]
        });

        let output = parse_response(&body).unwrap();
        assert_eq!(
            output.steps,
            vec![
                ReasoningStep::Text { text: "Buying now.".into() },
                ReasoningStep::ToolCall {
                    name: "buy_token".into(),
                    arguments: json!({"contract_address": "0xabc"}),
                },
            ]
        );
    }

    #[test]
    fn missing_candidates_is_malformed() {
        let err = parse_response(&json!({"promptFeedback": {}})).unwrap_err();
        assert!(matches!(err, ReasoningError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn api_errors_are_reported_with_status() {
        let _m = mock("POST", "/gemini-err/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": {"code": 503, "message": "overloaded"}}"#)
            .create();

        let base = format!("{}/gemini-err", mockito::server_url());
        let err = reasoner(&base)
            .plan(&[Message::user("hi")], &catalogue())
            .await
            .unwrap_err();
        match err {
            ReasoningError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_pages_keep_their_status() {
        let _m = mock("POST", "/gemini-html/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(502)
            .with_header("content-type", "text/html")
            .with_body("<html><body>Bad Gateway</body></html>")
            .create();

        let base = format!("{}/gemini-html", mockito::server_url());
        let err = reasoner(&base)
            .plan(&[Message::user("hi")], &catalogue())
            .await
            .unwrap_err();
        match err {
            ReasoningError::Api { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_call_returns_steps() {
        let _m = mock("POST", "/gemini-ok/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_header("content-type", "application/json")
            .with_body(
                json!({"candidates": [{"content": {"parts": [{"text": "Hello!"}]}}]}).to_string(),
            )
            .create();

        let base = format!("{}/gemini-ok", mockito::server_url());
        let output = reasoner(&base).plan(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(output, ReasoningOutput::text("Hello!"));
    }
}
