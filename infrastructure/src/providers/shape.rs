//! Backend request/response layouts
//!
//! | Shape | Request | Text | Usage |
//! |-------|---------|------|-------|
//! | `openai` | chat completions | `choices[0].message.content` | `usage.prompt_tokens` / `usage.completion_tokens` |
//! | `ollama` | `/api/generate` | `response` | `prompt_eval_count` / `eval_count` |
//! | `llamacpp` | `/completion` | `content` | `tokens_evaluated` / `tokens_predicted` |
//!
//! Missing usage counters are treated as zero; missing text is a malformed
//! response.

use parley_application::ports::model_invoker::{Completion, InvocationError, InvocationRequest};
use parley_domain::{Model, TokenUsage};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResponseShape {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "llamacpp")]
    LlamaCpp,
}

impl ResponseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseShape::OpenAi => "openai",
            ResponseShape::Ollama => "ollama",
            ResponseShape::LlamaCpp => "llamacpp",
        }
    }

    /// Build the JSON body this backend expects for `request`.
    pub fn request_body(&self, model: &Model, request: &InvocationRequest) -> Value {
        match self {
            ResponseShape::OpenAi => {
                let mut body = json!({
                    "model": model.as_str(),
                    "messages": [{"role": "user", "content": request.prompt}],
                    "stream": false,
                });
                insert_opt(&mut body, "max_tokens", request.max_tokens.map(Value::from));
                insert_opt(&mut body, "temperature", request.temperature.map(Value::from));
                body
            }
            ResponseShape::Ollama => {
                let mut options = json!({});
                insert_opt(&mut options, "num_predict", request.max_tokens.map(Value::from));
                insert_opt(&mut options, "temperature", request.temperature.map(Value::from));
                json!({
                    "model": model.as_str(),
                    "prompt": request.prompt,
                    "stream": false,
                    "options": options,
                })
            }
            ResponseShape::LlamaCpp => {
                let mut body = json!({
                    "prompt": request.prompt,
                    "stream": false,
                });
                insert_opt(&mut body, "n_predict", request.max_tokens.map(Value::from));
                insert_opt(&mut body, "temperature", request.temperature.map(Value::from));
                body
            }
        }
    }

    /// Normalize a backend response into `{text, usage}`.
    pub fn normalize(&self, body: &Value) -> Result<Completion, InvocationError> {
        let (text, prompt_tokens, completion_tokens) = match self {
            ResponseShape::OpenAi => {
                let choice = body
                    .pointer("/choices/0")
                    .ok_or_else(|| malformed(self, "no choices"))?;
                let text = choice
                    .pointer("/message/content")
                    .or_else(|| choice.get("text"))
                    .and_then(Value::as_str);
                (
                    text,
                    counter(body, "/usage/prompt_tokens"),
                    counter(body, "/usage/completion_tokens"),
                )
            }
            ResponseShape::Ollama => (
                body.get("response").and_then(Value::as_str),
                counter(body, "/prompt_eval_count"),
                counter(body, "/eval_count"),
            ),
            ResponseShape::LlamaCpp => (
                body.get("content").and_then(Value::as_str),
                counter(body, "/tokens_evaluated"),
                counter(body, "/tokens_predicted"),
            ),
        };

        let text = text.ok_or_else(|| malformed(self, "missing completion text"))?;
        Ok(Completion::new(
            text,
            TokenUsage::new(prompt_tokens, completion_tokens),
        ))
    }
}

impl std::fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResponseShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ResponseShape::OpenAi),
            "ollama" => Ok(ResponseShape::Ollama),
            "llamacpp" | "llama.cpp" | "llama-cpp" => Ok(ResponseShape::LlamaCpp),
            _ => Err(format!("Unknown response shape: {}", s)),
        }
    }
}

fn insert_opt(body: &mut Value, key: &str, value: Option<Value>) {
    if let (Some(value), Value::Object(map)) = (value, body) {
        map.insert(key.to_string(), value);
    }
}

fn counter(body: &Value, pointer: &str) -> u64 {
    body.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

fn malformed(shape: &ResponseShape, detail: &str) -> InvocationError {
    InvocationError::MalformedResponse(format!("{} response: {}", shape, detail))
}
