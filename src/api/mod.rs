//! Payload types exchanged with the gateway.
//!
//! Request bodies are fully typed; response bodies are deliberately opaque.
//! The gateway (and whatever upstream provider it routes to) owns the
//! response schema — the client only ever reads a single field path out of
//! each body and passes the rest through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One message in a conversation. The role is passed through opaquely;
/// the gateway decides which roles it accepts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Body of a `POST {base}/chat/completions` call.
///
/// `extra` is an open mapping of provider-specific fields (`temperature`,
/// `max_tokens`, ...) flattened into the top level of the JSON body. The
/// client enforces no schema on it.
#[derive(Serialize, Clone, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    /// Builds a non-streaming request. [`FeatherGateClient::chat`] and
    /// [`FeatherGateClient::chat_stream`] set the `stream` flag themselves,
    /// so callers normally leave it alone.
    ///
    /// [`FeatherGateClient::chat`]: crate::FeatherGateClient::chat
    /// [`FeatherGateClient::chat_stream`]: crate::FeatherGateClient::chat_stream
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            extra: Map::new(),
        }
    }

    /// Adds a provider-specific field to the request body.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A non-streaming completion body, kept as opaque JSON.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct ChatResponse(Value);

impl ChatResponse {
    /// Text of the first choice (`choices[0].message.content`), if present.
    pub fn content(&self) -> Option<&str> {
        self.0
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// One decoded event from a streaming completion body, kept as opaque JSON.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct StreamChunk(Value);

impl StreamChunk {
    /// Incremental text of the first choice (`choices[0].delta.content`).
    /// Absent means this chunk carried no text (role frames, stop frames).
    pub fn delta_content(&self) -> Option<&str> {
        self.0
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for StreamChunk {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ModelInfo {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `GET {base}/models`.
#[derive(Deserialize, Clone, Debug)]
pub struct ModelsResponse {
    pub data: Vec<ModelInfo>,
}

/// Body of `GET {base}/health`. FeatherGate reports
/// `{"status":"ok","service":"feathergate"}`; extra fields are kept.
#[derive(Deserialize, Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
