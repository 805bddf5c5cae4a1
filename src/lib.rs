//! feathergate-client is an async client for FeatherGate-style
//! OpenAI-compatible chat completion gateways.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the HTTP client, the request/response calls, and the
//!   streaming decode of `text/event-stream` completion bodies.
//! - [`api`] defines the chat/model/health payloads exchanged with the
//!   gateway. Response payloads are kept opaque apart from the single
//!   field paths the helpers read.
//! - [`error`] defines the error surface: all HTTP-level failures are
//!   reported as a [`ClientError`]; malformed stream payloads are never
//!   errors, they are skipped so the stream stays usable.
//! - [`utils`] holds URL normalization shared by every endpoint call.
//!
//! A typical streaming session:
//!
//! ```no_run
//! use feathergate_client::{ChatMessage, ChatRequest, FeatherGateClient};
//! use futures_util::StreamExt;
//!
//! # async fn run() -> Result<(), feathergate_client::ClientError> {
//! let client = FeatherGateClient::new("http://localhost:8080/v1");
//! let request = ChatRequest::new("gpt-4", vec![ChatMessage::user("Hello!")]);
//!
//! let mut stream = client.chat_stream(request).await?;
//! while let Some(chunk) = stream.next().await {
//!     if let Some(text) = chunk?.delta_content() {
//!         print!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod core;
pub mod error;
pub mod utils;

pub use crate::api::{
    ChatMessage, ChatRequest, ChatResponse, HealthStatus, ModelInfo, ModelsResponse, StreamChunk,
};
pub use crate::core::chat_stream::ChatStream;
pub use crate::core::client::{FeatherGateClient, DEFAULT_BASE_URL};
pub use crate::error::ClientError;
