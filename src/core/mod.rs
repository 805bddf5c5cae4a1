pub mod chat_stream;
pub mod client;
