//! Completion gateway — wire types and HTTP client for an
//! OpenAI-compatible chat-completions endpoint.
//!
//! This crate owns the request/response contract: transcript messages,
//! tool-call payloads, tool schemas, and a stateless [`Client`] that
//! performs one bounded request per call. The conversation logic lives
//! in the `runtime` crate; the seam between them is the
//! [`CompletionBackend`] trait.
//!
//! # Example
//!
//! ```no_run
//! use gateway::{Client, CompletionBackend, Message};
//!
//! # async fn example() -> gateway::Result<()> {
//! let client = Client::builder("https://api.example.com/v1", "sk-...")
//!     .model("gpt-4o-mini")
//!     .build();
//!
//! let transcript = vec![
//!     Message::system("You are a helpful assistant."),
//!     Message::user("Hello!"),
//! ];
//! let reply = client.complete(&transcript, &[]).await?;
//! println!("{}", reply.content.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;

pub use client::{Client, ClientBuilder, CompletionBackend};
pub use error::{Error, Result};
pub use protocol::{FunctionCall, Message, Role, ToolCall, ToolDefinition};
