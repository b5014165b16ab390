//! Hydra runtime — conversation orchestration and builtin tools.
//!
//! The runtime sits between the session loop (the `cli` crate) and the
//! completion endpoint (the `gateway` crate). It owns the transcript
//! and drives each turn through the tool-calling protocol:
//!
//! 1. Append the user message and request a completion, advertising
//!    tool schemas according to the session's [`ToolPolicy`].
//! 2. If the model requests tool calls, dispatch each one locally in
//!    request order and append its result to the transcript.
//! 3. Request a followup completion (without tools) for the final
//!    answer.
//!
//! # Example
//!
//! ```no_run
//! use gateway::Client;
//! use runtime::{Session, ToolRegistry};
//!
//! # async fn example() -> runtime::Result<()> {
//! let client = Client::builder("https://api.example.com/v1", "sk-...").build();
//! let mut session = Session::new(
//!     client,
//!     ToolRegistry::builtin(),
//!     "You are a helpful assistant.",
//! );
//!
//! let turn = session.chat("What's the weather in Moscow, Russia?").await?;
//! println!("{}", turn.reply);
//! # Ok(())
//! # }
//! ```

mod error;
mod session;
mod tools;

pub use error::{Error, Result};
pub use session::{Session, ToolInvocation, ToolPolicy, Turn};
pub use tools::{ToolError, ToolRegistry};
