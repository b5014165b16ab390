//! Conversation session and turn orchestration.
//!
//! A session owns the transcript and drives one turn at a time through
//! a two-phase protocol: a first completion call that may request tool
//! invocations, local dispatch of those invocations in request order,
//! and a followup call (without tool definitions) that must produce
//! the final answer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tools::ToolRegistry;
use crate::{Error, Result};
use gateway::{CompletionBackend, Message, ToolDefinition};

/// When tool definitions are sent with the first call of a turn.
///
/// The followup call inside a turn never advertises tools; the model
/// is expected to answer, not to request more work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolPolicy {
    /// Advertise on every turn's first call.
    #[default]
    EveryTurn,
    /// Advertise only on the first successful call of the session,
    /// keeping request payloads minimal afterwards.
    FirstTurnOnly,
}

/// One executed tool call, recorded for display by the caller.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    /// Raw argument JSON as the model sent it.
    pub arguments: String,
    pub output: String,
}

/// Outcome of a completed turn.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Final assistant text.
    pub reply: String,
    /// Tool calls executed during the turn, in request order.
    pub invocations: Vec<ToolInvocation>,
}

/// A conversation session.
///
/// The transcript is owned exclusively by the session and is
/// append-only: the one exception is the rollback of a user message
/// whose turn produced no visible outcome.
pub struct Session<B: CompletionBackend> {
    backend: B,
    registry: ToolRegistry,
    policy: ToolPolicy,
    tools_advertised: bool,
    messages: Vec<Message>,
}

impl<B: CompletionBackend> Session<B> {
    /// Create a session seeded with a system message.
    pub fn new(backend: B, registry: ToolRegistry, system: impl Into<String>) -> Self {
        Self {
            backend,
            registry,
            policy: ToolPolicy::default(),
            tools_advertised: false,
            messages: vec![Message::system(system)],
        }
    }

    /// Set the tool-advertising policy.
    pub fn with_policy(mut self, policy: ToolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The full message history, system message included.
    pub fn transcript(&self) -> &[Message] {
        &self.messages
    }

    fn tools_for_first_call(&self) -> &[ToolDefinition] {
        match self.policy {
            ToolPolicy::EveryTurn => self.registry.definitions(),
            ToolPolicy::FirstTurnOnly if !self.tools_advertised => self.registry.definitions(),
            ToolPolicy::FirstTurnOnly => &[],
        }
    }

    /// Run one turn: send the user input, execute any tool calls the
    /// model requests, and return the final assistant reply.
    ///
    /// On a first-call failure the user message is rolled back and the
    /// transcript is exactly as it was before the turn. On a followup
    /// failure the tool results remain in the transcript; they are
    /// independently meaningful progress.
    pub async fn chat(&mut self, input: &str) -> Result<Turn> {
        self.messages.push(Message::user(input));

        let tools = self.tools_for_first_call();
        let reply = match self.backend.complete(&self.messages, tools).await {
            Ok(reply) => reply,
            Err(e) => {
                self.messages.pop();
                return Err(e.into());
            }
        };
        self.tools_advertised = true;

        if !reply.has_tool_calls() {
            let text = reply.content.clone().unwrap_or_default();
            self.messages.push(reply);
            return Ok(Turn {
                reply: text,
                invocations: Vec::new(),
            });
        }

        // The request goes into the transcript before any of its
        // results, and every call id gets exactly one result message,
        // in request order.
        let calls = reply.tool_calls.clone();
        self.messages.push(reply);

        let mut invocations = Vec::with_capacity(calls.len());
        for call in &calls {
            debug!(tool = %call.function.name, id = %call.id, "executing tool call");
            let output = self
                .registry
                .dispatch(&call.function.name, &call.function.arguments);
            self.messages.push(Message::tool(&call.id, &output));
            invocations.push(ToolInvocation {
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
                output,
            });
        }

        let final_reply = self.backend.complete(&self.messages, &[]).await?;
        if final_reply.has_tool_calls() {
            return Err(Error::Protocol(
                "model requested tools on the followup call".into(),
            ));
        }

        let text = final_reply.content.clone().unwrap_or_default();
        self.messages.push(final_reply);
        Ok(Turn {
            reply: text,
            invocations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{Role, ToolCall};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const SYSTEM: &str = "You are a helpful assistant.";

    /// Backend that replays scripted replies and records how many tool
    /// definitions each call advertised.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<gateway::Result<Message>>>,
        tools_advertised: Mutex<Vec<usize>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<gateway::Result<Message>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                tools_advertised: Mutex::new(Vec::new()),
            }
        }

        fn advertised(&self) -> Vec<usize> {
            self.tools_advertised.lock().unwrap().clone()
        }
    }

    impl CompletionBackend for &ScriptedBackend {
        async fn complete(
            &self,
            _messages: &[Message],
            tools: &[ToolDefinition],
        ) -> gateway::Result<Message> {
            self.tools_advertised.lock().unwrap().push(tools.len());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted reply available")
        }
    }

    fn assistant_with_calls(calls: Vec<ToolCall>) -> Message {
        Message {
            role: Role::Assistant,
            content: None,
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    fn network_error() -> gateway::Error {
        gateway::Error::Network("connection refused".into())
    }

    #[tokio::test]
    async fn plain_turn_grows_transcript_by_two() {
        let backend = ScriptedBackend::new(vec![Ok(Message::assistant("hi there"))]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        let turn = session.chat("hello").await.unwrap();

        assert_eq!(turn.reply, "hi there");
        assert!(turn.invocations.is_empty());
        // system + user + assistant
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[1].role, Role::User);
        assert_eq!(session.transcript()[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn weather_turn_appends_four_messages_in_order() {
        let backend = ScriptedBackend::new(vec![
            Ok(assistant_with_calls(vec![ToolCall::function(
                "call_1",
                "get_current_weather",
                r#"{"location":"Moscow, Russia"}"#,
            )])),
            Ok(Message::assistant("It is snowing in Moscow at -5°C.")),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        let turn = session
            .chat("What's the weather in Moscow, Russia?")
            .await
            .unwrap();

        assert_eq!(turn.reply, "It is snowing in Moscow at -5°C.");
        assert_eq!(turn.invocations.len(), 1);
        assert_eq!(
            turn.invocations[0].output,
            "Weather in Moscow, Russia: -5°C, snow, humidity 85%"
        );

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[1].role, Role::User);
        assert_eq!(transcript[2].role, Role::Assistant);
        assert!(transcript[2].has_tool_calls());
        assert_eq!(transcript[3].role, Role::Tool);
        assert_eq!(transcript[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(transcript[4].role, Role::Assistant);
    }

    #[tokio::test]
    async fn multiple_tool_calls_answered_in_request_order() {
        let backend = ScriptedBackend::new(vec![
            Ok(assistant_with_calls(vec![
                ToolCall::function("call_a", "get_current_time", r#"{"location":"London"}"#),
                ToolCall::function("call_b", "get_current_time", r#"{"location":"Tokyo"}"#),
                ToolCall::function("call_c", "calculate_math_expression", r#"{"expression":"1+1"}"#),
            ])),
            Ok(Message::assistant("done")),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        let turn = session.chat("three things please").await.unwrap();

        assert_eq!(turn.invocations.len(), 3);
        // system + user + assistant + 3 tool results + final assistant
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 7);
        let result_ids: Vec<_> = transcript[3..6]
            .iter()
            .map(|m| m.tool_call_id.as_deref().unwrap())
            .collect();
        assert_eq!(result_ids, vec!["call_a", "call_b", "call_c"]);
    }

    #[tokio::test]
    async fn unknown_tool_still_gets_a_result_message() {
        let backend = ScriptedBackend::new(vec![
            Ok(assistant_with_calls(vec![ToolCall::function(
                "call_1",
                "get_stock_price",
                r#"{"symbol":"ACME"}"#,
            )])),
            Ok(Message::assistant("I could not look that up.")),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        session.chat("stock price?").await.unwrap();

        let result = &session.transcript()[3];
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(result.content.as_deref(), Some("unknown tool: get_stock_price"));
    }

    #[tokio::test]
    async fn first_call_failure_rolls_back_user_message() {
        let backend = ScriptedBackend::new(vec![Err(network_error())]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        let err = session.chat("hello").await.unwrap_err();

        assert!(matches!(err, Error::Gateway(_)));
        // Only the system seed remains.
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].role, Role::System);
    }

    #[tokio::test]
    async fn followup_failure_preserves_tool_results() {
        let backend = ScriptedBackend::new(vec![
            Ok(assistant_with_calls(vec![ToolCall::function(
                "call_1",
                "get_current_time",
                r#"{"location":"Moscow"}"#,
            )])),
            Err(network_error()),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        session.chat("time in Moscow?").await.unwrap_err();

        // system + user + assistant(tool_calls) + tool result, no final.
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[3].role, Role::Tool);
    }

    #[tokio::test]
    async fn followup_tool_request_is_a_protocol_violation() {
        let backend = ScriptedBackend::new(vec![
            Ok(assistant_with_calls(vec![ToolCall::function(
                "call_1",
                "get_current_time",
                r#"{"location":"Moscow"}"#,
            )])),
            Ok(assistant_with_calls(vec![ToolCall::function(
                "call_2",
                "get_current_time",
                r#"{"location":"London"}"#,
            )])),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        let err = session.chat("time?").await.unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
        // Tool results stay, the misbehaving reply is not appended.
        assert_eq!(session.transcript().len(), 4);
    }

    #[tokio::test]
    async fn injected_math_expression_is_rejected_not_executed() {
        let backend = ScriptedBackend::new(vec![
            Ok(assistant_with_calls(vec![ToolCall::function(
                "call_1",
                "calculate_math_expression",
                r#"{"expression":"import os"}"#,
            )])),
            Ok(Message::assistant("That is not a valid expression.")),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        let turn = session.chat("2+2").await.unwrap();

        assert!(turn.invocations[0].output.starts_with("invalid expression:"));
    }

    #[tokio::test]
    async fn every_turn_policy_advertises_tools_but_never_on_followup() {
        let backend = ScriptedBackend::new(vec![
            Ok(assistant_with_calls(vec![ToolCall::function(
                "call_1",
                "get_current_time",
                r#"{"location":"Moscow"}"#,
            )])),
            Ok(Message::assistant("15:30")),
            Ok(Message::assistant("you're welcome")),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM);

        session.chat("time?").await.unwrap();
        session.chat("thanks").await.unwrap();

        // first call, followup (no tools), next turn's first call
        assert_eq!(backend.advertised(), vec![3, 0, 3]);
    }

    #[tokio::test]
    async fn first_turn_only_policy_stops_advertising() {
        let backend = ScriptedBackend::new(vec![
            Ok(Message::assistant("hello")),
            Ok(Message::assistant("still here")),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM)
            .with_policy(ToolPolicy::FirstTurnOnly);

        session.chat("hi").await.unwrap();
        session.chat("hi again").await.unwrap();

        assert_eq!(backend.advertised(), vec![3, 0]);
    }

    #[tokio::test]
    async fn failed_first_turn_does_not_burn_the_advertisement() {
        let backend = ScriptedBackend::new(vec![
            Err(network_error()),
            Ok(Message::assistant("hello")),
        ]);
        let mut session = Session::new(&backend, ToolRegistry::builtin(), SYSTEM)
            .with_policy(ToolPolicy::FirstTurnOnly);

        session.chat("hi").await.unwrap_err();
        session.chat("hi again").await.unwrap();

        // The rolled-back turn produced nothing; the retry advertises.
        assert_eq!(backend.advertised(), vec![3, 3]);
    }
}
