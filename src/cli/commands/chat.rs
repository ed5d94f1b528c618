//! Interactive terminal chat.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::llm::ChatMessage;
use crate::rag::{self, ChatEngine};
use console::style;
use futures::StreamExt;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Assistant reply recorded when the upstream call fails.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// Run the interactive chat command.
pub async fn run_chat(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let engine = rag::engine_from_settings(&settings)?;
    let mut session = ChatSession::new(engine);

    println!("\n{}", style("C3 - Career Clarity Chatbot").bold().cyan());
    println!(
        "{}\n",
        style("Tell me about yourself, or type 'exit' to quit. Use 'clear' to start over.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("All the best for your journey!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        print!("\n{} ", style("C3:").cyan().bold());
        stdout.flush()?;

        session
            .send(input, |chunk| {
                print!("{}", chunk);
                io::stdout().flush().ok();
            })
            .await;
        println!("\n");
    }

    Ok(())
}

/// Conversation held in memory for the lifetime of the process.
pub struct ChatSession {
    engine: ChatEngine,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(engine: ChatEngine) -> Self {
        Self {
            engine,
            messages: Vec::new(),
        }
    }

    /// Conversation so far.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn clear_history(&mut self) {
        self.messages.clear();
    }

    /// Send a user turn, calling `on_chunk` for each streamed piece of the reply.
    ///
    /// Failures are not returned: the connection error message is shown and
    /// recorded as the assistant turn instead.
    pub async fn send<F: FnMut(&str)>(&mut self, input: &str, mut on_chunk: F) -> String {
        self.messages.push(ChatMessage::user(input));

        let reply = match self.stream_reply(&mut on_chunk).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                on_chunk(CONNECTION_ERROR_MESSAGE);
                CONNECTION_ERROR_MESSAGE.to_string()
            }
        };

        self.messages.push(ChatMessage::assistant(reply.clone()));
        reply
    }

    async fn stream_reply<F: FnMut(&str)>(&self, on_chunk: &mut F) -> Result<String> {
        let mut stream = self.engine.stream_reply(&self.messages).await?;
        let mut reply = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            on_chunk(&chunk);
            reply.push_str(&chunk);
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::C3Error;
    use crate::llm::{ChatModel, Role, TextStream};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Replies with the number of turns it was given, or fails.
    struct CountingModel {
        fail: bool,
    }

    #[async_trait]
    impl ChatModel for CountingModel {
        async fn stream(&self, _system: &str, messages: &[ChatMessage]) -> Result<TextStream> {
            if self.fail {
                return Err(C3Error::Chat("connection refused".to_string()));
            }
            let chunks: Vec<Result<String>> =
                vec![Ok("turns=".to_string()), Ok(messages.len().to_string())];
            Ok(futures::stream::iter(chunks).boxed())
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_history_is_forwarded_each_turn() {
        let mut session = ChatSession::new(ChatEngine::new(Arc::new(CountingModel { fail: false })));

        let mut streamed = Vec::new();
        let first = session.send("Hi", |c| streamed.push(c.to_string())).await;
        assert_eq!(first, "turns=1");
        assert_eq!(streamed, vec!["turns=", "1"]);

        let second = session.send("12th Science", |_| {}).await;
        assert_eq!(second, "turns=3");
        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.messages()[3].role, Role::Assistant);

        session.clear_history();
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_failure_records_connection_error() {
        let mut session = ChatSession::new(ChatEngine::new(Arc::new(CountingModel { fail: true })));

        let reply = session.send("Hello?", |_| {}).await;
        assert_eq!(reply, CONNECTION_ERROR_MESSAGE);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, CONNECTION_ERROR_MESSAGE);
    }
}
