//! Interactive terminal chat with the CrowdWatch assistant.
//!
//! Uses `dialoguer` for input. Before the first message the user can pick
//! one of the starter prompts instead of typing.

use crowdwatch_ai::providers::LlmProvider;
use dialoguer::{Input, Select};

use crate::{ChatSession, ConversationError};

/// Shown when a reply cannot be produced.
pub const REPLY_FAILED_MESSAGE: &str = "Sorry, I couldn't get a reply. Please try again.";

const TYPE_OWN: &str = "Type my own question";

/// Commands that end the chat loop.
const EXIT_WORDS: &[&str] = &["exit", "quit", ":q"];

/// Runs the chat loop until the user types `exit` (or `quit`).
///
/// # Errors
///
/// Returns an error if a terminal prompt fails.
pub async fn run(provider: &dyn LlmProvider) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ChatSession::new();

    println!("CrowdWatch assistant. Type `exit` to leave.\n");

    loop {
        let Some(text) = next_message(&session)? else {
            break;
        };

        match session.send(provider, &text).await {
            Ok(reply) => println!("\n{reply}\n"),
            Err(ConversationError::EmptyMessage) => {}
            Err(e) => {
                log::debug!("chat turn failed: {e}");
                println!("\n{REPLY_FAILED_MESSAGE}\n");
            }
        }
    }

    Ok(())
}

/// Prompts for the next message, `None` when the user wants to leave.
fn next_message(session: &ChatSession) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let starters = session.starter_prompts();

    if !starters.is_empty() {
        let mut labels: Vec<&str> = starters.to_vec();
        labels.push(TYPE_OWN);

        let idx = Select::new()
            .with_prompt("Ask the assistant")
            .items(&labels)
            .default(0)
            .interact()?;

        if let Some(starter) = starters.get(idx) {
            return Ok(Some((*starter).to_string()));
        }
    }

    let text: String = Input::new()
        .with_prompt("You")
        .allow_empty(true)
        .interact_text()?;

    if EXIT_WORDS.contains(&text.trim().to_lowercase().as_str()) {
        return Ok(None);
    }

    Ok(Some(text))
}
