//! Minimal terminal front-end for the chat proxy. Each turn streams the
//! reply into the conversation and the render loop prints only what changed,
//! so tokens appear as they arrive.

use anyhow::Result;
use std::io::{self, BufRead, Write};
use supportline::conversation::Conversation;
use supportline::types::{ChatMessage, Role};
use supportline::ChatClient;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/chat";

fn role_label(message: &ChatMessage) -> &'static str {
    match message.role {
        Role::System => "system",
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

/// Print everything not yet shown. `shown` tracks the printed byte length of
/// each message, so growing the last message prints only the new tail.
fn render(conversation: &Conversation, shown: &mut Vec<usize>) {
    let mut out = io::stdout().lock();
    for (i, message) in conversation.messages().iter().enumerate() {
        if shown.len() <= i {
            let _ = write!(out, "\n{}: ", role_label(message));
            shown.push(0);
        }
        if shown[i] < message.content.len() {
            let _ = write!(out, "{}", &message.content[shown[i]..]);
            shown[i] = message.content.len();
        }
    }
    let _ = out.flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let endpoint =
        std::env::var("SUPPORTLINE_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

    let client = ChatClient::new(endpoint);
    let mut conversation = Conversation::new();
    let mut shown: Vec<usize> = Vec::new();
    render(&conversation, &mut shown);

    let stdin = io::stdin();
    loop {
        print!("\n\n> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim_end_matches(['\r', '\n']);

        // input is not read again until the turn completes, so only one
        // stream is ever in flight
        client
            .send(&mut conversation, text, |convo| render(convo, &mut shown))
            .await;
    }

    Ok(())
}
