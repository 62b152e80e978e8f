//! The streaming proxy: `POST /api/chat`.
//!
//! Accepts the conversation history as a JSON array of messages, prepends the
//! fixed support-assistant system prompt, and relays the provider's text
//! deltas as a raw UTF-8 response body, flushing each fragment as it arrives.
//! Requests are handled independently; no state outlives a request.

use crate::provider::CompletionProvider;
use crate::types::{ChatMessage, Role};
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Persona and guidelines for the support assistant. Injected once per
/// request as the single `system` turn; clients never supply it.
pub const SYSTEM_PROMPT: &str = r#"You are the Supportline assistant, a customer-support agent for the Supportline platform. Your role is to answer questions about the platform, help users find the resources they need, and resolve common issues.

Key points to remember:

1. Be friendly, professional, and supportive in your interactions.
2. Provide accurate information about the platform's features and plans.
3. Help users navigate the product and troubleshoot common issues.
4. Protect user privacy by never asking for or sharing personal information.
5. Direct complex technical issues or account-specific problems to human support when necessary.

When interacting with users:

1. Greet them warmly and ask how you can help.
2. Clarify their question or issue if needed.
3. Provide concise, relevant answers or step-by-step instructions.
4. Ask if the user needs further assistance before concluding the conversation."#;

pub struct AppState {
    pub provider: CompletionProvider,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Proxy one chat turn. The response body is the provider's reply as raw
/// concatenated text; the first byte reaches the client before generation
/// finishes. A provider failure mid-stream aborts the body with whatever was
/// already flushed left in place.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(history): Json<Vec<ChatMessage>>,
) -> Response {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    // the proxy owns the one system turn; drop any the client smuggled in
    messages.extend(history.into_iter().filter(|msg| msg.role != Role::System));

    tracing::debug!(turns = messages.len(), "forwarding chat to provider");

    match state.provider.stream_chat(messages).await {
        Ok(stream) => Response::new(Body::from_stream(stream)),
        Err(err) => {
            tracing::warn!("provider call failed: {err}");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
