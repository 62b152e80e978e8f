//! Client for the completion provider's streaming chat API.
//!
//! Speaks the OpenAI-compatible `chat/completions` protocol: one POST with
//! `stream: true`, answered by a server-sent-event body whose `data:` frames
//! carry incremental text deltas and a final `[DONE]` sentinel.

use crate::config::ProviderConfig;
use crate::decode::StreamDecoder;
use crate::types::ChatMessage;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider error {status}: {body}")]
    Provider {
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type ChatResult<T> = Result<T, ChatError>;

pub struct CompletionProvider {
    client: Client,
    config: ProviderConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

// Stream chunk shapes for `data:` payloads (exported for tests)
#[derive(Deserialize)]
pub struct StreamChunk {
    pub choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
pub struct StreamDelta {
    pub content: Option<String>,
}

/// Interpret one SSE `data:` payload. Returns the text delta (possibly empty
/// for role-only or metadata frames) and whether the stream is finished.
/// Unparseable payloads yield `None` and are skipped.
pub fn parse_sse_data(data: &str) -> Option<(String, bool)> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "[DONE]" {
        return Some((String::new(), true));
    }

    if let Ok(parsed) = serde_json::from_str::<StreamChunk>(trimmed) {
        if let Some(first) = parsed.choices.into_iter().next()
            && let Some(delta) = first.delta
            && let Some(piece) = delta.content
        {
            return Some((piece, false));
        }
        // role-only or metadata frame: nothing to forward
        return Some((String::new(), false));
    }
    None
}

/// Accumulates raw SSE text and yields each complete `data:` payload once its
/// terminating blank line arrives. Lines may be split anywhere by the
/// transport, including mid-line.
#[derive(Default)]
pub struct SseFrameBuffer {
    buffer: String,
    data: Option<String>,
}

impl SseFrameBuffer {
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut frames = Vec::new();
        self.buffer.push_str(chunk);

        while let Some(pos) = self.buffer.find('\n') {
            let mut line = self.buffer[..pos].to_string();
            if line.ends_with('\r') {
                line.pop();
            }
            self.buffer = self.buffer[pos + 1..].to_string();

            if line.is_empty() {
                // blank line ends the event
                if let Some(data) = self.data.take() {
                    frames.push(data);
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("data:") {
                let piece = rest.trim_start();
                match &mut self.data {
                    Some(acc) => acc.push_str(piece),
                    None => self.data = Some(piece.to_string()),
                }
            }
        }

        frames
    }
}

impl CompletionProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Open a streaming completion for `messages`. Yields textual deltas in
    /// arrival order; frames with no text are skipped. A failure before the
    /// stream starts is returned directly; a failure mid-stream surfaces as
    /// one `Err` item and then the stream ends.
    pub async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
    ) -> ChatResult<impl Stream<Item = ChatResult<String>> + Send + 'static> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .header("accept", "text/event-stream")
            .json(&CompletionRequest {
                model: &self.config.model,
                messages: &messages,
                stream: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider { status, body });
        }

        let (tx, rx) = tokio::sync::mpsc::channel::<ChatResult<String>>(16);
        tokio::spawn(async move {
            let mut decoder = StreamDecoder::new();
            let mut frames = SseFrameBuffer::default();
            let mut stream = response.bytes_stream();

            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        let text = decoder.decode(&bytes);
                        for data in frames.push(&text) {
                            if let Some((piece, done)) = parse_sse_data(&data) {
                                if done {
                                    return;
                                }
                                if !piece.is_empty() && tx.send(Ok(piece)).await.is_err() {
                                    // receiver dropped, stop reading
                                    return;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(ChatError::Http(err))).await;
                        return;
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delta_frames() {
        let (piece, done) =
            parse_sse_data(r#"{"choices":[{"delta":{"content":"Hello"}}]}"#).unwrap();
        assert_eq!(piece, "Hello");
        assert!(!done);
    }

    #[test]
    fn done_sentinel_ends_stream() {
        let (piece, done) = parse_sse_data("[DONE]").unwrap();
        assert!(piece.is_empty());
        assert!(done);
    }

    #[test]
    fn role_only_frames_carry_no_text() {
        let (piece, done) =
            parse_sse_data(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#).unwrap();
        assert!(piece.is_empty());
        assert!(!done);
    }

    #[test]
    fn skips_unparseable_frames() {
        assert!(parse_sse_data("not json").is_none());
        assert!(parse_sse_data("   ").is_none());
    }

    #[test]
    fn frame_buffer_handles_arbitrary_splits() {
        let raw = "data: {\"a\":1}\n\ndata: {\"b\":2}\n\n";
        for chunk_size in 1..=7 {
            let mut frames = SseFrameBuffer::default();
            let mut seen = Vec::new();
            for chunk in raw.as_bytes().chunks(chunk_size) {
                seen.extend(frames.push(std::str::from_utf8(chunk).unwrap()));
            }
            assert_eq!(seen, vec![r#"{"a":1}"#, r#"{"b":2}"#], "chunk size {chunk_size}");
        }
    }

    #[test]
    fn frame_buffer_strips_carriage_returns() {
        let mut frames = SseFrameBuffer::default();
        let seen = frames.push("data: [DONE]\r\n\r\n");
        assert_eq!(seen, vec!["[DONE]"]);
    }

    #[test]
    fn reconstructs_full_reply_from_frames() {
        let raw = concat!(
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hello, \"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"world\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mut frames = SseFrameBuffer::default();
        let mut acc = String::new();
        let mut finished = false;
        for data in frames.push(raw) {
            if let Some((piece, done)) = parse_sse_data(&data) {
                acc.push_str(&piece);
                finished = finished || done;
            }
        }
        assert_eq!(acc, "Hello, world");
        assert!(finished);
    }
}
