//! The render-loop side of the chat: posts a turn to the proxy and feeds the
//! streamed reply into a [`Conversation`], invoking a render hook after every
//! state change so the UI can redraw the growing message.

use crate::conversation::Conversation;
use crate::decode::StreamDecoder;
use futures::StreamExt;
use reqwest::Client;

pub struct ChatClient {
    http: Client,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Drive one user turn to completion. All failures are folded into the
    /// conversation state rather than returned:
    ///
    /// - a request that fails before any reply byte arrives appends the fixed
    ///   apology message;
    /// - a stream that breaks after fragments were received keeps the partial
    ///   reply and stops silently.
    ///
    /// `render` runs after each append so the newest content stays visible.
    pub async fn send<F>(&self, conversation: &mut Conversation, text: &str, mut render: F)
    where
        F: FnMut(&Conversation),
    {
        let Some(outbound) = conversation.begin_send(text) else {
            return;
        };
        // user turn and placeholder are visible before any network response
        render(conversation);

        let response = match self.http.post(&self.endpoint).json(&outbound).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("chat request failed: {err}");
                conversation.fail();
                render(conversation);
                return;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("chat request failed with status {}", response.status());
            conversation.fail();
            render(conversation);
            return;
        }

        let mut decoder = StreamDecoder::new();
        let mut received_any = false;
        let mut stream = response.bytes_stream();

        while let Some(item) = stream.next().await {
            match item {
                Ok(bytes) => {
                    if !bytes.is_empty() {
                        received_any = true;
                    }
                    let piece = decoder.decode(&bytes);
                    if !piece.is_empty() {
                        conversation.append_fragment(&piece);
                        render(conversation);
                    }
                }
                Err(err) => {
                    if received_any {
                        // truncated reply: keep what arrived, no apology
                        tracing::warn!("stream ended early: {err}");
                        conversation.finish();
                    } else {
                        tracing::warn!("stream failed before any content: {err}");
                        conversation.fail();
                    }
                    render(conversation);
                    return;
                }
            }
        }

        conversation.finish();
        render(conversation);
    }
}
