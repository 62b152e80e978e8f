//! Client-side conversation state.
//!
//! Holds the ordered message history and the loading flag that gates sending.
//! At most one message is ever in progress: it is always the last element and
//! always the assistant placeholder appended by `begin_send`.

use crate::types::ChatMessage;

pub const GREETING: &str = "Welcome! How can I help you today?";
pub const APOLOGY: &str = "I'm sorry, but I encountered an error. Please try again later.";

pub struct Conversation {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl Conversation {
    /// A fresh conversation starts with the synthetic assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            loading: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a user turn. Returns the payload to send to the proxy: the full
    /// prior history plus the new user message, excluding the assistant
    /// placeholder appended afterwards. A blank `text`, or a turn already in
    /// flight, is a no-op and returns `None` with nothing mutated.
    pub fn begin_send(&mut self, text: &str) -> Option<Vec<ChatMessage>> {
        if text.trim().is_empty() || self.loading {
            return None;
        }

        self.loading = true;
        self.messages.push(ChatMessage::user(text));
        let outbound = self.messages.clone();
        self.messages.push(ChatMessage::assistant(""));
        Some(outbound)
    }

    /// Extend the in-progress message. Always concatenates onto the last
    /// element, never replaces it.
    pub fn append_fragment(&mut self, piece: &str) {
        if let Some(last) = self.messages.last_mut() {
            last.content.push_str(piece);
        }
    }

    /// Normal end of stream: the placeholder keeps whatever arrived.
    pub fn finish(&mut self) {
        self.loading = false;
    }

    /// Request failure: append the fixed apology as a new assistant turn.
    /// Partially streamed content is preserved, not rolled back.
    pub fn fail(&mut self) {
        self.messages.push(ChatMessage::assistant(APOLOGY));
        self.loading = false;
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn starts_with_greeting() {
        let convo = Conversation::new();
        assert_eq!(convo.messages(), &[ChatMessage::assistant(GREETING)]);
        assert!(!convo.is_loading());
    }

    #[test]
    fn blank_send_is_a_no_op() {
        let mut convo = Conversation::new();
        assert!(convo.begin_send("").is_none());
        assert!(convo.begin_send("   ").is_none());
        assert_eq!(convo.messages().len(), 1);
        assert!(!convo.is_loading());
    }

    #[test]
    fn begin_send_appends_user_turn_and_placeholder() {
        let mut convo = Conversation::new();
        let outbound = convo.begin_send("How do I reset my password?").unwrap();

        // outbound payload: greeting + user turn, no placeholder
        assert_eq!(
            outbound,
            vec![
                ChatMessage::assistant(GREETING),
                ChatMessage::user("How do I reset my password?"),
            ]
        );

        // store: greeting + user turn + empty assistant placeholder
        assert_eq!(convo.messages().len(), 3);
        let last = convo.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.is_empty());
        assert!(convo.is_loading());
    }

    #[test]
    fn second_send_while_loading_is_rejected() {
        let mut convo = Conversation::new();
        assert!(convo.begin_send("first").is_some());
        assert!(convo.begin_send("second").is_none());
        assert_eq!(convo.messages().len(), 3);
    }

    #[test]
    fn fragments_concatenate_onto_placeholder() {
        let mut convo = Conversation::new();
        convo.begin_send("hi").unwrap();
        convo.append_fragment("Hello, ");
        convo.append_fragment("world");
        convo.finish();

        assert_eq!(convo.messages().last().unwrap().content, "Hello, world");
        assert!(!convo.is_loading());
    }

    #[test]
    fn fail_appends_apology_and_keeps_partial_content() {
        let mut convo = Conversation::new();
        convo.begin_send("hi").unwrap();
        convo.append_fragment("partial");
        convo.fail();

        let messages = convo.messages();
        assert_eq!(messages[messages.len() - 2].content, "partial");
        assert_eq!(messages.last().unwrap(), &ChatMessage::assistant(APOLOGY));
        assert!(!convo.is_loading());
    }

    #[test]
    fn send_is_possible_again_after_finish() {
        let mut convo = Conversation::new();
        convo.begin_send("one").unwrap();
        convo.finish();
        let outbound = convo.begin_send("two").unwrap();
        // payload carries the whole visible history, placeholder included
        // only as the now-finished previous reply
        assert_eq!(outbound.len(), 4);
    }
}
