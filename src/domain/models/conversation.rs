#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use super::Message;

/// Ordered, append-only transcript sent with every revision. Entries only
/// ever arrive through [`ConversationLog::seed`] (the first prompt) or
/// [`ConversationLog::append_revision`] (an assistant/user pair), so a
/// partially applied revision can never be observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn seed(prompt: &str) -> ConversationLog {
        return ConversationLog {
            messages: vec![Message::user(prompt)],
        };
    }

    pub fn append_revision(&mut self, previous_code: Message, instruction: Message) {
        self.messages.reserve(2);
        self.messages.push(previous_code);
        self.messages.push(instruction);
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn len(&self) -> usize {
        return self.messages.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.messages.is_empty();
    }

    /// The prompt the session was started with.
    pub fn first_prompt(&self) -> Option<&str> {
        return self.messages.first().map(|msg| return msg.content.as_str());
    }
}
