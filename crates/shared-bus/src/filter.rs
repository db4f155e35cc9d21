//! Selection of the messages an observer receives.

use shared_types::{Message, MessageType};

/// Message types an observer wants; empty selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub types: Vec<MessageType>,
}

impl MessageFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn types(types: Vec<MessageType>) -> Self {
        Self { types }
    }

    #[must_use]
    pub fn matches(&self, msg: &Message) -> bool {
        self.types.is_empty() || self.types.contains(&msg.message_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::message::{Payload, Started};

    #[test]
    fn test_filter_by_type() {
        let started = Message::new(Started {
            name: "Reader".into(),
        });
        let filter = MessageFilter::types(vec![MessageType::Started]);
        assert!(filter.matches(&started));
        assert!(!filter.matches(&Message::new(Payload::Quit)));
        assert!(MessageFilter::all().matches(&started));
    }
}
