//! Caller-owned conversation history

use serde::{Deserialize, Serialize};

use super::turn::ConversationTurn;
use crate::types::ChatMessage;

/// Append-only list of completed turns
///
/// The agent never mutates a history it is given; each turn returns an
/// extended copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// A copy of this history with `turn` appended
    pub fn with_turn(&self, turn: ConversationTurn) -> Self {
        let mut turns = self.turns.clone();
        turns.push(turn);
        Self { turns }
    }

    /// Replay the last `window` turns as user/assistant message pairs
    ///
    /// Tool calls of past turns are not replayed, only what was said.
    pub fn to_messages(&self, window: usize) -> Vec<ChatMessage> {
        let skip = self.turns.len().saturating_sub(window);
        self.turns[skip..]
            .iter()
            .flat_map(|t| {
                [
                    ChatMessage::user(&t.user_message),
                    ChatMessage::assistant(&t.response),
                ]
            })
            .collect()
    }
}
