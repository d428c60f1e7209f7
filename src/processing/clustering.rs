use std::collections::HashMap;

use tracing::debug;

use crate::models::{Conversation, Message, NEUTRAL_PROBABILITY, Relatedness, RelatednessLookup, weight};

/// Result of one clustering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub conversations: Vec<Conversation>,
    /// Message id to 1-based conversation id.
    pub assignments: HashMap<String, usize>,
}

impl Clustering {
    /// `T<n>` label per message id.
    pub fn labels(&self) -> HashMap<String, String> {
        self.conversations
            .iter()
            .flat_map(|conversation| {
                let label = conversation.label();
                conversation.message_ids.iter().map(move |id| (id.clone(), label.clone()))
            })
            .collect()
    }

    /// Conversation ids in the order of `messages`.
    pub fn sequence<'a>(&self, messages: impl IntoIterator<Item = &'a Message>) -> Vec<i64> {
        messages
            .into_iter()
            .map(|m| self.assignments.get(&m.id).map_or(0, |&c| c as i64))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// Single-pass greedy clusterer.
///
/// Each step scores the incoming message against every conversation so far
/// and either joins the best one or opens a new conversation. The state is
/// owned by one caller and only moves forward.
#[derive(Debug, Default)]
pub struct GreedyClusterer {
    conversations: Vec<Conversation>,
    assignments: HashMap<String, usize>,
}

impl GreedyClusterer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of `p - 0.5` between `message` and every member of `conversation`.
    fn quality(message: &Message, conversation: &Conversation, lookup: &RelatednessLookup) -> f64 {
        let row = lookup.row(&message.id);
        conversation
            .message_ids
            .iter()
            .map(|id| {
                row.and_then(|r| r.get(id))
                    .map_or(weight(NEUTRAL_PROBABILITY), Relatedness::weight)
            })
            .sum()
    }

    /// Assigns one message and returns its conversation id.
    pub fn step(&mut self, message: &Message, lookup: &RelatednessLookup) -> usize {
        let mut best: Option<(usize, f64)> = None;
        for (index, conversation) in self.conversations.iter().enumerate() {
            let quality = Self::quality(message, conversation, lookup);
            // Strictly greater keeps the earliest conversation on ties.
            if best.is_none_or(|(_, q)| quality > q) {
                best = Some((index, quality));
            }
        }

        let index = match best {
            Some((index, quality)) if quality > 0.0 => index,
            _ => {
                let id = self.conversations.len() + 1;
                self.conversations.push(Conversation::new(id));
                self.conversations.len() - 1
            }
        };

        let conversation = &mut self.conversations[index];
        conversation.message_ids.push(message.id.clone());
        self.assignments.insert(message.id.clone(), conversation.id);
        conversation.id
    }

    /// Runs `step` over time-ordered messages.
    pub fn cluster<'a>(mut self, messages: impl IntoIterator<Item = &'a Message>, lookup: &RelatednessLookup) -> Clustering {
        for message in messages {
            self.step(message, lookup);
        }
        self.finish()
    }

    pub fn finish(self) -> Clustering {
        debug!(
            conversations = self.conversations.len(),
            messages = self.assignments.len(),
            "Clustering finished"
        );
        Clustering {
            conversations: self.conversations,
            assignments: self.assignments,
        }
    }
}
