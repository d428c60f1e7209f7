use serde::Serialize;

/// A conversation thread grown one message at a time by the clusterer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    /// 1-based, in creation order.
    pub id: usize,
    pub message_ids: Vec<String>,
}

impl Conversation {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            message_ids: Vec::new(),
        }
    }

    /// `T<id>`, the form gold labels take.
    pub fn label(&self) -> String {
        format!("T{}", self.id)
    }

    pub fn len(&self) -> usize {
        self.message_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message_ids.is_empty()
    }
}
