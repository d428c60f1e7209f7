use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::stats::Statistics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            messages,
        }
    }

    /// Messages sorted by timestamp; ties keep their original order.
    pub fn time_sorted(&self) -> Vec<&Message> {
        let mut sorted: Vec<&Message> = self.messages.iter().collect();
        sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        sorted
    }

    /// Writes predicted conversation labels back onto the messages, keyed by message id.
    pub fn apply_labels(&mut self, labels: &HashMap<String, String>) {
        for message in &mut self.messages {
            if let Some(label) = labels.get(&message.id) {
                message.conversation = Some(label.clone());
            }
        }
    }
}

/// Statistics keyed by label (a feature group name, `<group>-clustering`, or `Combined`).
pub type StatisticsTable = BTreeMap<String, Statistics>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Community {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
    /// Per-channel validation statistics, filled in by a validation run.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub statistics: BTreeMap<String, StatisticsTable>,
}

impl Community {
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.channels.iter().flat_map(|c| c.messages.iter())
    }

    pub fn message_count(&self) -> usize {
        self.channels.iter().map(|c| c.messages.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;

    #[test]
    fn time_sorted_is_stable_for_ties() {
        let channel = Channel::new(
            "c",
            "general",
            vec![
                Message::new("b", "x", Timestamp::Epoch(20)),
                Message::new("a1", "x", Timestamp::Epoch(10)),
                Message::new("a2", "y", Timestamp::Epoch(10)),
            ],
        );
        let ids: Vec<_> = channel.time_sorted().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b"]);
    }

    #[test]
    fn community_round_trips_through_json() {
        let raw = r#"{"name":"demo","channels":[{"id":"c1","messages":[
            {"id":"1","authorId":"u1","timestamp":5,"content":"hello","conversation":"T1"}]}]}"#;
        let community: Community = serde_json::from_str(raw).unwrap();
        assert_eq!(community.message_count(), 1);
        let json = serde_json::to_value(&community).unwrap();
        assert_eq!(json["channels"][0]["messages"][0]["authorId"], "u1");
        assert!(json.get("statistics").is_none());
    }
}
