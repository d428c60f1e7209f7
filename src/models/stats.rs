use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Wall-clock seconds spent in each stage of one evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    pub train_time: f64,
    pub scoring_time: f64,
    pub clustering_time: f64,
    pub total_time: f64,
}

/// Accuracy, precision, recall and F1 for one label.
///
/// Clustering entries only carry `f1_score`; the pairwise fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Timings>,
}

impl Statistics {
    pub fn clustering(f_score: f64) -> Self {
        Self {
            f1_score: f_score,
            ..Default::default()
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct ChannelStats {
    pub name: String,
    pub messages_processed: usize,
    pub pairs_scored: usize,
    pub conversations_found: usize,
    pub time_taken: Duration,
}

/// Totals of a prediction run, printed once the labelled file is written.
pub struct Stats {
    pub output_path: String,
    pub channels_processed: usize,
    pub total_messages: usize,
    pub total_pairs: usize,
    pub total_conversations: usize,
    pub channel_stats: Vec<ChannelStats>,
    pub start_time: std::time::Instant,
}

fn per_conversation(messages: usize, conversations: usize) -> f64 {
    if conversations == 0 { 0.0 } else { messages as f64 / conversations as f64 }
}

impl Stats {
    pub fn new(output_path: String) -> Self {
        Self {
            output_path,
            channels_processed: 0,
            total_messages: 0,
            total_pairs: 0,
            total_conversations: 0,
            channel_stats: Vec::new(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn add_channel_stats(&mut self, stats: ChannelStats) {
        self.channels_processed += 1;
        self.total_messages += stats.messages_processed;
        self.total_pairs += stats.pairs_scored;
        self.total_conversations += stats.conversations_found;
        self.channel_stats.push(stats);
    }

    pub fn messages_per_conversation(&self) -> f64 {
        per_conversation(self.total_messages, self.total_conversations)
    }

    pub fn print_stats(&self) {
        println!("\n📊 Disentanglement Statistics:");
        println!("⏱️  Time taken: {:.2?}", self.start_time.elapsed());
        println!("📁 Channels: {}", self.channels_processed);
        println!("💬 Messages: {} ({} pairs scored)", self.total_messages, self.total_pairs);
        println!(
            "🧵 Conversations: {} ({:.1} messages each)",
            self.total_conversations,
            self.messages_per_conversation()
        );

        if let Ok(metadata) = std::fs::metadata(&self.output_path) {
            println!("💾 Output file size: {:.2} MB", metadata.len() as f64 / 1_000_000.0);
        }

        for stats in &self.channel_stats {
            println!(
                "  #{:<20} {:>6} msgs  {:>5} convs  {:.2?}",
                stats.name, stats.messages_processed, stats.conversations_found, stats.time_taken
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate_per_channel() {
        let mut stats = Stats::new("unused.json".into());
        stats.add_channel_stats(ChannelStats {
            name: "a".into(),
            messages_processed: 10,
            conversations_found: 3,
            ..Default::default()
        });
        stats.add_channel_stats(ChannelStats {
            name: "b".into(),
            messages_processed: 5,
            conversations_found: 2,
            ..Default::default()
        });
        assert_eq!(stats.channels_processed, 2);
        assert_eq!(stats.total_messages, 15);
        assert_eq!(stats.total_conversations, 5);
        assert_eq!(stats.messages_per_conversation(), 3.0);
    }

    #[test]
    fn clustering_statistics_leave_pairwise_fields_empty() {
        let json = serde_json::to_value(Statistics::clustering(0.75)).unwrap();
        assert!(json["accuracy"].is_null());
        assert_eq!(json["f1_score"], 0.75);
        assert!(json.get("times").is_none());
    }
}
