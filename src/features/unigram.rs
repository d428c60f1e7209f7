use std::collections::HashMap;

use crate::models::{Message, is_special_token};

/// Word probabilities over a community, with the most common words removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnigramTable {
    probabilities: HashMap<String, f64>,
}

impl UnigramTable {
    /// Counts lowercased words, drops the `top_removed` most frequent ones
    /// (ties go to the word seen first) and normalises the rest.
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a Message>, top_removed: usize) -> Self {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        for message in messages {
            for word in message.processable_text().split_whitespace() {
                if is_special_token(word) || is_numeric(word) {
                    continue;
                }
                let next_rank = counts.len();
                counts.entry(word.to_lowercase()).or_insert((0, next_rank)).0 += 1;
            }
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(word, (count, first_seen))| (word, count, first_seen))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let kept: Vec<(String, usize)> = ranked
            .into_iter()
            .skip(top_removed)
            .map(|(word, count, _)| (word, count))
            .collect();
        let total: usize = kept.iter().map(|(_, count)| count).sum();

        let probabilities = kept
            .into_iter()
            .map(|(word, count)| (word, count as f64 / total as f64))
            .collect();

        Self { probabilities }
    }

    pub fn probability(&self, word: &str) -> Option<f64> {
        self.probabilities.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.probabilities.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

fn is_numeric(word: &str) -> bool {
    !word.is_empty() && word.chars().all(char::is_numeric)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;

    fn msg(text: &str) -> Message {
        Message::new("m", "a", Timestamp::Epoch(0)).with_content(text)
    }

    #[test]
    fn removes_most_frequent_and_normalises() {
        let messages = [msg("the cat the dog"), msg("The kernel panics 42"), msg("__MENTION__ cat")];
        let table = UnigramTable::from_messages(&messages, 1);

        assert!(!table.contains("the"));
        assert!(!table.contains("42"));
        assert!(!table.contains("__mention__"));
        assert_eq!(table.probability("cat"), Some(2.0 / 5.0));
        assert_eq!(table.probability("kernel"), Some(1.0 / 5.0));
        let total: f64 = ["cat", "dog", "kernel", "panics"]
            .iter()
            .filter_map(|w| table.probability(w))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ties_remove_first_seen_word() {
        let messages = [msg("alpha beta gamma")];
        let table = UnigramTable::from_messages(&messages, 1);
        assert!(!table.contains("alpha"));
        assert!(table.contains("beta"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn removing_everything_leaves_empty_table() {
        let table = UnigramTable::from_messages(&[msg("one two")], 50);
        assert!(table.is_empty());
    }
}
