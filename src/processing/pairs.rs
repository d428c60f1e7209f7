use tracing::debug;

use crate::config::{ConfigError, PairingConfig};
use crate::models::{CandidatePair, Message};

/// Enumerates candidate pairs over time-ordered messages.
///
/// Every message is paired with its `lookback` predecessors, then with any
/// older message strictly closer than `window_seconds`. The backward scan
/// stops at the first message outside the window: input is time-ordered, so
/// everything before it is outside too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairGenerator {
    lookback: usize,
    window_seconds: u64,
}

impl PairGenerator {
    pub fn new(lookback: usize, window_seconds: u64) -> Result<Self, ConfigError> {
        if lookback == 0 {
            return Err(ConfigError::invalid_parameter("lookback must be a positive integer"));
        }
        if window_seconds == 0 {
            return Err(ConfigError::invalid_parameter("time window must be a positive integer"));
        }
        Ok(Self {
            lookback,
            window_seconds,
        })
    }

    pub fn from_config(config: &PairingConfig) -> Result<Self, ConfigError> {
        Self::new(config.lookback, config.window_seconds)
    }

    fn in_window(&self, a: &Message, b: &Message) -> bool {
        a.timestamp.seconds_between(&b.timestamp) < self.window_seconds
    }

    /// Pairs for every message, each message's pairs ordered from the most
    /// distant in-window partner to the nearest.
    pub fn generate<'a>(&self, messages: &[&'a Message]) -> Vec<CandidatePair<'a>> {
        let mut pairs = Vec::new();
        for index in 0..messages.len() {
            let mut local = self.lookback_pairs(messages, index);
            local.extend(self.window_pairs(messages, index));
            local.reverse();
            pairs.extend(local);
        }
        debug!(messages = messages.len(), pairs = pairs.len(), "Generated candidate pairs");
        pairs
    }

    /// The previous `lookback` messages, nearest first.
    fn lookback_pairs<'a>(&self, messages: &[&'a Message], index: usize) -> Vec<CandidatePair<'a>> {
        let start = index.saturating_sub(self.lookback);
        (start..index)
            .rev()
            .map(|j| CandidatePair::new(messages[index], messages[j]))
            .collect()
    }

    /// Older messages beyond the lookback that fall inside the time window, nearest first.
    fn window_pairs<'a>(&self, messages: &[&'a Message], index: usize) -> Vec<CandidatePair<'a>> {
        let current = messages[index];
        let Some(first) = index.checked_sub(self.lookback + 1) else {
            return Vec::new();
        };
        (0..=first)
            .rev()
            .map(|j| messages[j])
            .take_while(|earlier| self.in_window(current, earlier))
            .map(|earlier| CandidatePair::new(current, earlier))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;

    fn channel(timestamps: &[i64]) -> Vec<Message> {
        timestamps
            .iter()
            .enumerate()
            .map(|(i, &t)| Message::new((i + 1).to_string(), "u", Timestamp::Epoch(t)))
            .collect()
    }

    fn ids(pairs: &[CandidatePair<'_>]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|p| (p.current.id.clone(), p.earlier.id.clone()))
            .collect()
    }

    fn expected(pairs: &[(u32, Vec<u32>)]) -> Vec<(String, String)> {
        pairs.iter()
            .flat_map(|(current, earlier)| earlier.iter().map(move |e| (current.to_string(), e.to_string())))
            .collect()
    }

    #[test]
    fn ten_message_scenario() {
        let messages = channel(&[0, 10, 20, 30, 40, 100, 200, 300, 400, 500]);
        let refs: Vec<&Message> = messages.iter().collect();
        let pairs = PairGenerator::new(4, 129).unwrap().generate(&refs);

        let mut got = ids(&pairs);
        let mut want = expected(&[
            (2, vec![1]),
            (3, vec![1, 2]),
            (4, vec![1, 2, 3]),
            (5, vec![1, 2, 3, 4]),
            (6, vec![1, 2, 3, 4, 5]),
            (7, vec![3, 4, 5, 6]),
            (8, vec![4, 5, 6, 7]),
            (9, vec![5, 6, 7, 8]),
            (10, vec![6, 7, 8, 9]),
        ]);
        assert_eq!(got.len(), 31);
        got.sort();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn per_message_pairs_run_from_most_distant_to_nearest() {
        let messages = channel(&[0, 10, 20, 30, 40, 100]);
        let refs: Vec<&Message> = messages.iter().collect();
        let pairs = PairGenerator::new(4, 129).unwrap().generate(&refs);

        let last: Vec<_> = ids(&pairs).into_iter().filter(|(c, _)| c == "6").map(|(_, e)| e).collect();
        assert_eq!(last, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(ids(&pairs)[0], ("2".to_string(), "1".to_string()));
    }

    #[test]
    fn first_message_has_no_pairs_and_early_messages_look_back_fully() {
        let messages = channel(&[0, 1000, 2000, 3000, 4000, 5000, 6000]);
        let refs: Vec<&Message> = messages.iter().collect();
        let pairs = PairGenerator::new(4, 10).unwrap().generate(&refs);

        for (index, message) in messages.iter().enumerate() {
            let count = pairs.iter().filter(|p| p.current.id == message.id).count();
            assert_eq!(count, index.min(4), "message {}", message.id);
        }
    }

    #[test]
    fn window_is_strict() {
        let messages = channel(&[0, 200, 201, 202, 203, 204, 205]);
        let refs: Vec<&Message> = messages.iter().collect();
        // message 7 (t=205): lookback covers 3..6, window reaches 2 (diff 5) but not 1 (diff 205)
        let pairs = PairGenerator::new(4, 5).unwrap().generate(&refs);
        let earlier: Vec<_> = ids(&pairs).into_iter().filter(|(c, _)| c == "7").map(|(_, e)| e).collect();
        assert_eq!(earlier, vec!["3", "4", "5", "6"]);

        let pairs = PairGenerator::new(4, 6).unwrap().generate(&refs);
        let earlier: Vec<_> = ids(&pairs).into_iter().filter(|(c, _)| c == "7").map(|(_, e)| e).collect();
        assert_eq!(earlier, vec!["2", "3", "4", "5", "6"]);
    }

    #[test]
    fn scan_stops_at_first_message_outside_window() {
        // Out-of-order input makes the short-circuit observable: message 2 is
        // outside the window, so message 1 is never reached even though it is close.
        let messages = channel(&[95, 0, 96, 97, 98, 99, 100]);
        let refs: Vec<&Message> = messages.iter().collect();
        let pairs = PairGenerator::new(4, 50).unwrap().generate(&refs);
        let earlier: Vec<_> = ids(&pairs).into_iter().filter(|(c, _)| c == "7").map(|(_, e)| e).collect();
        assert_eq!(earlier, vec!["3", "4", "5", "6"]);
    }

    #[test]
    fn date_time_and_epoch_timestamps_share_the_window() {
        let messages = vec![
            Message::new("1", "u", Timestamp::Epoch(0)),
            Message::new("2", "u", Timestamp::parse("1970-01-01T00:00:01Z").unwrap()),
            Message::new("3", "u", Timestamp::parse("1970-01-01T00:00:02Z").unwrap()),
        ];
        let refs: Vec<&Message> = messages.iter().collect();
        let pairs = PairGenerator::new(1, 3).unwrap().generate(&refs);
        assert!(ids(&pairs).contains(&("3".to_string(), "1".to_string())));
    }

    #[test]
    fn zero_parameters_are_rejected() {
        assert!(PairGenerator::new(0, 129).is_err());
        assert!(PairGenerator::new(4, 0).is_err());
    }
}
