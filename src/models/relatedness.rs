use std::collections::HashMap;

use super::message::Message;

/// Probability used when no score exists for a pair.
pub const NEUTRAL_PROBABILITY: f64 = 0.5;

/// A message paired with an earlier one, before any scoring.
#[derive(Debug, Clone, Copy)]
pub struct CandidatePair<'a> {
    pub current: &'a Message,
    pub earlier: &'a Message,
}

impl<'a> CandidatePair<'a> {
    pub fn new(current: &'a Message, earlier: &'a Message) -> Self {
        Self { current, earlier }
    }

    /// Gold label: 1 when both messages carry the same conversation.
    pub fn same_conversation(&self) -> Option<bool> {
        match (&self.current.conversation, &self.earlier.conversation) {
            (Some(a), Some(b)) => Some(a == b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relatedness {
    pub current_id: String,
    pub earlier_id: String,
    pub probability: f64,
}

impl Relatedness {
    /// Probabilities are clamped into `[0, 1]`.
    pub fn new(pair: &CandidatePair<'_>, probability: f64) -> Self {
        Self {
            current_id: pair.current.id.clone(),
            earlier_id: pair.earlier.id.clone(),
            probability: probability.clamp(0.0, 1.0),
        }
    }

    /// Signed weight of this pair: below 0.5 penalises, above rewards.
    pub fn weight(&self) -> f64 {
        weight(self.probability)
    }
}

pub fn weight(probability: f64) -> f64 {
    probability - NEUTRAL_PROBABILITY
}

/// Scores keyed by current message id, then earlier message id.
#[derive(Debug, Clone, Default)]
pub struct RelatednessLookup {
    rows: HashMap<String, HashMap<String, Relatedness>>,
}

impl RelatednessLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: Relatedness) {
        self.rows
            .entry(record.current_id.clone())
            .or_default()
            .insert(record.earlier_id.clone(), record);
    }

    pub fn row(&self, current_id: &str) -> Option<&HashMap<String, Relatedness>> {
        self.rows.get(current_id)
    }

    pub fn get(&self, current_id: &str, earlier_id: &str) -> Option<&Relatedness> {
        self.rows.get(current_id)?.get(earlier_id)
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<Relatedness> for RelatednessLookup {
    fn from_iter<T: IntoIterator<Item = Relatedness>>(iter: T) -> Self {
        let mut lookup = Self::new();
        for record in iter {
            lookup.insert(record);
        }
        lookup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;

    #[test]
    fn weights_are_centred_on_neutral() {
        assert_eq!(weight(0.5), 0.0);
        assert_eq!(weight(1.0), 0.5);
        assert_eq!(weight(0.0), -0.5);
    }

    #[test]
    fn records_clamp_probability() {
        let a = Message::new("a", "u", Timestamp::Epoch(1));
        let b = Message::new("b", "u", Timestamp::Epoch(0));
        let pair = CandidatePair::new(&a, &b);
        assert_eq!(Relatedness::new(&pair, 1.3).probability, 1.0);
        assert_eq!(Relatedness::new(&pair, -0.1).weight(), -0.5);
    }

    #[test]
    fn lookup_is_keyed_current_then_earlier() {
        let a = Message::new("a", "u", Timestamp::Epoch(2));
        let b = Message::new("b", "u", Timestamp::Epoch(1));
        let c = Message::new("c", "u", Timestamp::Epoch(0));
        let lookup: RelatednessLookup = [
            Relatedness::new(&CandidatePair::new(&a, &b), 0.9),
            Relatedness::new(&CandidatePair::new(&a, &c), 0.2),
        ]
        .into_iter()
        .collect();

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("a", "c").map(|r| r.probability), Some(0.2));
        assert!(lookup.get("b", "a").is_none());
        assert_eq!(lookup.row("a").map(HashMap::len), Some(2));
    }
}
