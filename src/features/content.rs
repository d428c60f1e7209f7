use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{ContextRequirement, Feature, FeatureContext, FeatureError, collection, flag, frequency_bin, pair_flags};
use crate::models::Message;

const REPEAT_BINS: usize = 5;

static TECH_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| collection(include_str!("../../collections/tech_words.txt")).into_iter().collect());

static IPV4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:[0-9]{1,3}\.){3}[0-9]{1,3})\b").expect("valid IPv4 pattern"));

/// Shared words, binned by how rare they are in the community.
#[derive(Debug, Clone, Copy, Default)]
pub struct Repeat;

impl Feature for Repeat {
    fn name(&self) -> &'static str {
        "Repeat"
    }

    fn requirements(&self) -> &'static [ContextRequirement] {
        &[ContextRequirement::UnigramTable]
    }

    fn extract(&self, current: &Message, earlier: &Message, context: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let unigrams = context.unigrams(self.name())?;
        let current_words: HashSet<String> = current.content_words().into_iter().collect();
        let earlier_words: HashSet<String> = earlier.content_words().into_iter().collect();

        let mut bins = vec![0.0; REPEAT_BINS];
        for word in current_words.intersection(&earlier_words) {
            if let Some(probability) = unigrams.probability(word) {
                bins[frequency_bin(probability, REPEAT_BINS)] += 1.0;
            }
        }
        Ok(bins)
    }
}

/// Technical jargon or an IP address: `[current, earlier, neither]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tech;

impl Tech {
    fn is_technical(message: &Message) -> bool {
        message.words().iter().any(|w| TECH_WORDS.contains(w.as_str())) || IPV4.is_match(&message.content)
    }
}

impl Feature for Tech {
    fn name(&self) -> &'static str {
        "Tech"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let a = Self::is_technical(current);
        let b = Self::is_technical(earlier);
        Ok(vec![flag(a), flag(b), flag(!a && !b)])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsCode;

impl Feature for ContainsCode {
    fn name(&self) -> &'static str {
        "ContainsCode"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(pair_flags(current, earlier, |m| m.has_code))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsLink;

impl Feature for ContainsLink {
    fn name(&self) -> &'static str {
        "ContainsLink"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(pair_flags(current, earlier, |m| m.has_link))
    }
}
