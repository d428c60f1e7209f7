use std::collections::HashSet;

use super::{Feature, FeatureContext, FeatureError, flag, one_hot, pair_flags, time_bin};
use crate::models::Message;

fn mention_set(message: &Message) -> HashSet<&str> {
    message.mentions.iter().map(String::as_str).collect()
}

/// Log-binned time difference, `chat_bins` wide.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time;

impl Feature for Time {
    fn name(&self) -> &'static str {
        "Time"
    }

    fn extract(&self, current: &Message, earlier: &Message, context: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let diff = current.timestamp.seconds_between(&earlier.timestamp);
        Ok(one_hot(time_bin(diff, context.chat_bins), context.chat_bins))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Speaker;

impl Feature for Speaker {
    fn name(&self) -> &'static str {
        "Speaker"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(vec![flag(current.author_id == earlier.author_id)])
    }
}

/// Whether each message mentions anyone at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasMention;

impl Feature for HasMention {
    fn name(&self) -> &'static str {
        "HasMention"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(pair_flags(current, earlier, |m| !m.mentions.is_empty()))
    }
}

/// `[current mentions earlier's author, earlier mentions current's author]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossAuthorMention;

impl Feature for CrossAuthorMention {
    fn name(&self) -> &'static str {
        "CrossAuthorMention"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(vec![
            flag(current.mentions.iter().any(|m| *m == earlier.author_id)),
            flag(earlier.mentions.iter().any(|m| *m == current.author_id)),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MentionSame;

impl Feature for MentionSame {
    fn name(&self) -> &'static str {
        "MentionSame"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let shared = mention_set(current).intersection(&mention_set(earlier)).count();
        Ok(vec![flag(shared > 0)])
    }
}

/// Both messages mention the same third member, neither of the two authors.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentionOther;

impl Feature for MentionOther {
    fn name(&self) -> &'static str {
        "MentionOther"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let earlier_mentions = mention_set(earlier);
        let third_party = mention_set(current).into_iter().any(|m| {
            earlier_mentions.contains(m) && m != current.author_id && m != earlier.author_id
        });
        Ok(vec![flag(third_party)])
    }
}
