//! Pairwise feature extraction.
//!
//! Every feature kind implements [`Feature`] and declares the extra context it
//! needs up front; [`FeatureContext::build`] only computes what the requested
//! features ask for.

mod binning;
mod chat;
mod content;
mod discourse;
mod unigram;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::config::FeatureConfig;
use crate::models::Message;

pub use binning::{frequency_bin, one_hot, time_bin};
pub use chat::{CrossAuthorMention, HasMention, MentionOther, MentionSame, Speaker, Time};
pub use content::{ContainsCode, ContainsLink, Repeat, Tech};
pub use discourse::{CueWords, Greet, Long, Question, Thanks};
pub use unigram::UnigramTable;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Feature {feature} requires {requirement:?}, which was not computed")]
    MissingContext {
        feature: &'static str,
        requirement: ContextRequirement,
    },

    #[error("Unknown feature group: {0}")]
    UnknownGroup(String),
}

/// Extra inputs beyond the two messages that a feature may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextRequirement {
    /// Word probabilities over the whole community.
    UnigramTable,
}

/// Shared inputs handed to every feature of one extraction run.
#[derive(Debug, Clone)]
pub struct FeatureContext {
    pub chat_bins: usize,
    pub discourse_max_words: usize,
    unigrams: Option<UnigramTable>,
}

impl FeatureContext {
    /// Context without any community-wide statistics.
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            chat_bins: config.chat_bins,
            discourse_max_words: config.discourse_max_words,
            unigrams: None,
        }
    }

    /// Computes exactly the context the given feature set declares.
    pub fn build<'a>(
        features: &FeatureSet,
        config: &FeatureConfig,
        messages: impl IntoIterator<Item = &'a Message>,
    ) -> Self {
        let mut context = Self::new(config);
        if features.needs(ContextRequirement::UnigramTable) {
            context.unigrams = Some(UnigramTable::from_messages(messages, config.top_words_removed));
        }
        context
    }

    pub fn with_unigrams(mut self, table: UnigramTable) -> Self {
        self.unigrams = Some(table);
        self
    }

    pub fn provides(&self, requirement: ContextRequirement) -> bool {
        match requirement {
            ContextRequirement::UnigramTable => self.unigrams.is_some(),
        }
    }

    pub fn unigrams(&self, feature: &'static str) -> Result<&UnigramTable, FeatureError> {
        self.unigrams.as_ref().ok_or(FeatureError::MissingContext {
            feature,
            requirement: ContextRequirement::UnigramTable,
        })
    }
}

/// A pairwise feature producing a fixed-width numeric sub-vector.
pub trait Feature: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn requirements(&self) -> &'static [ContextRequirement] {
        &[]
    }

    /// `current` is the later message of the pair, `earlier` the one it is compared with.
    fn extract(&self, current: &Message, earlier: &Message, context: &FeatureContext)
    -> Result<Vec<f64>, FeatureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureGroup {
    Content,
    Discourse,
    Chat,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 3] = [FeatureGroup::Content, FeatureGroup::Discourse, FeatureGroup::Chat];

    pub fn features(self) -> Vec<Box<dyn Feature>> {
        match self {
            FeatureGroup::Content => vec![Box::new(Repeat), Box::new(Tech), Box::new(ContainsCode), Box::new(ContainsLink)],
            FeatureGroup::Discourse => {
                vec![Box::new(CueWords), Box::new(Question), Box::new(Long), Box::new(Greet), Box::new(Thanks)]
            }
            FeatureGroup::Chat => vec![
                Box::new(Time),
                Box::new(Speaker),
                Box::new(CrossAuthorMention),
                Box::new(MentionSame),
                Box::new(MentionOther),
                Box::new(HasMention),
            ],
        }
    }
}

impl fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureGroup::Content => write!(f, "Content"),
            FeatureGroup::Discourse => write!(f, "Discourse"),
            FeatureGroup::Chat => write!(f, "Chat"),
        }
    }
}

impl FromStr for FeatureGroup {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(FeatureGroup::Content),
            "discourse" => Ok(FeatureGroup::Discourse),
            "chat" => Ok(FeatureGroup::Chat),
            other => Err(FeatureError::UnknownGroup(other.to_string())),
        }
    }
}

pub const COMBINED_LABEL: &str = "Combined";

/// An ordered list of features whose sub-vectors are concatenated per pair.
#[derive(Debug)]
pub struct FeatureSet {
    label: String,
    features: Vec<Box<dyn Feature>>,
}

impl FeatureSet {
    /// Content, discourse and chat features, in that order.
    pub fn all() -> Self {
        Self {
            label: COMBINED_LABEL.to_string(),
            features: FeatureGroup::ALL.into_iter().flat_map(FeatureGroup::features).collect(),
        }
    }

    pub fn group(group: FeatureGroup) -> Self {
        Self {
            label: group.to_string(),
            features: group.features(),
        }
    }

    pub fn custom(label: impl Into<String>, features: Vec<Box<dyn Feature>>) -> Self {
        Self {
            label: label.into(),
            features,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name()).collect()
    }

    pub fn needs(&self, requirement: ContextRequirement) -> bool {
        self.features.iter().any(|f| f.requirements().contains(&requirement))
    }

    /// Checks that the context covers every declared requirement.
    pub fn check_context(&self, context: &FeatureContext) -> Result<(), FeatureError> {
        for feature in &self.features {
            if let Some(&requirement) = feature.requirements().iter().find(|r| !context.provides(**r)) {
                return Err(FeatureError::MissingContext {
                    feature: feature.name(),
                    requirement,
                });
            }
        }
        Ok(())
    }

    /// Concatenated raw feature vector for one pair.
    pub fn extract(&self, current: &Message, earlier: &Message, context: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let mut vector = Vec::new();
        for feature in &self.features {
            vector.extend(feature.extract(current, earlier, context)?);
        }
        Ok(vector)
    }
}

/// One bit per message: `[predicate(current), predicate(earlier)]`.
pub(crate) fn pair_flags(current: &Message, earlier: &Message, predicate: impl Fn(&Message) -> bool) -> Vec<f64> {
    vec![flag(predicate(current)), flag(predicate(earlier))]
}

pub(crate) fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Parses a word list, one entry per line.
pub(crate) fn collection(raw: &'static str) -> Vec<&'static str> {
    raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}
