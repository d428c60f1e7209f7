use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DisentangleError;

/// Special tokens left behind by the message parser, e.g. `__MENTION__`.
static SPECIAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(?:[A-Z]*_?)*__|_|\?").expect("valid special token pattern"));

/// A message timestamp, either raw epoch seconds or a parsed date-time.
///
/// Both forms compare through the same instant so that a channel mixing them
/// still sorts consistently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTimestamp", into = "RawTimestamp")]
pub enum Timestamp {
    Epoch(i64),
    DateTime(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Integer(i64),
    Text(String),
}

impl Timestamp {
    /// Whole seconds since the Unix epoch, used by the window rule and the time feature.
    pub fn epoch_seconds(&self) -> i64 {
        match self {
            Timestamp::Epoch(secs) => *secs,
            Timestamp::DateTime(dt) => dt.timestamp(),
        }
    }

    fn instant(&self) -> (i64, u32) {
        match self {
            Timestamp::Epoch(secs) => (*secs, 0),
            Timestamp::DateTime(dt) => (dt.timestamp(), dt.timestamp_subsec_nanos()),
        }
    }

    /// Absolute difference in whole seconds.
    pub fn seconds_between(&self, other: &Timestamp) -> u64 {
        self.epoch_seconds().abs_diff(other.epoch_seconds())
    }

    pub fn parse(raw: &str) -> Result<Self, DisentangleError> {
        let raw = raw.trim();
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            return raw
                .parse()
                .map(Timestamp::Epoch)
                .map_err(|_| DisentangleError::InvalidTimestamp(raw.to_string()));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Timestamp::DateTime(dt));
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                let utc: DateTime<Utc> = naive.and_utc();
                return Ok(Timestamp::DateTime(utc.fixed_offset()));
            }
        }

        Err(DisentangleError::InvalidTimestamp(raw.to_string()))
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant() == other.instant()
    }
}

impl Eq for Timestamp {}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant().cmp(&other.instant())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<RawTimestamp> for Timestamp {
    type Error = DisentangleError;

    fn try_from(raw: RawTimestamp) -> Result<Self, Self::Error> {
        match raw {
            RawTimestamp::Integer(secs) => Ok(Timestamp::Epoch(secs)),
            RawTimestamp::Text(text) => Timestamp::parse(&text),
        }
    }
}

impl From<Timestamp> for RawTimestamp {
    fn from(timestamp: Timestamp) -> Self {
        match timestamp {
            Timestamp::Epoch(secs) => RawTimestamp::Integer(secs),
            Timestamp::DateTime(dt) => RawTimestamp::Text(dt.to_rfc3339()),
        }
    }
}

/// A chat message with its parser-supplied fields.
///
/// Mentions, code blocks and links are detected upstream; this type only
/// carries the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub author_id: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processable_text: Option<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    #[serde(default)]
    pub has_code: bool,
    #[serde(default)]
    pub has_link: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
}

impl Message {
    pub fn new(id: impl Into<String>, author_id: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            id: id.into(),
            author_id: author_id.into(),
            timestamp,
            content: String::new(),
            processable_text: None,
            mentions: Vec::new(),
            has_code: false,
            has_link: false,
            conversation: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_mentions<I, S>(mut self, mentions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mentions = mentions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conversation(mut self, conversation: impl Into<String>) -> Self {
        self.conversation = Some(conversation.into());
        self
    }

    /// Text with code blocks, links and mentions already replaced by the parser.
    pub fn processable_text(&self) -> &str {
        self.processable_text.as_deref().unwrap_or(&self.content)
    }

    /// Lowercased words, dropping special tokens such as `__MENTION__`.
    pub fn words(&self) -> Vec<String> {
        self.processable_text()
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() <= 4 || !(w.starts_with("__") && w.ends_with("__")))
            .map(str::to_string)
            .collect()
    }

    /// Lowercased words with special tokens, underscores and question marks blanked out.
    pub fn content_words(&self) -> Vec<String> {
        SPECIAL_TOKEN
            .replace_all(self.processable_text(), " ")
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Numeric part of a gold label of the form `T<n>`.
    pub fn conversation_number(&self) -> Result<i64, DisentangleError> {
        let label = self
            .conversation
            .as_deref()
            .ok_or_else(|| DisentangleError::MissingLabel(self.id.clone()))?;
        parse_conversation_label(label)
    }
}

pub fn parse_conversation_label(label: &str) -> Result<i64, DisentangleError> {
    label
        .trim()
        .strip_prefix('T')
        .and_then(|number| number.parse().ok())
        .ok_or_else(|| DisentangleError::MalformedLabel(label.to_string()))
}

/// Matches the special-token pattern at the start of a word.
pub(crate) fn is_special_token(word: &str) -> bool {
    SPECIAL_TOKEN.find(word).is_some_and(|m| m.start() == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_and_iso_timestamps() {
        let epoch: Message =
            serde_json::from_str(r#"{"id":"1","authorId":"a","timestamp":1600000000}"#).unwrap();
        assert_eq!(epoch.timestamp, Timestamp::Epoch(1_600_000_000));

        let numeric: Message =
            serde_json::from_str(r#"{"id":"1","authorId":"a","timestamp":"1600000000"}"#).unwrap();
        assert_eq!(numeric.timestamp.epoch_seconds(), 1_600_000_000);

        let iso: Message = serde_json::from_str(
            r#"{"id":"1","authorId":"a","timestamp":"2020-09-13T12:26:40+00:00"}"#,
        )
        .unwrap();
        assert_eq!(iso.timestamp.epoch_seconds(), 1_600_000_000);

        let naive = Timestamp::parse("2020-09-13 12:26:40").unwrap();
        assert_eq!(naive.epoch_seconds(), 1_600_000_000);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(Timestamp::parse("yesterday-ish").is_err());
    }

    #[test]
    fn mixed_timestamps_compare_on_the_same_instant() {
        let a = Timestamp::Epoch(1_600_000_000);
        let b = Timestamp::parse("2020-09-13T12:26:41Z").unwrap();
        assert!(a < b);
        assert_eq!(a.seconds_between(&b), 1);
        assert_eq!(b.seconds_between(&a), 1);
    }

    #[test]
    fn equal_instants_are_equal_across_forms() {
        let epoch = Timestamp::Epoch(0);
        let parsed = Timestamp::parse("1970-01-01T00:00:00Z").unwrap();
        assert_eq!(epoch.cmp(&parsed), Ordering::Equal);
        assert_eq!(epoch, parsed);

        let later = Timestamp::parse("1970-01-01T00:00:00.5Z").unwrap();
        assert_ne!(epoch, later);
        assert!(epoch < later);
    }

    #[test]
    fn words_drop_long_special_tokens() {
        let msg = Message::new("1", "a", Timestamp::Epoch(0)).with_content("Hi __MENTION__ ____ there");
        assert_eq!(msg.words(), vec!["hi", "____", "there"]);
    }

    #[test]
    fn content_words_blank_markers() {
        let msg = Message::new("1", "a", Timestamp::Epoch(0))
            .with_content("Does __CODE_BLOCK__ work? snake_case");
        assert_eq!(msg.content_words(), vec!["does", "work", "snake", "case"]);
    }

    #[test]
    fn conversation_labels() {
        let msg = Message::new("1", "a", Timestamp::Epoch(0)).with_conversation("T12");
        assert_eq!(msg.conversation_number().unwrap(), 12);
        assert!(parse_conversation_label("Tx").is_err());
        assert_eq!(parse_conversation_label(" T3 ").unwrap(), 3);
        for malformed in ["TT5", "5", "t5", "T"] {
            assert!(matches!(
                parse_conversation_label(malformed),
                Err(DisentangleError::MalformedLabel(label)) if label == malformed
            ));
        }
        let unlabelled = Message::new("2", "a", Timestamp::Epoch(0));
        assert!(matches!(
            unlabelled.conversation_number(),
            Err(DisentangleError::MissingLabel(_))
        ));
    }
}
