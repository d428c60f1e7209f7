use std::sync::LazyLock;

use regex::Regex;

use super::{Feature, FeatureContext, FeatureError, collection, flag, pair_flags};
use crate::models::Message;

const GREETINGS: [&str; 3] = ["hey", "hi", "hello"];
const THANKS: [&str; 5] = ["thank", "thanks", "thx", "ty", "grateful"];

/// `\b(?:w1|w2|...)\b`, anchored to the start when `anchored` is set.
fn word_pattern(words: &[&str], anchored: bool) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    let prefix = if anchored { "^" } else { r"\b" };
    Regex::new(&format!(r"{prefix}(?:{})\b", alternatives.join("|"))).expect("escaped word list is a valid pattern")
}

static CUE_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| word_pattern(&collection(include_str!("../../collections/cue_words_answer.txt")), false));
static CUE_THANKS: LazyLock<Regex> =
    LazyLock::new(|| word_pattern(&collection(include_str!("../../collections/cue_words_thanks.txt")), false));
static CUE_THANKS_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    word_pattern(&collection(include_str!("../../collections/cue_words_thanks_answer.txt")), false)
});
static QUESTION_START: LazyLock<Regex> =
    LazyLock::new(|| word_pattern(&collection(include_str!("../../collections/question_words.txt")), true));

fn normalised(message: &Message) -> String {
    message.processable_text().trim().to_lowercase()
}

/// Answer, thanks and thanks-answer cue words, two bits each.
#[derive(Debug, Clone, Copy, Default)]
pub struct CueWords;

impl Feature for CueWords {
    fn name(&self) -> &'static str {
        "CueWords"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let (a, b) = (normalised(current), normalised(earlier));
        let mut vector = Vec::with_capacity(6);
        for cues in [&*CUE_ANSWER, &*CUE_THANKS, &*CUE_THANKS_ANSWER] {
            vector.push(flag(cues.is_match(&a)));
            vector.push(flag(cues.is_match(&b)));
        }
        Ok(vector)
    }
}

/// `[? in current, ? in earlier, current opens with a question word, earlier does]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Question;

impl Feature for Question {
    fn name(&self) -> &'static str {
        "Question"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(vec![
            flag(current.content.contains('?')),
            flag(earlier.content.contains('?')),
            flag(QUESTION_START.is_match(&normalised(current))),
            flag(QUESTION_START.is_match(&normalised(earlier))),
        ])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Long;

impl Feature for Long {
    fn name(&self) -> &'static str {
        "Long"
    }

    fn extract(&self, current: &Message, earlier: &Message, context: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        let limit = context.discourse_max_words;
        Ok(pair_flags(current, earlier, |m| m.words().len() > limit))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Greet;

impl Feature for Greet {
    fn name(&self) -> &'static str {
        "Greet"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(pair_flags(current, earlier, |m| contains_any(m, &GREETINGS)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Thanks;

impl Feature for Thanks {
    fn name(&self) -> &'static str {
        "Thanks"
    }

    fn extract(&self, current: &Message, earlier: &Message, _: &FeatureContext) -> Result<Vec<f64>, FeatureError> {
        Ok(pair_flags(current, earlier, |m| contains_any(m, &THANKS)))
    }
}

fn contains_any(message: &Message, needles: &[&str]) -> bool {
    message.words().iter().any(|w| needles.contains(&w.as_str()))
}
