use std::collections::{BTreeMap, HashMap};

use crate::error::{DisentangleError, Result};
use crate::models::{Community, Statistics, Timings, parse_conversation_label};

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

fn counts(labels: &[i64]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// One-to-one best-match F-score between two partitions of the same items.
///
/// Every gold conversation is matched with the predicted conversation that
/// gives it the highest F, weighted by the gold conversation's share of items.
pub fn micro_averaged_f_score(gold: &[i64], predicted: &[i64]) -> Result<f64> {
    if gold.len() != predicted.len() {
        return Err(DisentangleError::LengthMismatch {
            gold: gold.len(),
            predicted: predicted.len(),
        });
    }
    if gold.is_empty() {
        return Ok(0.0);
    }

    let predicted_sizes = counts(predicted);
    let mut overlaps: BTreeMap<(i64, i64), usize> = BTreeMap::new();
    for (&g, &p) in gold.iter().zip(predicted) {
        *overlaps.entry((g, p)).or_insert(0) += 1;
    }

    let total = gold.len() as f64;
    let score: f64 = counts(gold)
        .into_iter()
        .map(|(g, gold_size)| {
            let best = predicted_sizes
                .iter()
                .map(|(&p, &predicted_size)| {
                    let overlap = overlaps.get(&(g, p)).copied().unwrap_or(0);
                    harmonic_mean(ratio(overlap, predicted_size), ratio(overlap, gold_size))
                })
                .fold(0.0, f64::max);
            gold_size as f64 / total * best
        })
        .sum();
    Ok(score)
}

/// F-score between the conversation labels of two labelled copies of a community.
///
/// Messages are matched by id and compared in the gold file's order.
pub fn score_communities(gold: &Community, predicted: &Community) -> Result<f64> {
    let predicted_labels: HashMap<&str, &str> = predicted
        .messages()
        .filter_map(|m| m.conversation.as_deref().map(|c| (m.id.as_str(), c)))
        .collect();

    let mut gold_sequence = Vec::new();
    let mut predicted_sequence = Vec::new();
    for message in gold.messages() {
        gold_sequence.push(message.conversation_number()?);
        let label = predicted_labels
            .get(message.id.as_str())
            .ok_or_else(|| DisentangleError::MissingLabel(message.id.clone()))?;
        predicted_sequence.push(parse_conversation_label(label)?);
    }
    micro_averaged_f_score(&gold_sequence, &predicted_sequence)
}

/// Binary classification metrics for pairwise relatedness decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PairwiseMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl PairwiseMetrics {
    pub fn compute(labels: &[u8], predictions: &[u8]) -> Result<Self> {
        if labels.len() != predictions.len() {
            return Err(DisentangleError::LengthMismatch {
                gold: labels.len(),
                predicted: predictions.len(),
            });
        }

        let (mut correct, mut true_positive, mut false_positive, mut false_negative) = (0, 0, 0, 0);
        for (&truth, &guess) in labels.iter().zip(predictions) {
            match (truth == 1, guess == 1) {
                (true, true) => true_positive += 1,
                (false, true) => false_positive += 1,
                (true, false) => false_negative += 1,
                (false, false) => {}
            }
            correct += usize::from(truth == guess);
        }

        let precision = ratio(true_positive, true_positive + false_positive);
        let recall = ratio(true_positive, true_positive + false_negative);
        Ok(Self {
            accuracy: ratio(correct, labels.len()),
            precision,
            recall,
            f1_score: harmonic_mean(precision, recall),
        })
    }

    pub fn into_statistics(self, times: Timings) -> Statistics {
        Statistics {
            accuracy: Some(self.accuracy),
            precision: Some(self.precision),
            recall: Some(self.recall),
            f1_score: self.f1_score,
            times: Some(times),
        }
    }
}
