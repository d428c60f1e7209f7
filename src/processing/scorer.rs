use rayon::prelude::*;
use tracing::{debug, info};

use crate::classifier::{self, Classifier, TrainingSet};
use crate::config::ClassifierConfig;
use crate::error::{DisentangleError, Result};
use crate::features::{FeatureContext, FeatureError, FeatureSet};
use crate::models::{CandidatePair, Relatedness, RelatednessLookup};

/// Collapses every non-zero value to 1.
pub fn binarize(vector: Vec<f64>) -> Vec<f64> {
    vector.into_iter().map(|v| if v != 0.0 { 1.0 } else { 0.0 }).collect()
}

/// Binarized feature rows for `pairs`, in pair order.
pub fn extract_rows(
    features: &FeatureSet,
    context: &FeatureContext,
    pairs: &[CandidatePair<'_>],
) -> Result<Vec<Vec<f64>>, FeatureError> {
    features.check_context(context)?;
    pairs
        .par_iter()
        .map(|pair| features.extract(pair.current, pair.earlier, context).map(binarize))
        .collect()
}

/// Gold labels for `pairs`: 1 when both messages share a conversation.
pub fn pair_labels(pairs: &[CandidatePair<'_>]) -> Result<Vec<u8>> {
    pairs
        .iter()
        .map(|pair| {
            for message in [pair.current, pair.earlier] {
                if message.conversation.is_none() {
                    return Err(DisentangleError::MissingLabel(message.id.clone()));
                }
            }
            Ok(u8::from(pair.same_conversation() == Some(true)))
        })
        .collect()
}

/// Labelled rows accumulated across channels before fitting.
#[derive(Debug, Default)]
pub struct PairMatrix {
    rows: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl PairMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(
        &mut self,
        features: &FeatureSet,
        context: &FeatureContext,
        pairs: &[CandidatePair<'_>],
    ) -> Result<()> {
        let labels = pair_labels(pairs)?;
        let rows = extract_rows(features, context, pairs)?;
        self.rows.extend(rows);
        self.labels.extend(labels);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_training_set(self) -> Result<TrainingSet> {
        Ok(TrainingSet::new(self.rows, self.labels)?)
    }
}

/// A fitted classifier bound to the feature set it was trained on.
#[derive(Debug)]
pub struct RelatednessScorer {
    features: FeatureSet,
    classifier: Box<dyn Classifier>,
}

impl RelatednessScorer {
    pub fn train(features: FeatureSet, config: &ClassifierConfig, matrix: PairMatrix) -> Result<Self> {
        let training = matrix.into_training_set()?;
        info!(
            features = %features.label(),
            pairs = training.len(),
            positives = training.positives(),
            "Training relatedness scorer"
        );
        let classifier = classifier::fit(config, training)?;
        Ok(Self { features, classifier })
    }

    pub fn from_parts(features: FeatureSet, classifier: Box<dyn Classifier>) -> Self {
        Self { features, classifier }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Positive-class probability for every pair, in pair order.
    pub fn score(&self, pairs: &[CandidatePair<'_>], context: &FeatureContext) -> Result<Vec<Relatedness>> {
        let rows = extract_rows(&self.features, context, pairs)?;
        let records: Vec<Relatedness> = pairs
            .par_iter()
            .zip(rows.par_iter())
            .map(|(pair, row)| Relatedness::new(pair, self.classifier.predict_proba(row)))
            .collect();
        debug!(pairs = records.len(), "Scored candidate pairs");
        Ok(records)
    }

    /// Scores `pairs` straight into a lookup keyed by current then earlier id.
    pub fn lookup(&self, pairs: &[CandidatePair<'_>], context: &FeatureContext) -> Result<RelatednessLookup> {
        Ok(self.score(pairs, context)?.into_iter().collect())
    }
}

/// Binary decisions for scored pairs.
pub fn predictions(records: &[Relatedness]) -> Vec<u8> {
    records
        .iter()
        .map(|r| u8::from(r.probability > 0.5))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifierKind, FeatureConfig};
    use crate::features::{FeatureGroup, Speaker, Time};
    use crate::models::{Message, Timestamp};

    fn labelled(id: &str, author: &str, t: i64, conversation: &str) -> Message {
        Message::new(id, author, Timestamp::Epoch(t)).with_conversation(conversation)
    }

    /// Trusts the speaker flag outright.
    #[derive(Debug)]
    struct SpeakerRule;

    impl Classifier for SpeakerRule {
        fn predict_proba(&self, row: &[f64]) -> f64 {
            if row.first() == Some(&1.0) { 0.95 } else { 0.27 }
        }
    }

    fn speaker_only() -> FeatureSet {
        FeatureSet::custom("speaker", vec![Box::new(Speaker)])
    }

    #[test]
    fn binarize_clips_non_zero_values() {
        assert_eq!(binarize(vec![0.0, 2.0, -1.0, 0.3]), vec![0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_gold_label_is_fatal() {
        let a = labelled("1", "x", 0, "T1");
        let b = Message::new("2", "y", Timestamp::Epoch(1));
        let err = pair_labels(&[CandidatePair::new(&b, &a)]).unwrap_err();
        assert!(matches!(err, DisentangleError::MissingLabel(id) if id == "2"));
    }

    #[test]
    fn labels_compare_conversations() {
        let a = labelled("1", "x", 0, "T1");
        let b = labelled("2", "y", 1, "T1");
        let c = labelled("3", "y", 2, "T2");
        let labels = pair_labels(&[CandidatePair::new(&b, &a), CandidatePair::new(&c, &b)]).unwrap();
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn missing_context_is_surfaced() {
        let a = labelled("1", "x", 0, "T1");
        let b = labelled("2", "y", 1, "T1");
        let context = FeatureContext::new(&FeatureConfig::default());
        let features = FeatureSet::group(FeatureGroup::Content);
        let err = extract_rows(&features, &context, &[CandidatePair::new(&b, &a)]).unwrap_err();
        assert!(matches!(err, FeatureError::MissingContext { feature: "Repeat", .. }));
    }

    #[test]
    fn rows_are_binary_and_in_pair_order() {
        let a = labelled("1", "x", 0, "T1");
        let b = labelled("2", "x", 1, "T1");
        let c = labelled("3", "y", 5000, "T2");
        let config = FeatureConfig {
            chat_bins: 10,
            ..FeatureConfig::default()
        };
        let features = FeatureSet::custom("chat", vec![Box::new(Time), Box::new(Speaker)]);
        let context = FeatureContext::new(&config);
        let rows = extract_rows(&features, &context, &[CandidatePair::new(&b, &a), CandidatePair::new(&c, &b)]).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().flatten().all(|&v| v == 0.0 || v == 1.0));
        assert_eq!(rows[0].last(), Some(&1.0));
        assert_eq!(rows[1].last(), Some(&0.0));
    }

    #[test]
    fn trained_scorer_prefers_same_speaker_pairs() {
        let mut messages = Vec::new();
        for i in 0..20 {
            let author = if i % 2 == 0 { "x" } else { "y" };
            let conversation = if i % 2 == 0 { "T1" } else { "T2" };
            messages.push(labelled(&i.to_string(), author, i, conversation));
        }
        // two back is the same speaker and conversation, one back never is
        let same = messages.windows(3).map(|w| CandidatePair::new(&w[2], &w[0]));
        let other = messages.windows(2).map(|w| CandidatePair::new(&w[1], &w[0]));
        let pairs: Vec<_> = same.chain(other).collect();

        let features = speaker_only();
        let context = FeatureContext::new(&FeatureConfig::default());
        let mut matrix = PairMatrix::new();
        matrix.extend(&features, &context, &pairs).unwrap();
        assert_eq!(matrix.len(), pairs.len());

        let config = ClassifierConfig {
            kind: ClassifierKind::LogisticRegression,
            ..ClassifierConfig::default()
        };
        let scorer = RelatednessScorer::train(features, &config, matrix).unwrap();
        let lookup = scorer.lookup(&pairs, &context).unwrap();
        assert!(lookup.get("2", "0").unwrap().probability > 0.5);
        assert!(lookup.get("1", "0").unwrap().probability < 0.5);
    }

    #[test]
    fn scores_follow_the_classifier() {
        let a = labelled("1", "x", 0, "T1");
        let b = labelled("2", "x", 1, "T1");
        let c = labelled("3", "y", 2, "T1");
        let scorer = RelatednessScorer::from_parts(speaker_only(), Box::new(SpeakerRule));
        let context = FeatureContext::new(&FeatureConfig::default());
        let records = scorer
            .score(&[CandidatePair::new(&b, &a), CandidatePair::new(&c, &b)], &context)
            .unwrap();
        assert_eq!(predictions(&records), vec![1, 0]);
        assert_eq!(records[0].earlier_id, "1");
        assert_eq!(records[1].probability, 0.27);
    }
}
