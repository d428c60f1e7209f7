use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::clustering::GreedyClusterer;
use super::evaluation::{PairwiseMetrics, micro_averaged_f_score};
use super::pairs::PairGenerator;
use super::scorer::{PairMatrix, RelatednessScorer, pair_labels, predictions};
use crate::config::DisentanglerConfig;
use crate::error::{DisentangleError, Result};
use crate::features::{COMBINED_LABEL, FeatureContext, FeatureGroup, FeatureSet};
use crate::models::{Channel, ChannelStats, Community, Message, RelatednessLookup, Statistics, Timings};

/// Outcome of scoring and clustering one channel against its gold labels.
struct ChannelEvaluation {
    pairwise: Statistics,
    clustering: Statistics,
    labels: HashMap<String, String>,
}

/// Train, predict and validate entry point.
///
/// Holds the configuration and, once trained, the relatedness scorer used by
/// [`Disentangler::predict`].
#[derive(Debug)]
pub struct Disentangler {
    config: DisentanglerConfig,
    pairs: PairGenerator,
    scorer: Option<RelatednessScorer>,
}

fn channel_name(channel: &Channel) -> &str {
    if channel.name.is_empty() { &channel.id } else { &channel.name }
}

fn gold_sequence(messages: &[&Message]) -> Result<Vec<i64>> {
    messages.iter().map(|m| m.conversation_number()).collect()
}

impl Disentangler {
    pub fn new(config: DisentanglerConfig) -> Result<Self> {
        config.validate()?;
        let pairs = PairGenerator::from_config(&config.pairing)?;
        Ok(Self {
            config,
            pairs,
            scorer: None,
        })
    }

    pub fn config(&self) -> &DisentanglerConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.scorer.is_some()
    }

    /// Fits a scorer on every non-empty channel of `training`, replacing any previous one.
    pub fn train(&mut self, training: &Community, features: FeatureSet) -> Result<Duration> {
        let started = Instant::now();
        self.scorer = Some(self.fit(training, features)?);
        Ok(started.elapsed())
    }

    fn fit(&self, training: &Community, features: FeatureSet) -> Result<RelatednessScorer> {
        let context = FeatureContext::build(&features, &self.config.features, training.messages());
        let mut matrix = PairMatrix::new();
        for channel in training.channels.iter().filter(|c| !c.messages.is_empty()) {
            let sorted = channel.time_sorted();
            let pairs = self.pairs.generate(&sorted);
            matrix.extend(&features, &context, &pairs)?;
        }
        RelatednessScorer::train(features, &self.config.classifier, matrix)
    }

    /// Labels every message of `community` with a predicted `T<n>` conversation.
    pub fn predict(&self, community: &mut Community) -> Result<Vec<ChannelStats>> {
        let scorer = self.scorer.as_ref().ok_or(DisentangleError::NotTrained)?;
        let context = FeatureContext::build(scorer.features(), &self.config.features, community.messages());

        let mut stats = Vec::new();
        for channel in community.channels.iter_mut().filter(|c| !c.messages.is_empty()) {
            let started = Instant::now();
            let (clustering, pairs_scored) = {
                let sorted = channel.time_sorted();
                let pairs = self.pairs.generate(&sorted);
                let lookup = scorer.lookup(&pairs, &context)?;
                (GreedyClusterer::new().cluster(sorted.iter().copied(), &lookup), pairs.len())
            };
            channel.apply_labels(&clustering.labels());

            let channel_stats = ChannelStats {
                name: channel_name(channel).to_string(),
                messages_processed: channel.messages.len(),
                pairs_scored,
                conversations_found: clustering.len(),
                time_taken: started.elapsed(),
            };
            info!(
                channel = %channel_stats.name,
                messages = channel_stats.messages_processed,
                conversations = channel_stats.conversations_found,
                "Disentangled channel"
            );
            stats.push(channel_stats);
        }
        Ok(stats)
    }

    /// Trains and evaluates each feature group against the gold labels of `community`.
    ///
    /// Statistics land in `community.statistics`, keyed by channel id and then by
    /// the group name and `<group>-clustering`. Unless exactly one group is given,
    /// all features are also evaluated under `Combined`; that run's predictions are
    /// written back onto the messages and its scorer is kept.
    pub fn validate(&mut self, training: &Community, community: &mut Community, groups: &[FeatureGroup]) -> Result<()> {
        let mut runs: Vec<FeatureSet> = groups.iter().map(|&g| FeatureSet::group(g)).collect();
        let combined = groups.len() != 1;
        if combined {
            runs.push(FeatureSet::all());
        }

        for features in runs {
            let label = features.label().to_string();
            let is_combined = label == COMBINED_LABEL;

            let started = Instant::now();
            let scorer = self.fit(training, features)?;
            let train_time = started.elapsed();
            let context = FeatureContext::build(scorer.features(), &self.config.features, community.messages());

            for channel in community.channels.iter_mut().filter(|c| !c.messages.is_empty()) {
                let evaluation = self.evaluate_channel(&scorer, &context, channel, train_time)?;
                info!(
                    channel = %channel_name(channel),
                    features = %label,
                    pairwise_f1 = evaluation.pairwise.f1_score,
                    clustering_f = evaluation.clustering.f1_score,
                    "Validated channel"
                );

                let table = community.statistics.entry(channel.id.clone()).or_default();
                table.insert(label.clone(), evaluation.pairwise);
                table.insert(format!("{label}-clustering"), evaluation.clustering);
                if is_combined {
                    channel.apply_labels(&evaluation.labels);
                }
            }

            if is_combined {
                self.scorer = Some(scorer);
            }
        }

        if community.statistics.is_empty() {
            warn!("No non-empty channels to validate");
        }
        Ok(())
    }

    fn evaluate_channel(
        &self,
        scorer: &RelatednessScorer,
        context: &FeatureContext,
        channel: &Channel,
        train_time: Duration,
    ) -> Result<ChannelEvaluation> {
        let sorted = channel.time_sorted();
        let gold = gold_sequence(&sorted)?;
        let pairs = self.pairs.generate(&sorted);
        let labels = pair_labels(&pairs)?;

        let started = Instant::now();
        let records = scorer.score(&pairs, context)?;
        let scoring_time = started.elapsed();

        let started = Instant::now();
        let lookup: RelatednessLookup = records.iter().cloned().collect();
        let clustering = GreedyClusterer::new().cluster(sorted.iter().copied(), &lookup);
        let clustering_time = started.elapsed();

        let times = Timings {
            train_time: train_time.as_secs_f64(),
            scoring_time: scoring_time.as_secs_f64(),
            clustering_time: clustering_time.as_secs_f64(),
            total_time: (train_time + scoring_time + clustering_time).as_secs_f64(),
        };
        let pairwise = PairwiseMetrics::compute(&labels, &predictions(&records))?.into_statistics(times);
        let f_score = micro_averaged_f_score(&gold, &clustering.sequence(sorted.iter().copied()))?;

        Ok(ChannelEvaluation {
            pairwise,
            clustering: Statistics::clustering(f_score),
            labels: clustering.labels(),
        })
    }
}
