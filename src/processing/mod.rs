//! Pairing, scoring, clustering and evaluation stages, and the pipeline tying them together.

pub mod clustering;
pub mod evaluation;
pub mod pairs;
pub mod pipeline;
pub mod scorer;

pub use clustering::{Clustering, GreedyClusterer};
pub use evaluation::{PairwiseMetrics, micro_averaged_f_score, score_communities};
pub use pairs::PairGenerator;
pub use pipeline::Disentangler;
pub use scorer::{PairMatrix, RelatednessScorer, binarize};
