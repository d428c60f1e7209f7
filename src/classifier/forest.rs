use std::fmt;

use linfa::Dataset;
use linfa::traits::{Fit, Predict};
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::{Classifier, ClassifierError, TrainingSet, single_row};

/// Bagged gini decision trees from `linfa-trees`; the probability is the share
/// of trees voting for the positive class.
pub struct RandomForest {
    trees: Vec<DecisionTree<f64, usize>>,
}

impl RandomForest {
    /// Each tree is grown on its own bootstrap sample. Tree `i` draws with
    /// seed `seed + i`, so a fit is reproducible regardless of thread scheduling.
    pub fn fit(
        training: &TrainingSet,
        trees: usize,
        max_depth: Option<usize>,
        seed: u64,
    ) -> Result<Self, ClassifierError> {
        let records = training.records()?;
        let targets = training.targets();
        let n = records.nrows();
        let params = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(max_depth);

        let trees = (0..trees)
            .into_par_iter()
            .map(|index| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(index as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let bootstrap = Dataset::new(records.select(Axis(0), &sample), targets.select(Axis(0), &sample));
                let tree: Result<DecisionTree<f64, usize>, linfa::Error> = params.fit(&bootstrap);
                tree.map_err(|e| ClassifierError::fit("decision tree", e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees })
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForest").field("trees", &self.trees.len()).finish()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let record = single_row(row);
        let votes = self
            .trees
            .iter()
            .filter(|tree| {
                let vote: Array1<usize> = tree.predict(&record);
                vote[0] == 1
            })
            .count();
        votes as f64 / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Label follows the first column; the other two are noise.
    fn first_column() -> TrainingSet {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..32 {
            let signal = u8::from(i % 4 < 2);
            rows.push(vec![f64::from(signal), f64::from(i % 2), f64::from(i % 3 == 0)]);
            labels.push(signal);
        }
        TrainingSet::new(rows, labels).unwrap()
    }

    #[test]
    fn votes_follow_the_signal() {
        let forest = RandomForest::fit(&first_column(), 25, None, 7).unwrap();
        assert_eq!(forest.len(), 25);
        assert!(forest.predict_proba(&[1.0, 0.0, 1.0]) > 0.5);
        assert!(forest.predict_proba(&[0.0, 1.0, 0.0]) < 0.5);
    }

    #[test]
    fn same_seed_same_votes() {
        let a = RandomForest::fit(&first_column(), 9, Some(3), 11).unwrap();
        let b = RandomForest::fit(&first_column(), 9, Some(3), 11).unwrap();
        for row in [[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 1.0, 0.0]] {
            assert_eq!(a.predict_proba(&row), b.predict_proba(&row));
        }
    }

    #[test]
    fn probability_is_a_share_of_trees() {
        let forest = RandomForest::fit(&first_column(), 4, Some(1), 3).unwrap();
        let p = forest.predict_proba(&[1.0, 1.0, 1.0]);
        assert!([0.0, 0.25, 0.5, 0.75, 1.0].contains(&p), "{p}");
    }
}
