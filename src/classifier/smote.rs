use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{ClassifierError, TrainingSet};

/// Synthetic minority oversampling: new minority rows are interpolated between
/// a minority sample and one of its nearest minority neighbours until both
/// classes have the same size.
#[derive(Debug, Clone, Copy)]
pub struct Smote {
    neighbors: usize,
    seed: u64,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Smote {
    pub fn new(neighbors: usize, seed: u64) -> Self {
        Self { neighbors, seed }
    }

    pub fn fit_resample(&self, mut training: TrainingSet) -> Result<TrainingSet, ClassifierError> {
        let positives = training.positives();
        let negatives = training.len() - positives;
        if positives == negatives {
            return Ok(training);
        }

        let (minority_label, deficit) = if positives < negatives {
            (1u8, negatives - positives)
        } else {
            (0u8, positives - negatives)
        };
        let minority: Vec<usize> = (0..training.len())
            .filter(|&i| training.labels[i] == minority_label)
            .collect();
        if minority.len() < 2 {
            return Err(ClassifierError::InsufficientMinority(minority.len()));
        }

        let k = self.neighbors.min(minority.len() - 1);
        let neighbours = self.nearest_neighbours(&training, &minority, k);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut synthetic = Vec::with_capacity(deficit);
        for _ in 0..deficit {
            let pick = rng.gen_range(0..minority.len());
            let neighbour = neighbours[pick][rng.gen_range(0..k)];
            let gap: f64 = rng.r#gen();

            let base = &training.rows[minority[pick]];
            let other = &training.rows[neighbour];
            synthetic.push(base.iter().zip(other).map(|(x, y)| x + gap * (y - x)).collect::<Vec<f64>>());
        }

        training.labels.extend(std::iter::repeat_n(minority_label, synthetic.len()));
        training.rows.extend(synthetic);
        Ok(training)
    }

    /// For each minority sample, the row indices of its `k` closest other minority samples.
    fn nearest_neighbours(&self, training: &TrainingSet, minority: &[usize], k: usize) -> Vec<Vec<usize>> {
        minority
            .iter()
            .map(|&i| {
                let mut distances: Vec<(f64, usize)> = minority
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| (squared_distance(&training.rows[i], &training.rows[j]), j))
                    .collect();
                distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                distances.into_iter().take(k).map(|(_, j)| j).collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> TrainingSet {
        let mut rows = vec![vec![0.0, 0.0]; 8];
        let mut labels = vec![0; 8];
        rows.extend([vec![1.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        labels.extend([1, 1, 1]);
        TrainingSet::new(rows, labels).unwrap()
    }

    #[test]
    fn balances_classes() {
        let resampled = Smote::new(5, 3).fit_resample(imbalanced()).unwrap();
        assert_eq!(resampled.len(), 16);
        assert_eq!(resampled.positives(), 8);
    }

    #[test]
    fn synthetic_rows_lie_between_minority_samples() {
        let resampled = Smote::new(2, 9).fit_resample(imbalanced()).unwrap();
        for row in &resampled.rows[11..] {
            assert!(row.iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(row.iter().sum::<f64>() >= 1.0 - 1e-12, "{row:?}");
        }
    }

    #[test]
    fn balanced_input_is_untouched() {
        let set = TrainingSet::new(vec![vec![0.0], vec![1.0]], vec![0, 1]).unwrap();
        assert_eq!(Smote::new(5, 0).fit_resample(set.clone()).unwrap(), set);
    }

    #[test]
    fn lone_minority_sample_is_an_error() {
        let set = TrainingSet::new(vec![vec![0.0], vec![0.0], vec![1.0]], vec![0, 0, 1]).unwrap();
        assert!(matches!(
            Smote::new(5, 0).fit_resample(set),
            Err(ClassifierError::InsufficientMinority(1))
        ));
    }
}
