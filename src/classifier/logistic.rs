use std::fmt;

use linfa::traits::Fit;
use linfa_logistic::FittedLogisticRegression;
use ndarray::Array1;

use super::{Classifier, ClassifierError, TrainingSet, single_row};

/// Binary logistic regression fitted by L-BFGS through `linfa-logistic`.
///
/// `alpha` is the L2 penalty; zero leaves the fit unpenalised.
pub struct LogisticRegression {
    model: FittedLogisticRegression<f64, usize>,
}

impl LogisticRegression {
    pub fn fit(
        training: &TrainingSet,
        alpha: f64,
        max_iterations: u64,
        tolerance: f64,
    ) -> Result<Self, ClassifierError> {
        let dataset = training.to_dataset()?;
        let model = linfa_logistic::LogisticRegression::default()
            .alpha(alpha)
            .max_iterations(max_iterations)
            .gradient_tolerance(tolerance)
            .fit(&dataset)
            .map_err(|e| ClassifierError::fit("logistic regression", e))?;
        Ok(Self { model })
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        self.model.params()
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept()
    }
}

impl fmt::Debug for LogisticRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogisticRegression")
            .field("coefficients", &self.coefficients().to_vec())
            .field("intercept", &self.intercept())
            .finish()
    }
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        // probability of the larger label, which is 1
        self.model.predict_probabilities(&single_row(row))[0]
    }
}
