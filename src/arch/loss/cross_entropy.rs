use ndarray::{Array2, ArrayView2, Zip};

use super::LossFn;

const EPS: f32 = 1e-7;

/// Binary cross entropy over predictions in `(0, 1)`, averaged over every element.
///
/// Predictions are clamped away from 0 and 1 so the loss stays finite.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        if y_pred.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        Zip::from(&y_pred).and(&y).for_each(|&p, &t| {
            let p = p.clamp(EPS, 1.0 - EPS);
            total -= t * p.ln() + (1.0 - t) * (1.0 - p).ln();
        });

        total / y_pred.len() as f32
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let n = y_pred.len().max(1) as f32;
        Zip::from(&y_pred).and(&y).map_collect(|&p, &t| {
            let p = p.clamp(EPS, 1.0 - EPS);
            (p - t) / (p * (1.0 - p) * n)
        })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn confident_right_answers_cost_little() {
        let y = array![[1.0, 0.0]];
        let good = array![[0.99, 0.01]];
        let bad = array![[0.01, 0.99]];

        let l_good = CrossEntropy.loss(good.view(), y.view());
        let l_bad = CrossEntropy.loss(bad.view(), y.view());

        assert!(l_good < 0.02);
        assert!(l_bad > 4.0);
    }

    #[test]
    fn derivative_matches_finite_differences() {
        let y = array![[1.0]];
        let p = 0.3f32;
        let h = 1e-3;

        let plus = CrossEntropy.loss(array![[p + h]].view(), y.view());
        let minus = CrossEntropy.loss(array![[p - h]].view(), y.view());
        let numeric = (plus - minus) / (2.0 * h);
        let analytic = CrossEntropy.loss_prime(array![[p]].view(), y.view())[[0, 0]];

        assert!((numeric - analytic).abs() < 1e-2);
    }
}
