use ndarray::{Array2, ArrayView2, Zip};

use super::LossFn;

/// Mean squared error loss function.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        let mut total = 0.0;
        Zip::from(&y_pred)
            .and(&y)
            .for_each(|&p, &t| total += (p - t).powi(2));

        if y_pred.is_empty() {
            0.0
        } else {
            total / y_pred.len() as f32
        }
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        let scale = 2.0 / y_pred.len().max(1) as f32;
        (&y_pred - &y) * scale
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn averages_over_every_element() {
        let y_pred = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![[0.0, 2.0], [3.0, 2.0]];

        assert_eq!(Mse.loss(y_pred.view(), y.view()), 5.0 / 4.0);
        assert_eq!(
            Mse.loss_prime(y_pred.view(), y.view()),
            array![[0.5, 0.0], [0.0, 1.0]]
        );
    }
}
