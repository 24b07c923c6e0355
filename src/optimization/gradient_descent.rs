use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;

        let lr = self.learning_rate;
        for (p, g) in params.iter_mut().zip(grad) {
            *p -= lr * g;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MlErr;

    #[test]
    fn steps_against_the_gradient() {
        let mut opt = GradientDescent::new(0.5);
        let mut params = [1.0, 1.0];

        opt.update_params(&[2.0, -2.0], &mut params).unwrap();

        assert_eq!(params, [0.0, 2.0]);
    }

    #[test]
    fn mismatched_lengths_fail() {
        let mut opt = GradientDescent::new(0.5);
        let err = opt.update_params(&[1.0], &mut [0.0; 2]).unwrap_err();
        assert!(matches!(err, MlErr::SizeMismatch { .. }));
    }
}
