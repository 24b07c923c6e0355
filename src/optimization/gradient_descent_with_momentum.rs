use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

/// Gradient descent with a velocity term, sized on the first update.
#[derive(Debug, Clone)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    velocity: Vec<f32>,
}

impl GradientDescentWithMomentum {
    /// Creates a new `GradientDescentWithMomentum` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `momentum` - The fraction of the previous velocity kept on every update.
    pub fn new(learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: Vec::new(),
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;

        if self.velocity.len() != params.len() {
            self.velocity = vec![0.0; params.len()];
        }

        let lr = self.learning_rate;
        let mu = self.momentum;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.velocity.iter_mut())
            .for_each(|((p, g), v)| {
                *v = (mu * *v) + g;
                *p -= lr * *v;
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_builds_up() {
        let mut opt = GradientDescentWithMomentum::new(1.0, 0.5);
        let mut params = [0.0];

        opt.update_params(&[1.0], &mut params).unwrap();
        opt.update_params(&[1.0], &mut params).unwrap();

        // v1 = 1, v2 = 1.5
        assert_eq!(params, [-2.5]);
    }
}
