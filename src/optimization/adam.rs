use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

/// Adam. The moment estimates are sized on the first update and start over whenever the
/// parameter count changes.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step: i32,
    moments: Vec<(f32, f32)>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            step: 0,
            moments: Vec::new(),
        }
    }

    /// The learning rate scaled by both bias corrections of the current step.
    fn step_size(&self) -> f32 {
        let bc1 = 1. - self.beta1.powi(self.step);
        let bc2 = 1. - self.beta2.powi(self.step);
        self.learning_rate * bc2.sqrt() / bc1
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.001, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;

        if self.moments.len() != params.len() {
            self.moments = vec![(0., 0.); params.len()];
            self.step = 0;
        }

        self.step = self.step.saturating_add(1);
        let step_size = self.step_size();
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);

        for ((p, &g), (m, v)) in params.iter_mut().zip(grad).zip(&mut self.moments) {
            *m = b1 * *m + (1. - b1) * g;
            *v = b2 * *v + (1. - b2) * g * g;
            *p -= step_size * *m / (v.sqrt() + eps);
        }

        Ok(())
    }
}
