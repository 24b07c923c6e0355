use ndarray::{Array2, ArrayView2};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::Layer;
use crate::{MlErr, Result};

/// Inverted dropout: while training each unit is zeroed with probability `ratio` and the
/// survivors are scaled by `1 / (1 - ratio)`. In deterministic mode it's the identity.
///
/// A fresh mask is drawn for every time step and kept until the step is propagated back.
#[derive(Debug, Clone)]
pub struct Dropout {
    ratio: f32,
    deterministic: bool,
    rng: StdRng,
    masks: Vec<Option<Array2<f32>>>,
}

impl Dropout {
    /// Creates a new `Dropout` layer.
    ///
    /// # Arguments
    /// * `ratio` - The probability of dropping a unit, in `[0, 1)`.
    /// * `seed` - The seed for the masks.
    pub fn new(ratio: f32, seed: u64) -> Self {
        Self {
            ratio: ratio.clamp(0.0, 1.0 - f32::EPSILON),
            deterministic: false,
            rng: StdRng::seed_from_u64(seed),
            masks: Vec::new(),
        }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }
}

impl Layer for Dropout {
    fn name(&self) -> &'static str {
        "dropout"
    }

    fn resolve(&mut self, input_dim: usize) -> Result<usize> {
        Ok(input_dim)
    }

    fn size(&self) -> usize {
        0
    }

    fn forward(&mut self, _params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if self.deterministic || self.ratio == 0.0 {
            self.masks.push(None);
            return Ok(x.to_owned());
        }

        let keep = 1.0 - self.ratio;
        let scale = 1.0 / keep;
        let mask = Array2::from_shape_fn(x.raw_dim(), |_| {
            if self.rng.random::<f32>() < keep {
                scale
            } else {
                0.0
            }
        });

        let y = &x * &mask;
        self.masks.push(Some(mask));
        Ok(y)
    }

    fn backward(
        &mut self,
        _params: &[f32],
        step: usize,
        _x: ArrayView2<f32>,
        _y: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let mask = self.masks.get(step).ok_or(MlErr::MissingStep {
            layer: "dropout",
            step,
        })?;

        Ok(match mask {
            Some(mask) => &d * mask,
            None => d.to_owned(),
        })
    }

    fn gradient(
        &mut self,
        _step: usize,
        _x: ArrayView2<f32>,
        _d: ArrayView2<f32>,
        _grad: &mut [f32],
    ) -> Result<()> {
        Ok(())
    }

    fn set_deterministic(&mut self, deterministic: bool) {
        self.deterministic = deterministic;
    }

    fn reset_cells(&mut self) {
        self.masks.clear();
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;

    #[test]
    fn deterministic_mode_is_the_identity() {
        let mut layer = Dropout::new(0.5, 7);
        layer.set_deterministic(true);
        let x = Array2::from_elem((3, 4), 2.0);

        let y = layer.forward(&[], x.view()).unwrap();

        assert_eq!(y, x);
    }

    #[test]
    fn training_mode_zeroes_or_scales() {
        let mut layer = Dropout::new(0.5, 7);
        let x = Array2::from_elem((8, 8), 1.0);

        let y = layer.forward(&[], x.view()).unwrap();

        assert!(y.iter().all(|&v| v == 0.0 || v == 2.0));
        assert!(y.iter().any(|&v| v == 0.0));
    }

    #[test]
    fn backward_reuses_the_step_mask() {
        let mut layer = Dropout::new(0.5, 11);
        let x = Array2::from_elem((4, 4), 1.0);

        let y = layer.forward(&[], x.view()).unwrap();
        let dx = layer.backward(&[], 0, x.view(), y.view(), x.view()).unwrap();

        assert_eq!(dx, y);
    }
}
