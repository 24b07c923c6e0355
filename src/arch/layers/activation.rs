use ndarray::{Array2, ArrayView2};

use super::Layer;
use crate::{Result, arch::activations::ActFn};

/// An element wise activation stage without parameters.
#[derive(Debug, Clone)]
pub struct Activation {
    act_fn: ActFn,
}

impl Activation {
    pub fn new(act_fn: ActFn) -> Self {
        Self { act_fn }
    }
}

impl Layer for Activation {
    fn name(&self) -> &'static str {
        "activation"
    }

    fn resolve(&mut self, input_dim: usize) -> Result<usize> {
        Ok(input_dim)
    }

    fn size(&self) -> usize {
        0
    }

    fn forward(&mut self, _params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(x.mapv(|z| self.act_fn.f(z)))
    }

    fn backward(
        &mut self,
        _params: &[f32],
        _step: usize,
        _x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let mut dx = d.to_owned();
        dx.zip_mut_with(&y, |d, &a| *d *= self.act_fn.df_from_output(a));
        Ok(dx)
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
}
