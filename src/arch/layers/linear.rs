use ndarray::{linalg, prelude::*};

use super::Layer;
use crate::{MlErr, Result};

/// A fully connected layer, `y = W x + b`.
///
/// Its parameters are laid out as the row major weights `(out, in)` followed by the biases.
#[derive(Debug, Clone)]
pub struct Linear {
    out_dim: usize,
    in_dim: Option<usize>,
}

impl Linear {
    /// Creates a new `Linear` layer whose input dimension is resolved lazily.
    ///
    /// # Arguments
    /// * `out_dim` - The amount of features this layer outputs.
    pub fn new(out_dim: usize) -> Self {
        Self {
            out_dim,
            in_dim: None,
        }
    }

    fn dim(&self) -> Result<(usize, usize)> {
        self.in_dim
            .map(|in_dim| (self.out_dim, in_dim))
            .ok_or(MlErr::Uninitialized)
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        let dim = self.dim()?;
        let w_size = dim.0 * dim.1;
        check_len("linear parameters", params.len(), w_size + dim.0)?;

        let (w_raw, b_raw) = params.split_at(w_size);
        let w = ArrayView2::from_shape(dim, w_raw)?;
        let b = ArrayView1::from_shape(dim.0, b_raw)?;
        Ok((w, b))
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        let dim = self.dim()?;
        let w_size = dim.0 * dim.1;
        check_len("linear gradient", grad.len(), w_size + dim.0)?;

        let (dw_raw, db_raw) = grad.split_at_mut(w_size);
        let dw = ArrayViewMut2::from_shape(dim, dw_raw)?;
        let db = ArrayViewMut1::from_shape(dim.0, db_raw)?;
        Ok((dw, db))
    }
}

pub(super) fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MlErr::SizeMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}

impl Layer for Linear {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn resolve(&mut self, input_dim: usize) -> Result<usize> {
        self.in_dim = Some(input_dim);
        Ok(self.out_dim)
    }

    fn size(&self) -> usize {
        self.in_dim.map_or(0, |in_dim| (in_dim + 1) * self.out_dim)
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (w, b) = self.view_params(params)?;
        check_len("linear input", x.nrows(), w.ncols())?;

        let mut y = w.dot(&x);
        y += &b.insert_axis(Axis(1));
        Ok(y)
    }

    fn backward(
        &mut self,
        params: &[f32],
        _step: usize,
        _x: ArrayView2<f32>,
        _y: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let (w, _) = self.view_params(params)?;
        Ok(w.t().dot(&d))
    }

    fn gradient(
        &mut self,
        _step: usize,
        x: ArrayView2<f32>,
        d: ArrayView2<f32>,
        grad: &mut [f32],
    ) -> Result<()> {
        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &d, &x.t(), 1.0, &mut dw);
        db += &d.sum_axis(Axis(1));
        Ok(())
    }
}
