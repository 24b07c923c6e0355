use ndarray::{linalg, prelude::*};

use super::{Layer, linear::check_len};
use crate::{MlErr, Result};

/// The weights, recurrent weights and biases of a `Recurrent` layer.
type Views<'a> = (ArrayView2<'a, f32>, ArrayView2<'a, f32>, ArrayView1<'a, f32>);
type ViewsMut<'a> = (
    ArrayViewMut2<'a, f32>,
    ArrayViewMut2<'a, f32>,
    ArrayViewMut1<'a, f32>,
);

/// An Elman cell, `h_t = tanh(W x_t + U h_{t-1} + b)` with `h_{-1} = 0`.
///
/// Its parameters are laid out as `W (hidden, in)`, then `U (hidden, hidden)`, then `b`.
///
/// The layer remembers every hidden state of the current unroll. On the way back it
/// carries the error flowing into the previous step's hidden state, so each `backward`
/// call must come right after the one for the following step.
#[derive(Debug, Clone)]
pub struct Recurrent {
    hidden: usize,
    in_dim: Option<usize>,

    // Forward metadata
    states: Vec<Array2<f32>>,

    // Backward metadata
    deltas: Vec<Option<Array2<f32>>>,
    carry: Option<Array2<f32>>,
}

impl Recurrent {
    /// Creates a new `Recurrent` layer whose input dimension is resolved lazily.
    ///
    /// # Arguments
    /// * `hidden` - The size of the hidden state, which is also the layer's output.
    pub fn new(hidden: usize) -> Self {
        Self {
            hidden,
            in_dim: None,
            states: Vec::new(),
            deltas: Vec::new(),
            carry: None,
        }
    }

    fn in_dim(&self) -> Result<usize> {
        self.in_dim.ok_or(MlErr::Uninitialized)
    }

    fn view_params<'a>(&self, params: &'a [f32]) -> Result<Views<'a>> {
        let in_dim = self.in_dim()?;
        check_len("recurrent parameters", params.len(), self.size())?;

        let (w_raw, rest) = params.split_at(self.hidden * in_dim);
        let (u_raw, b_raw) = rest.split_at(self.hidden * self.hidden);
        let w = ArrayView2::from_shape((self.hidden, in_dim), w_raw)?;
        let u = ArrayView2::from_shape((self.hidden, self.hidden), u_raw)?;
        let b = ArrayView1::from_shape(self.hidden, b_raw)?;
        Ok((w, u, b))
    }

    fn view_grad<'a>(&self, grad: &'a mut [f32]) -> Result<ViewsMut<'a>> {
        let in_dim = self.in_dim()?;
        check_len("recurrent gradient", grad.len(), self.size())?;

        let (dw_raw, rest) = grad.split_at_mut(self.hidden * in_dim);
        let (du_raw, db_raw) = rest.split_at_mut(self.hidden * self.hidden);
        let dw = ArrayViewMut2::from_shape((self.hidden, in_dim), dw_raw)?;
        let du = ArrayViewMut2::from_shape((self.hidden, self.hidden), du_raw)?;
        let db = ArrayViewMut1::from_shape(self.hidden, db_raw)?;
        Ok((dw, du, db))
    }
}

impl Layer for Recurrent {
    fn name(&self) -> &'static str {
        "recurrent"
    }

    fn resolve(&mut self, input_dim: usize) -> Result<usize> {
        self.in_dim = Some(input_dim);
        self.reset_cells();
        Ok(self.hidden)
    }

    fn size(&self) -> usize {
        self.in_dim
            .map_or(0, |in_dim| self.hidden * (in_dim + self.hidden + 1))
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (w, u, b) = self.view_params(params)?;
        check_len("recurrent input", x.nrows(), w.ncols())?;

        let mut z = w.dot(&x);
        if let Some(prev) = self.states.last() {
            check_len("recurrent batch", x.ncols(), prev.ncols())?;
            linalg::general_mat_mul(1.0, &u, prev, 1.0, &mut z);
        }
        z += &b.insert_axis(Axis(1));

        let h = z.mapv_into(f32::tanh);
        self.states.push(h.clone());
        Ok(h)
    }

    fn backward(
        &mut self,
        params: &[f32],
        step: usize,
        _x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let (w, u, _) = self.view_params(params)?;

        let mut dz = d.to_owned();
        if let Some(carry) = self.carry.take() {
            dz += &carry;
        }
        dz.zip_mut_with(&y, |dz, &h| *dz *= 1.0 - h * h);

        let dx = w.t().dot(&dz);
        self.carry = Some(u.t().dot(&dz));

        if self.deltas.len() <= step {
            self.deltas.resize_with(step + 1, || None);
        }
        self.deltas[step] = Some(dz);

        Ok(dx)
    }

    fn gradient(
        &mut self,
        step: usize,
        x: ArrayView2<f32>,
        _d: ArrayView2<f32>,
        grad: &mut [f32],
    ) -> Result<()> {
        let missing = |step| MlErr::MissingStep {
            layer: "recurrent",
            step,
        };
        let dz = self
            .deltas
            .get_mut(step)
            .and_then(Option::take)
            .ok_or_else(|| missing(step))?;

        let (mut dw, mut du, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &dz, &x.t(), 1.0, &mut dw);
        if step > 0 {
            let prev = self
                .states
                .get(step - 1)
                .ok_or_else(|| missing(step - 1))?;
            linalg::general_mat_mul(1.0, &dz, &prev.t(), 1.0, &mut du);
        }
        db += &dz.sum_axis(Axis(1));

        Ok(())
    }

    fn reset_cells(&mut self) {
        self.states.clear();
        self.deltas.clear();
        self.carry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(in_dim: usize, hidden: usize) -> Recurrent {
        let mut layer = Recurrent::new(hidden);
        layer.resolve(in_dim).unwrap();
        layer
    }

    #[test]
    fn size_counts_input_recurrent_and_bias_weights() {
        assert_eq!(resolved(3, 2).size(), 2 * 3 + 2 * 2 + 2);
    }

    #[test]
    fn state_feeds_into_the_next_step() {
        let mut layer = resolved(1, 1);
        // w = 1, u = 1, b = 0
        let params = [1.0, 1.0, 0.0];
        let x = array![[0.5]];

        let h0 = layer.forward(&params, x.view()).unwrap();
        let h1 = layer.forward(&params, x.view()).unwrap();

        assert_eq!(h0[[0, 0]], 0.5f32.tanh());
        assert_eq!(h1[[0, 0]], (0.5 + 0.5f32.tanh()).tanh());
    }

    #[test]
    fn reset_cells_starts_from_a_zero_state() {
        let mut layer = resolved(1, 1);
        let params = [1.0, 1.0, 0.0];
        let x = array![[0.5]];

        let first = layer.forward(&params, x.view()).unwrap();
        layer.forward(&params, x.view()).unwrap();
        layer.reset_cells();
        let again = layer.forward(&params, x.view()).unwrap();

        assert_eq!(first, again);
    }

    #[test]
    fn recurrent_error_reaches_earlier_steps() {
        let mut layer = resolved(1, 1);
        let params = [1.0, 1.0, 0.0];
        let x = array![[0.5]];

        let h0 = layer.forward(&params, x.view()).unwrap();
        let h1 = layer.forward(&params, x.view()).unwrap();

        let zero = array![[0.0]];
        let one = array![[1.0]];
        layer
            .backward(&params, 1, x.view(), h1.view(), one.view())
            .unwrap();
        let dx0 = layer
            .backward(&params, 0, x.view(), h0.view(), zero.view())
            .unwrap();

        assert_ne!(dx0[[0, 0]], 0.0);
    }

    #[test]
    fn gradient_without_backward_fails() {
        let mut layer = resolved(1, 1);
        let x = array![[0.5]];
        let mut grad = vec![0.0; 3];

        let err = layer
            .gradient(0, x.view(), x.view(), &mut grad)
            .unwrap_err();

        assert!(matches!(err, MlErr::MissingStep { step: 0, .. }));
    }
}
