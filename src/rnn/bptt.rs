//! Backpropagation through time over a fixed amount of unrolled steps.

use std::ops::Range;

use log::trace;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, s};

use super::StepCache;
use crate::{
    MlErr, Result,
    arch::{Network, loss::LossFn},
};

/// A contiguous range of data points, every tensor shaped `(features, points, time)`.
#[derive(Clone, Copy)]
pub(super) struct Batch<'a> {
    pub predictors: ArrayView3<'a, f32>,
    pub responses: ArrayView3<'a, f32>,
    pub single: bool,
}

impl<'a> Batch<'a> {
    /// Views the data points in `points` of both tensors.
    pub fn new(
        predictors: &'a Array3<f32>,
        responses: &'a Array3<f32>,
        points: Range<usize>,
        single: bool,
    ) -> Self {
        Self {
            predictors: predictors.slice(s![.., points.clone(), ..]),
            responses: responses.slice(s![.., points, ..]),
            single,
        }
    }

    /// The target the network's output at `step` is compared against, if any.
    ///
    /// In single mode only the last unrolled step is scored, against the last response slice.
    fn target(&self, step: usize, steps: usize) -> Option<ArrayView2<'a, f32>> {
        match self.single {
            false => Some(slice(self.responses, step)),
            true if step + 1 == steps => {
                let last = self.responses.len_of(Axis(2)).checked_sub(1)?;
                Some(slice(self.responses, last))
            }
            true => None,
        }
    }
}

/// The amount of steps unrolled for sequences of `seq_len` slices, `rho == 0` meaning all of
/// them.
pub(super) fn unroll_len(rho: usize, seq_len: usize) -> usize {
    match rho {
        0 => seq_len,
        rho => rho.min(seq_len),
    }
}

/// The slice of `data` at time `step`.
fn slice(data: ArrayView3<'_, f32>, step: usize) -> ArrayView2<'_, f32> {
    data.index_axis_move(Axis(2), step)
}

/// Runs the network over the first `steps` slices of `predictors`, recording every layer's
/// output in `cache`. The recurrent state starts from zero.
pub(super) fn forward(
    network: &mut Network,
    params: &[f32],
    predictors: ArrayView3<f32>,
    steps: usize,
    cache: &mut StepCache,
) -> Result<()> {
    network.reset_cells();
    cache.clear();

    for step in 0..steps {
        let outputs = network.forward(params, slice(predictors, step))?;
        trace!(step = step; "forwarded step");
        cache.push(outputs);
    }

    Ok(())
}

/// The objective of the cached unroll: the sum of every scored step's loss.
pub(super) fn objective<L: LossFn>(
    loss_fn: &L,
    cache: &StepCache,
    batch: &Batch,
) -> Result<f32> {
    let steps = cache.len();
    let mut total = 0.0;

    for step in 0..steps {
        let Some(y) = batch.target(step, steps) else {
            continue;
        };

        let y_pred = cache.output(step).ok_or(MlErr::Uninitialized)?;
        total += loss_fn.loss(y_pred.view(), y);
    }

    Ok(total)
}

/// Propagates the error of every cached step back through the network, last step first, and
/// writes the summed gradient of the whole unroll to `grad`. Drains `cache`.
pub(super) fn backward<L: LossFn>(
    network: &mut Network,
    params: &[f32],
    loss_fn: &L,
    batch: &Batch,
    cache: &mut StepCache,
    grad: &mut [f32],
) -> Result<()> {
    grad.fill(0.0);
    let steps = cache.len();

    while let Some(outputs) = cache.pop() {
        let step = cache.len();
        let y_pred = outputs.last().ok_or(MlErr::EmptyNetwork)?;

        let error = match batch.target(step, steps) {
            Some(y) => loss_fn.loss_prime(y_pred.view(), y),
            None => Array2::zeros(y_pred.raw_dim()),
        };

        let x = slice(batch.predictors, step);
        let deltas = network.backward(params, step, x, &outputs, error)?;
        network.gradient(step, x, &outputs, &deltas, grad)?;
        trace!(step = step; "propagated step");
    }

    Ok(())
}
