use std::num::NonZeroUsize;

use log::{debug, info, warn};

use super::{Callback, GradientDescent, Optimizer, SeparableFunction};
use crate::{MlErr, Result};

/// Drives the minimization of a separable objective.
pub trait FunctionOptimizer {
    /// Minimizes `function` starting at `params`, which end up holding the result.
    ///
    /// # Returns
    /// The final objective or an error if occurred.
    fn optimize<F: SeparableFunction>(
        &mut self,
        function: &mut F,
        params: &mut [f32],
        callbacks: &mut [&mut dyn Callback],
    ) -> Result<f32>;
}

/// Mini-batch stochastic gradient descent.
///
/// Every epoch optionally shuffles the data, then walks it in contiguous batches, handing each
/// batch's gradient to the update rule. The epoch objective is the sum of the batch objectives.
#[derive(Debug, Clone)]
pub struct Sgd<O: Optimizer> {
    optimizer: O,
    batch_size: NonZeroUsize,
    max_epochs: usize,
    tolerance: f32,
    shuffle: bool,
}

impl<O: Optimizer> Sgd<O> {
    /// Creates a new `Sgd` driver.
    ///
    /// # Arguments
    /// * `optimizer` - The update rule.
    /// * `batch_size` - The amount of data points per update.
    /// * `max_epochs` - The maximum amount of passes over the data.
    /// * `tolerance` - Stop once the epoch objective changes less than this.
    /// * `shuffle` - Whether to shuffle the data before every epoch.
    pub fn new(
        optimizer: O,
        batch_size: NonZeroUsize,
        max_epochs: usize,
        tolerance: f32,
        shuffle: bool,
    ) -> Self {
        Self {
            optimizer,
            batch_size,
            max_epochs,
            tolerance,
            shuffle,
        }
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }
}

impl Default for Sgd<GradientDescent> {
    fn default() -> Self {
        Self::new(
            GradientDescent::new(0.01),
            NonZeroUsize::new(32).unwrap_or(NonZeroUsize::MIN),
            10,
            1e-5,
            true,
        )
    }
}

impl<O: Optimizer> FunctionOptimizer for Sgd<O> {
    fn optimize<F: SeparableFunction>(
        &mut self,
        function: &mut F,
        params: &mut [f32],
        callbacks: &mut [&mut dyn Callback],
    ) -> Result<f32> {
        let n = function.num_functions();
        if n == 0 {
            return Err(MlErr::NoData {
                begin: 0,
                batch_size: self.batch_size.get(),
                available: 0,
            });
        }

        for callback in callbacks.iter_mut() {
            callback.begin_optimization();
        }

        let batch_size = self.batch_size.get();
        let mut grad = vec![0.0; params.len()];
        let mut last = f32::INFINITY;
        let mut objective = f32::INFINITY;

        for epoch in 0..self.max_epochs {
            if self.shuffle {
                function.shuffle()?;
            }

            objective = 0.0;
            for begin in (0..n).step_by(batch_size) {
                let size = batch_size.min(n - begin);
                objective += function.evaluate_with_gradient(params, begin, &mut grad, size)?;
                self.optimizer.update_params(&grad, params)?;
            }

            if !objective.is_finite() {
                warn!(epoch = epoch, objective = objective; "objective diverged");
                break;
            }

            debug!(epoch = epoch, objective = objective; "finished epoch");

            let mut stop = false;
            for callback in callbacks.iter_mut() {
                stop |= callback.end_epoch(epoch, objective);
            }

            if (last - objective).abs() < self.tolerance {
                info!(epoch = epoch, objective = objective; "objective converged");
                break;
            }

            if stop {
                break;
            }

            last = objective;
        }

        for callback in callbacks.iter_mut() {
            callback.end_optimization(objective);
        }

        Ok(objective)
    }
}
