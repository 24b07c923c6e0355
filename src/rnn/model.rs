use log::{debug, info, warn};
use ndarray::{Array3, ArrayView3, Axis, s};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::{
    StepCache,
    bptt::{self, Batch, unroll_len},
};
use crate::{
    MlErr, Result,
    arch::{Network, layers::Layer, loss::LossFn},
    initialization::ParamGen,
    optimization::{Callback, FunctionOptimizer, Sgd},
};

/// The amount of data points `predict` runs at once unless told otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// A recurrent network trained with truncated backpropagation through time.
///
/// Sequence batches are `(features, points, time)` tensors. Every call unrolls the network over
/// the first `T` time slices, where `T` is `rho` clamped to the sequence length (`rho == 0`
/// unrolls all of them), starting from a zero recurrent state.
///
/// The layer shapes and the flat parameter vector are resolved the first time data is seen and
/// are kept from then on. The objective over a range of data points is the sum of every scored
/// step's loss, every step is scored unless `single` is set, in which case only the last
/// unrolled step is, against the last response slice.
pub struct Rnn<L: LossFn, G: ParamGen> {
    rho: usize,
    single: bool,
    loss_fn: L,
    param_gen: G,
    network: Network,
    parameters: Vec<f32>,
    predictors: Array3<f32>,
    responses: Array3<f32>,
    resolved: bool,
    deterministic: bool,
    cache: StepCache,
    rng: StdRng,
}

impl<L: LossFn, G: ParamGen> Rnn<L, G> {
    /// Creates a new `Rnn` without any layers.
    ///
    /// # Arguments
    /// * `rho` - The maximum amount of steps to unroll, `0` for the whole sequence.
    /// * `single` - Whether only the last step is scored.
    /// * `loss_fn` - The output layer.
    /// * `param_gen` - The rule generating the parameters once the shapes are resolved.
    pub fn new(rho: usize, single: bool, loss_fn: L, param_gen: G) -> Self {
        Self {
            rho,
            single,
            loss_fn,
            param_gen,
            network: Network::new(),
            parameters: Vec::new(),
            predictors: Array3::zeros((0, 0, 0)),
            responses: Array3::zeros((0, 0, 0)),
            resolved: false,
            deterministic: false,
            cache: StepCache::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeds the generator used to shuffle the data.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Appends a layer to the network. The shapes get resolved again on the next training.
    pub fn add<Ly: Layer + 'static>(&mut self, layer: Ly) {
        self.add_boxed(Box::new(layer));
    }

    pub fn add_boxed(&mut self, layer: Box<dyn Layer>) {
        self.network.add_boxed(layer);
        self.resolved = false;
    }

    /// Trains the network on the given sequences, the optimizer searching for the parameters
    /// through this model's `SeparableFunction` implementation.
    ///
    /// # Arguments
    /// * `predictors` - The input sequences.
    /// * `responses` - The target sequences.
    /// * `optimizer` - The driver of the parameter search.
    /// * `callbacks` - Hooks into the optimization loop.
    ///
    /// # Returns
    /// The final objective, which is not finite if training diverged, or an error if occurred.
    pub fn train<O: FunctionOptimizer>(
        &mut self,
        predictors: Array3<f32>,
        responses: Array3<f32>,
        optimizer: &mut O,
        callbacks: &mut [&mut dyn Callback],
    ) -> Result<f32> {
        if self.network.is_empty() {
            return Err(MlErr::EmptyNetwork);
        }

        validate_data(predictors.view(), responses.view(), self.single)?;
        let input_dim = predictors.len_of(Axis(0));
        self.predictors = predictors;
        self.responses = responses;

        if self.resolved && self.network.input_dim() == Some(input_dim) {
            self.reset()?;
        } else {
            self.reset_parameters(input_dim)?;
        }

        let output_dim = self.network.output_dim().ok_or(MlErr::Uninitialized)?;
        let response_dim = self.responses.len_of(Axis(0));
        if response_dim != output_dim {
            return Err(MlErr::SizeMismatch {
                what: "response features",
                got: response_dim,
                expected: output_dim,
            });
        }

        info!(
            points = self.num_functions(),
            params = self.parameters.len(),
            rho = self.rho;
            "training started"
        );

        let mut params = self.parameters.clone();
        let objective = optimizer.optimize(self, &mut params, callbacks)?;
        self.parameters = params;

        if !objective.is_finite() {
            warn!(objective = objective; "training diverged");
        }
        info!(objective = objective; "training finished");

        Ok(objective)
    }

    /// Trains the network with `Sgd::default()`.
    pub fn train_default(
        &mut self,
        predictors: Array3<f32>,
        responses: Array3<f32>,
        callbacks: &mut [&mut dyn Callback],
    ) -> Result<f32> {
        self.train(predictors, responses, &mut Sgd::default(), callbacks)
    }

    /// Runs the network over `predictors` in inference mode.
    ///
    /// # Arguments
    /// * `predictors` - The input sequences.
    /// * `batch_size` - The amount of data points forwarded at once.
    ///
    /// # Returns
    /// The network's output at every unrolled step, or only at the last one in single mode.
    pub fn predict(
        &mut self,
        predictors: ArrayView3<f32>,
        batch_size: usize,
    ) -> Result<Array3<f32>> {
        if self.network.is_empty() {
            return Err(MlErr::EmptyNetwork);
        }

        let (input_dim, output_dim) = match (
            self.resolved,
            self.network.input_dim(),
            self.network.output_dim(),
        ) {
            (true, Some(input_dim), Some(output_dim)) => (input_dim, output_dim),
            _ => return Err(MlErr::Uninitialized),
        };

        let (dim, points, seq_len) = predictors.dim();
        if dim != input_dim {
            return Err(MlErr::SizeMismatch {
                what: "predictor features",
                got: dim,
                expected: input_dim,
            });
        }

        let steps = unroll_len(self.rho, seq_len);
        let out_steps = if self.single { steps.min(1) } else { steps };
        let mut results = Array3::zeros((output_dim, points, out_steps));

        self.set_deterministic(true);

        let batch_size = batch_size.max(1);
        for begin in (0..points).step_by(batch_size) {
            let end = begin.saturating_add(batch_size).min(points);
            let chunk = predictors.slice(s![.., begin..end, ..]);
            bptt::forward(
                &mut self.network,
                &self.parameters,
                chunk,
                steps,
                &mut self.cache,
            )?;

            let first = steps - out_steps;
            for (slot, step) in (first..steps).enumerate() {
                let y = self.cache.output(step).ok_or(MlErr::Uninitialized)?;
                results.slice_mut(s![.., begin..end, slot]).assign(y);
            }

            self.cache.clear();
        }

        self.network.reset_cells();
        debug!(points = points, steps = steps; "predicted");

        Ok(results)
    }

    /// Evaluates the objective over the stored data points `[begin, begin + batch_size)` in
    /// inference mode, running the network with `params`.
    ///
    /// The model's own parameters are left untouched, only `train` replaces them.
    pub fn evaluate(&mut self, params: &[f32], begin: usize, batch_size: usize) -> Result<f32> {
        self.evaluate_with_mode(params, begin, batch_size, true)
    }

    /// Same as `evaluate`, choosing between training (`false`) and inference (`true`) mode.
    pub fn evaluate_with_mode(
        &mut self,
        params: &[f32],
        begin: usize,
        batch_size: usize,
        deterministic: bool,
    ) -> Result<f32> {
        let end = self.prepare(params, begin, batch_size, deterministic)?;

        let batch = Batch::new(&self.predictors, &self.responses, begin..end, self.single);
        let steps = unroll_len(self.rho, batch.predictors.len_of(Axis(2)));

        bptt::forward(
            &mut self.network,
            params,
            batch.predictors,
            steps,
            &mut self.cache,
        )?;
        let objective = bptt::objective(&self.loss_fn, &self.cache, &batch)?;
        self.cache.clear();

        report(objective, begin, batch_size);
        Ok(objective)
    }

    /// Evaluates the objective over the stored data points `[begin, begin + batch_size)` in
    /// training mode with `params` and writes its gradient to `grad`.
    ///
    /// The gradient is the sum of every unrolled step's contribution.
    pub fn evaluate_with_gradient(
        &mut self,
        params: &[f32],
        begin: usize,
        grad: &mut [f32],
        batch_size: usize,
    ) -> Result<f32> {
        let end = self.prepare(params, begin, batch_size, false)?;
        if grad.len() != params.len() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: params.len(),
            });
        }

        let batch = Batch::new(&self.predictors, &self.responses, begin..end, self.single);
        let steps = unroll_len(self.rho, batch.predictors.len_of(Axis(2)));

        bptt::forward(
            &mut self.network,
            params,
            batch.predictors,
            steps,
            &mut self.cache,
        )?;
        let objective = bptt::objective(&self.loss_fn, &self.cache, &batch)?;
        bptt::backward(
            &mut self.network,
            params,
            &self.loss_fn,
            &batch,
            &mut self.cache,
            grad,
        )?;

        report(objective, begin, batch_size);
        Ok(objective)
    }

    /// Writes the gradient of the objective over `[begin, begin + batch_size)` to `grad`.
    pub fn gradient(
        &mut self,
        params: &[f32],
        begin: usize,
        grad: &mut [f32],
        batch_size: usize,
    ) -> Result<()> {
        self.evaluate_with_gradient(params, begin, grad, batch_size)?;
        Ok(())
    }

    /// Applies one random permutation to the data points of both the stored predictors and
    /// responses.
    ///
    /// # Returns
    /// An error if the stored predictors and responses hold a different amount of data points,
    /// in which case neither is reordered.
    pub fn shuffle(&mut self) -> Result<()> {
        let n = self.num_functions();
        let response_points = self.responses.len_of(Axis(1));
        if response_points != n {
            return Err(MlErr::SizeMismatch {
                what: "data points",
                got: response_points,
                expected: n,
            });
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut self.rng);

        self.predictors = self.predictors.select(Axis(1), &order);
        self.responses = self.responses.select(Axis(1), &order);
        Ok(())
    }

    /// Clears the recurrent state and checks the parameter vector still fits the resolved
    /// shapes, regenerating it only if it doesn't.
    pub fn reset(&mut self) -> Result<()> {
        let input_dim = match (self.resolved, self.network.input_dim()) {
            (true, Some(input_dim)) => input_dim,
            _ => return Err(MlErr::Uninitialized),
        };

        self.network.reset_cells();
        self.cache.clear();

        let size = self.network.resolve(input_dim)?.size();
        if self.parameters.len() != size {
            self.reset_parameters(input_dim)?;
        }

        Ok(())
    }

    /// Resolves every layer's shapes for inputs of `input_dim` features and generates a new
    /// parameter vector with the initialization rule.
    pub fn reset_parameters(&mut self, input_dim: usize) -> Result<()> {
        let size = self.network.resolve(input_dim)?.size();
        let layout = self.network.layout().ok_or(MlErr::Uninitialized)?;

        let mut parameters = vec![0.0; size];
        for (layer, chunk) in layout.split_mut(&mut parameters)?.into_iter().enumerate() {
            self.param_gen
                .fill(chunk)
                .ok_or(MlErr::InitExhausted { layer })?;
        }

        debug!(input_dim = input_dim, params = size; "generated parameters");

        self.parameters = parameters;
        self.resolved = true;
        Ok(())
    }

    pub fn parameters(&self) -> &[f32] {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Vec<f32> {
        &mut self.parameters
    }

    pub fn rho(&self) -> usize {
        self.rho
    }

    pub fn rho_mut(&mut self) -> &mut usize {
        &mut self.rho
    }

    pub fn single(&self) -> bool {
        self.single
    }

    pub fn predictors(&self) -> &Array3<f32> {
        &self.predictors
    }

    pub fn predictors_mut(&mut self) -> &mut Array3<f32> {
        &mut self.predictors
    }

    pub fn responses(&self) -> &Array3<f32> {
        &self.responses
    }

    pub fn responses_mut(&mut self) -> &mut Array3<f32> {
        &mut self.responses
    }

    /// The amount of stored data points.
    pub fn num_functions(&self) -> usize {
        self.predictors.len_of(Axis(1))
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    fn set_deterministic(&mut self, deterministic: bool) {
        self.deterministic = deterministic;
        self.network.set_deterministic(deterministic);
    }

    /// Checks an objective request and switches the network to the requested mode.
    ///
    /// # Returns
    /// The end of the requested range of data points.
    fn prepare(
        &mut self,
        params: &[f32],
        begin: usize,
        batch_size: usize,
        deterministic: bool,
    ) -> Result<usize> {
        if self.network.is_empty() {
            return Err(MlErr::EmptyNetwork);
        }

        let layout = self
            .network
            .layout()
            .filter(|_| self.resolved)
            .ok_or(MlErr::Uninitialized)?;
        layout.validate("parameters", params.len())?;

        validate_data(self.predictors.view(), self.responses.view(), self.single)?;
        let available = self.num_functions();
        let end = begin
            .checked_add(batch_size)
            .filter(|&end| batch_size > 0 && end <= available)
            .ok_or(MlErr::NoData {
                begin,
                batch_size,
                available,
            })?;

        self.set_deterministic(deterministic);
        Ok(end)
    }
}

/// Checks predictors and responses pair up.
fn validate_data(
    predictors: ArrayView3<f32>,
    responses: ArrayView3<f32>,
    single: bool,
) -> Result<()> {
    let (_, points, seq_len) = predictors.dim();
    let (_, response_points, response_len) = responses.dim();

    if response_points != points {
        return Err(MlErr::SizeMismatch {
            what: "data points",
            got: response_points,
            expected: points,
        });
    }

    if !single && response_len != seq_len {
        return Err(MlErr::SizeMismatch {
            what: "sequence length",
            got: response_len,
            expected: seq_len,
        });
    }

    if seq_len == 0 || response_len == 0 {
        return Err(MlErr::NoData {
            begin: 0,
            batch_size: points,
            available: 0,
        });
    }

    Ok(())
}

fn report(objective: f32, begin: usize, batch_size: usize) {
    if objective.is_finite() {
        debug!(begin = begin, batch_size = batch_size, objective = objective; "evaluated batch");
        return;
    }

    warn!(
        begin = begin,
        batch_size = batch_size,
        objective = objective;
        "non finite objective"
    );
}
