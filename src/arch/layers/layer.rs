use ndarray::{Array2, ArrayView2};

use crate::Result;

/// A stage of the network.
///
/// Every tensor a layer sees is a single time step of a batch, shaped `(features, points)`.
/// Parameters are never owned by the layer: each call receives the layer's own slice of the
/// network's flat parameter vector (or gradient vector), laid out as the layer decides.
///
/// Layers carrying recurrent state keep it themselves across consecutive `forward` calls of
/// one unroll, and are told the time step on the backward side so they can pair each call
/// with what they recorded going forward.
pub trait Layer {
    /// A short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Resolves the layer's shapes given the feature dimension of its input.
    ///
    /// # Arguments
    /// * `input_dim` - The amount of features of this layer's input.
    ///
    /// # Returns
    /// The amount of features of this layer's output.
    fn resolve(&mut self, input_dim: usize) -> Result<usize>;

    /// Returns the amount of parameters this layer has, only meaningful after `resolve`.
    fn size(&self) -> usize;

    /// Computes the layer's output for the next time step.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `x` - The input at this step.
    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Propagates the error at this layer's output back to its input.
    ///
    /// Steps arrive in descending order, starting at the last step of the unroll.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `step` - The time step being propagated.
    /// * `x` - The input this layer received at `step`.
    /// * `y` - The output this layer produced at `step`.
    /// * `d` - The error arriving at this layer's output at `step`.
    ///
    /// # Returns
    /// The error at this layer's input.
    fn backward(
        &mut self,
        params: &[f32],
        step: usize,
        x: ArrayView2<f32>,
        y: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<Array2<f32>>;

    /// Adds this step's contribution to the layer's parameter gradient.
    ///
    /// Implementations must add to `grad` rather than overwrite it, the contributions of
    /// every step of the unroll get summed.
    ///
    /// # Arguments
    /// * `step` - The time step, already propagated through `backward`.
    /// * `x` - The input this layer received at `step`.
    /// * `d` - The error that arrived at this layer's output at `step`.
    /// * `grad` - This layer's slice of the gradient vector.
    fn gradient(
        &mut self,
        step: usize,
        x: ArrayView2<f32>,
        d: ArrayView2<f32>,
        grad: &mut [f32],
    ) -> Result<()>;

    /// Switches between training (`false`) and inference (`true`) behaviour.
    fn set_deterministic(&mut self, _deterministic: bool) {}

    /// Forgets any state carried between time steps so a new unroll starts clean.
    fn reset_cells(&mut self) {}
}
