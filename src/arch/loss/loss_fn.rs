use ndarray::{Array2, ArrayView2};

/// The output stage of the network: compares one time step of predictions against its
/// targets, both shaped `(features, points)`.
pub trait LossFn {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;

    /// The derivative of `loss` with respect to `y_pred`.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}
