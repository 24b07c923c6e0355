use crate::Result;

/// An objective that decomposes into one term per data point and can be evaluated over any
/// contiguous range of them.
///
/// Data points are addressed by position, `[begin, begin + batch_size)`, after whatever
/// order the last `shuffle` left them in.
pub trait SeparableFunction {
    /// The amount of separable terms, that is, of stored data points.
    fn num_functions(&self) -> usize;

    /// Reorders the data points.
    ///
    /// # Returns
    /// An error if the data can't be reordered, leaving it as it was.
    fn shuffle(&mut self) -> Result<()>;

    /// Evaluates the objective over a range of data points.
    fn evaluate(&mut self, params: &[f32], begin: usize, batch_size: usize) -> Result<f32>;

    /// Evaluates the objective over a range of data points and writes its gradient to `grad`.
    fn evaluate_with_gradient(
        &mut self,
        params: &[f32],
        begin: usize,
        grad: &mut [f32],
        batch_size: usize,
    ) -> Result<f32>;

    /// Writes the gradient of the objective over a range of data points to `grad`.
    fn gradient(
        &mut self,
        params: &[f32],
        begin: usize,
        grad: &mut [f32],
        batch_size: usize,
    ) -> Result<()> {
        self.evaluate_with_gradient(params, begin, grad, batch_size)?;
        Ok(())
    }
}
