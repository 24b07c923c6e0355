use ndarray::Array2;

/// The output of every layer at every time step of the current unroll.
///
/// Filled in ascending step order by the forward pass and drained in descending order by the
/// backward pass, so nothing outlives the batch it was computed for.
#[derive(Debug, Default, Clone)]
pub struct StepCache {
    steps: Vec<Vec<Array2<f32>>>,
}

impl StepCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the layer outputs of the next step.
    pub fn push(&mut self, outputs: Vec<Array2<f32>>) {
        self.steps.push(outputs);
    }

    /// Removes the layer outputs of the latest step still cached.
    pub fn pop(&mut self) -> Option<Vec<Array2<f32>>> {
        self.steps.pop()
    }

    /// The amount of cached steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The output of every layer at `step`.
    pub fn outputs(&self, step: usize) -> Option<&[Array2<f32>]> {
        self.steps.get(step).map(Vec::as_slice)
    }

    /// The network's output at `step`, that is, the output of its last layer.
    pub fn output(&self, step: usize) -> Option<&Array2<f32>> {
        self.steps.get(step).and_then(|outputs| outputs.last())
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}
