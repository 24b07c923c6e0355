use log::debug;
use ndarray::{Array2, ArrayView2};

use super::{ParameterLayout, layers::Layer};
use crate::{MlErr, Result};

/// An ordered chain of layers sharing one flat parameter vector.
///
/// Information flows forward through the layers one time step at a time and the error flows
/// back through them in reverse order. The network never owns the parameters, every call
/// receives the whole buffer and hands each layer its own slice of it.
#[derive(Default)]
pub struct Network {
    layers: Vec<Box<dyn Layer>>,
    layout: Option<ParameterLayout>,
    input_dim: Option<usize>,
    output_dim: Option<usize>,
}

impl Network {
    /// Creates a new empty `Network`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer at the end of the chain, invalidating any resolved shapes.
    pub fn add<L: Layer + 'static>(&mut self, layer: L) {
        self.add_boxed(Box::new(layer));
    }

    pub fn add_boxed(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
        self.layout = None;
        self.input_dim = None;
        self.output_dim = None;
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Resolves the shape of every layer from the feature dimension of the network's input.
    ///
    /// Resolving again with the same dimension is a no-op.
    ///
    /// # Returns
    /// The parameter layout of the network or an error if occurred.
    pub fn resolve(&mut self, input_dim: usize) -> Result<&ParameterLayout> {
        if self.layers.is_empty() {
            return Err(MlErr::EmptyNetwork);
        }

        if self.input_dim != Some(input_dim) || self.layout.is_none() {
            let mut dim = input_dim;
            let mut sizes = Vec::with_capacity(self.layers.len());

            for layer in self.layers.iter_mut() {
                dim = layer.resolve(dim)?;
                sizes.push(layer.size());
            }

            let layout = ParameterLayout::new(sizes);
            debug!(
                layers = self.layers.len(),
                input_dim = input_dim,
                output_dim = dim,
                params = layout.size();
                "resolved network shapes"
            );

            self.input_dim = Some(input_dim);
            self.output_dim = Some(dim);
            self.layout = Some(layout);
        }

        self.layout.as_ref().ok_or(MlErr::Uninitialized)
    }

    pub fn layout(&self) -> Option<&ParameterLayout> {
        self.layout.as_ref()
    }

    pub fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    pub fn output_dim(&self) -> Option<usize> {
        self.output_dim
    }

    /// Switches every layer between training and inference behaviour.
    pub fn set_deterministic(&mut self, deterministic: bool) {
        for layer in self.layers.iter_mut() {
            layer.set_deterministic(deterministic);
        }
    }

    /// Clears the state every layer carries between time steps.
    pub fn reset_cells(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.reset_cells();
        }
    }

    /// Makes a forward pass through the network for a single time step.
    ///
    /// # Arguments
    /// * `params` - The network's parameters.
    /// * `x` - The input at this step.
    ///
    /// # Returns
    /// The output of every layer, the last one being the network's output.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Vec<Array2<f32>>> {
        let layout = self.layout.as_ref().ok_or(MlErr::Uninitialized)?;
        let params = layout.split(params)?;

        let mut outputs: Vec<Array2<f32>> = Vec::with_capacity(self.layers.len());
        for (i, (layer, params)) in self.layers.iter_mut().zip(params).enumerate() {
            let input = match i {
                0 => x,
                _ => outputs[i - 1].view(),
            };

            let y = layer.forward(params, input)?;
            outputs.push(y);
        }

        Ok(outputs)
    }

    /// Propagates the error at the network's output back through every layer for one step.
    ///
    /// # Arguments
    /// * `params` - The network's parameters.
    /// * `step` - The time step being propagated.
    /// * `x` - The network's input at `step`.
    /// * `outputs` - The output of every layer at `step`.
    /// * `error` - The error at the network's output.
    ///
    /// # Returns
    /// The error arriving at the output of every layer, in layer order.
    pub fn backward(
        &mut self,
        params: &[f32],
        step: usize,
        x: ArrayView2<f32>,
        outputs: &[Array2<f32>],
        error: Array2<f32>,
    ) -> Result<Vec<Array2<f32>>> {
        let layout = self.layout.as_ref().ok_or(MlErr::Uninitialized)?;
        let params = layout.split(params)?;
        check_outputs(outputs.len(), self.layers.len())?;

        let n = self.layers.len();
        let mut deltas = vec![Array2::zeros((0, 0)); n];
        deltas[n - 1] = error;

        for i in (0..n).rev() {
            let input = match i {
                0 => x,
                _ => outputs[i - 1].view(),
            };

            let d = self.layers[i].backward(
                params[i],
                step,
                input,
                outputs[i].view(),
                deltas[i].view(),
            )?;

            if i > 0 {
                deltas[i - 1] = d;
            }
        }

        Ok(deltas)
    }

    /// Adds every layer's gradient contribution for one step into `grad`.
    ///
    /// # Arguments
    /// * `step` - The time step, already propagated through `backward`.
    /// * `x` - The network's input at `step`.
    /// * `outputs` - The output of every layer at `step`.
    /// * `deltas` - The error at the output of every layer at `step`.
    /// * `grad` - The network's gradient buffer.
    pub fn gradient(
        &mut self,
        step: usize,
        x: ArrayView2<f32>,
        outputs: &[Array2<f32>],
        deltas: &[Array2<f32>],
        grad: &mut [f32],
    ) -> Result<()> {
        let layout = self.layout.as_ref().ok_or(MlErr::Uninitialized)?;
        let grads = layout.split_mut(grad)?;
        check_outputs(outputs.len(), self.layers.len())?;
        check_outputs(deltas.len(), self.layers.len())?;

        for (i, (layer, grad)) in self.layers.iter_mut().zip(grads).enumerate() {
            let input = match i {
                0 => x,
                _ => outputs[i - 1].view(),
            };

            layer.gradient(step, input, deltas[i].view(), grad)?;
        }

        Ok(())
    }
}

fn check_outputs(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MlErr::SizeMismatch {
            what: "layer outputs",
            got,
            expected,
        });
    }

    Ok(())
}

impl Drop for Network {
    fn drop(&mut self) {
        // Layers go in reverse insertion order.
        while let Some(layer) = self.layers.pop() {
            drop(layer);
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::arch::layers::{Linear, Recurrent};

    #[test]
    fn empty_network_cannot_resolve() {
        let mut net = Network::new();
        assert!(matches!(net.resolve(2), Err(MlErr::EmptyNetwork)));
    }

    #[test]
    fn layout_is_the_sum_of_layer_sizes() {
        let mut net = Network::new();
        net.add(Recurrent::new(3));
        net.add(Linear::new(2));

        let size = net.resolve(4).unwrap().size();

        assert_eq!(size, 3 * (4 + 3 + 1) + 2 * (3 + 1));
        assert_eq!(net.output_dim(), Some(2));
    }

    #[test]
    fn adding_a_layer_invalidates_the_layout() {
        let mut net = Network::new();
        net.add(Linear::new(2));
        net.resolve(1).unwrap();
        net.add(Linear::new(1));

        assert!(net.layout().is_none());
    }

    #[test]
    fn forward_chains_layers() {
        let mut net = Network::new();
        net.add(Linear::new(1));
        net.add(Linear::new(1));
        net.resolve(1).unwrap();
        // y = 2 * (3x + 1) + 0
        let params = [3.0, 1.0, 2.0, 0.0];

        let outputs = net.forward(&params, array![[1.0]].view()).unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1], array![[8.0]]);
    }

    #[test]
    fn backward_reports_the_error_at_every_layer() {
        let mut net = Network::new();
        net.add(Linear::new(1));
        net.add(Linear::new(1));
        net.resolve(1).unwrap();
        let params = [3.0, 1.0, 2.0, 0.0];
        let x = array![[1.0]];

        let outputs = net.forward(&params, x.view()).unwrap();
        let deltas = net
            .backward(&params, 0, x.view(), &outputs, array![[1.0]])
            .unwrap();
        let mut grad = vec![0.0; 4];
        net.gradient(0, x.view(), &outputs, &deltas, &mut grad)
            .unwrap();

        assert_eq!(deltas[0], array![[2.0]]);
        assert_eq!(deltas[1], array![[1.0]]);
        assert_eq!(grad, vec![2.0, 2.0, 4.0, 1.0]);
    }
}
