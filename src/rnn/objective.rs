use super::Rnn;
use crate::{
    Result, arch::loss::LossFn, initialization::ParamGen, optimization::SeparableFunction,
};

impl<L: LossFn, G: ParamGen> SeparableFunction for Rnn<L, G> {
    fn num_functions(&self) -> usize {
        Rnn::num_functions(self)
    }

    fn shuffle(&mut self) -> Result<()> {
        Rnn::shuffle(self)
    }

    fn evaluate(&mut self, params: &[f32], begin: usize, batch_size: usize) -> Result<f32> {
        Rnn::evaluate(self, params, begin, batch_size)
    }

    fn evaluate_with_gradient(
        &mut self,
        params: &[f32],
        begin: usize,
        grad: &mut [f32],
        batch_size: usize,
    ) -> Result<f32> {
        Rnn::evaluate_with_gradient(self, params, begin, grad, batch_size)
    }

    fn gradient(
        &mut self,
        params: &[f32],
        begin: usize,
        grad: &mut [f32],
        batch_size: usize,
    ) -> Result<()> {
        Rnn::gradient(self, params, begin, grad, batch_size)
    }
}
