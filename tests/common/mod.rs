#![allow(dead_code)]

use ndarray::Array3;
use recurrent_network::{
    Rnn,
    arch::{
        layers::{Linear, Recurrent},
        loss::Mse,
    },
    config::generate_rng,
    initialization::{ConstParamGen, ParamGen, RandParamGen},
};

pub type TestRnn = Rnn<Mse, Box<dyn ParamGen>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic data without any structure, shaped `(dim, points, time)`.
pub fn tensor(dim: usize, points: usize, time: usize, salt: usize) -> Array3<f32> {
    Array3::from_shape_fn((dim, points, time), |(d, p, t)| {
        ((d * 7 + p * 3 + t * 5 + salt * 11) % 13) as f32 / 6.5 - 1.0
    })
}

pub fn uniform(seed: u64) -> Box<dyn ParamGen> {
    let rng = generate_rng(Some(seed));
    let param_gen = RandParamGen::uniform(rng, usize::MAX, -0.5, 0.5).unwrap();
    Box::new(param_gen)
}

pub fn zeros() -> Box<dyn ParamGen> {
    Box::new(ConstParamGen::unbounded(0.0))
}

/// A `Recurrent(hidden) -> Linear(out_dim)` network.
pub fn elman(
    rho: usize,
    single: bool,
    hidden: usize,
    out_dim: usize,
    param_gen: Box<dyn ParamGen>,
) -> TestRnn {
    let mut rnn = Rnn::new(rho, single, Mse, param_gen).with_seed(7);
    rnn.add(Recurrent::new(hidden));
    rnn.add(Linear::new(out_dim));
    rnn
}

/// Stores the data and generates the parameters without training.
pub fn load(rnn: &mut TestRnn, predictors: Array3<f32>, responses: Array3<f32>) {
    let input_dim = predictors.dim().0;
    *rnn.predictors_mut() = predictors;
    *rnn.responses_mut() = responses;
    rnn.reset_parameters(input_dim).unwrap();
}

/// Compares the gradient of the objective over every stored point against central finite
/// differences.
pub fn assert_gradient_matches(rnn: &mut TestRnn) {
    let params = rnn.parameters().to_vec();
    let n = rnn.num_functions();

    let mut grad = vec![0.0; params.len()];
    rnn.evaluate_with_gradient(&params, 0, &mut grad, n).unwrap();

    let h = 1e-2;
    for i in 0..params.len() {
        let mut p = params.clone();
        p[i] += h;
        let plus = rnn.evaluate(&p, 0, n).unwrap();
        p[i] -= 2.0 * h;
        let minus = rnn.evaluate(&p, 0, n).unwrap();

        let numeric = (plus - minus) / (2.0 * h);
        let tol = 1e-3 + 2e-2 * grad[i].abs();
        assert!(
            (numeric - grad[i]).abs() <= tol,
            "parameter {i}: analytic {} numeric {numeric}",
            grad[i]
        );
    }
}
