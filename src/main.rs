use std::{env, fs};

use anyhow::Context;
use log::info;
use ndarray::{Array3, Axis, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Deserialize;

use recurrent_network::{
    arch::{
        layers::{Linear, Recurrent},
        loss::{LossFn, Mse},
    },
    config::{RnnSpec, SgdSpec},
    optimization::{Callback, EarlyStopAtMinLoss, PrintLoss},
};

const DEFAULT_SPEC: &str = r#"{
    "points": 128,
    "seq_len": 8,
    "hidden": 8,
    "rnn": {
        "rho": 8,
        "seed": 42,
        "param_gen": {
            "rand": { "distribution": { "uniform": { "low": -0.3, "high": 0.3 } } }
        }
    },
    "sgd": {
        "optimizer": { "adam": { "learning_rate": 0.01, "beta1": 0.9, "beta2": 0.999, "epsilon": 1e-8 } },
        "batch_size": 16,
        "max_epochs": 200
    }
}"#;

/// A delayed echo task: the target at every step is the input of the step before.
#[derive(Debug, Deserialize)]
struct DemoSpec {
    points: usize,
    seq_len: usize,
    hidden: usize,
    rnn: RnnSpec,
    sgd: SgdSpec,
}

fn echo_task(points: usize, seq_len: usize, seed: u64) -> (Array3<f32>, Array3<f32>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let predictors = Array3::from_shape_fn((1, points, seq_len), |_| {
        rng.random_range(-1.0f32..1.0)
    });

    let mut responses = Array3::zeros((1, points, seq_len));
    if seq_len > 1 {
        responses
            .slice_mut(s![.., .., 1..])
            .assign(&predictors.slice(s![.., .., ..seq_len - 1]));
    }

    (predictors, responses)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let spec = match env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<DemoSpec>(&raw).with_context(|| format!("parsing {path}"))?
        }
        None => serde_json::from_str::<DemoSpec>(DEFAULT_SPEC)?,
    };

    let seed = spec.rnn.seed.unwrap_or_default();
    let (predictors, responses) = echo_task(spec.points, spec.seq_len, seed);
    let (test_x, test_y) = echo_task(spec.points / 4 + 1, spec.seq_len, seed.wrapping_add(1));

    let mut rnn = spec.rnn.build(Mse)?;
    rnn.add(Recurrent::new(spec.hidden));
    rnn.add(Linear::new(1));

    let mut sgd = spec.sgd.build();
    let mut print = PrintLoss;
    let mut early_stop = EarlyStopAtMinLoss::new(10);
    let callbacks: &mut [&mut dyn Callback] = &mut [&mut print, &mut early_stop];
    let objective = rnn.train(predictors, responses, &mut sgd, callbacks)?;
    info!("final training objective {objective}");

    let y_pred = rnn.predict(test_x.view(), spec.rnn.predict_batch_size)?;
    let steps = y_pred.len_of(Axis(2));
    let loss = (0..steps)
        .map(|t| {
            Mse.loss(
                y_pred.index_axis(Axis(2), t),
                test_y.index_axis(Axis(2), t),
            )
        })
        .sum::<f32>()
        / steps.max(1) as f32;
    info!("held out mean step loss {loss}");

    Ok(())
}
