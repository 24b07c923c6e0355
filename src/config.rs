//! Serializable specifications of a model and its training, resolved into concrete values.

use std::{cell::RefCell, num::NonZeroUsize, rc::Rc};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    arch::loss::LossFn,
    initialization::{ChainedParamGen, ConstParamGen, ParamGen, RandParamGen},
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer, Sgd},
    rnn::{DEFAULT_BATCH_SIZE, Rnn},
};

/// The specification for the distribution of a `RandParamGen`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSpec {
    Uniform { low: f32, high: f32 },
    XavierUniform { fan_in: usize, fan_out: usize },
    Normal { mean: f32, std_dev: f32 },
    Kaiming { fan_in: usize },
}

/// The specification for the `ParamGen` trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamGenSpec {
    Const {
        value: f32,
        #[serde(default = "unlimited")]
        limit: usize,
    },
    Rand {
        distribution: DistributionSpec,
        #[serde(default = "unlimited")]
        limit: usize,
    },
    Chained {
        specs: Vec<ParamGenSpec>,
    },
}

/// The specification for the `Optimizer` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        learning_rate: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
    GradientDescentWithMomentum {
        learning_rate: f32,
        momentum: f32,
    },
}

/// The specification for an `Rnn`, its layers aside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RnnSpec {
    pub rho: usize,
    #[serde(default)]
    pub single: bool,
    #[serde(default = "default_predict_batch_size")]
    pub predict_batch_size: usize,
    pub seed: Option<u64>,
    pub param_gen: ParamGenSpec,
}

/// The specification for the `Sgd` driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgdSpec {
    pub optimizer: OptimizerSpec,
    pub batch_size: NonZeroUsize,
    pub max_epochs: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

fn unlimited() -> usize {
    usize::MAX
}

fn default_predict_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_tolerance() -> f32 {
    1e-5
}

fn default_shuffle() -> bool {
    true
}

/// Generates a random number generator given (or not) a seed.
///
/// # Returns
/// A clonable random number generator with interior mutability.
pub fn generate_rng(seed: Option<u64>) -> Rc<RefCell<StdRng>> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Rc::new(RefCell::new(rng))
}

impl DistributionSpec {
    /// Builds a generator sampling from this distribution.
    ///
    /// # Returns
    /// The generator or an error if the distribution's values are invalid.
    pub fn build(self, rng: Rc<RefCell<StdRng>>, limit: usize) -> Result<Box<dyn ParamGen>> {
        let param_gen: Box<dyn ParamGen> = match self {
            Self::Uniform { low, high } => {
                Box::new(RandParamGen::uniform(rng, limit, low, high)?)
            }
            Self::XavierUniform { fan_in, fan_out } => {
                Box::new(RandParamGen::xavier_uniform(rng, limit, fan_in, fan_out)?)
            }
            Self::Normal { mean, std_dev } => {
                Box::new(RandParamGen::normal(rng, limit, mean, std_dev)?)
            }
            Self::Kaiming { fan_in } => Box::new(RandParamGen::kaiming(rng, limit, fan_in)?),
        };

        Ok(param_gen)
    }
}

impl ParamGenSpec {
    /// Builds the initialization rule, every random rule sharing `rng`.
    pub fn build(&self, rng: &Rc<RefCell<StdRng>>) -> Result<Box<dyn ParamGen>> {
        let param_gen: Box<dyn ParamGen> = match self {
            Self::Const { value, limit } => Box::new(ConstParamGen::new(*value, *limit)),
            Self::Rand {
                distribution,
                limit,
            } => distribution.build(rng.clone(), *limit)?,
            Self::Chained { specs } => {
                let param_gens = specs
                    .iter()
                    .map(|spec| spec.build(rng))
                    .collect::<Result<Vec<_>>>()?;

                Box::new(ChainedParamGen::new(param_gens))
            }
        };

        Ok(param_gen)
    }
}

impl OptimizerSpec {
    pub fn build(self) -> Box<dyn Optimizer> {
        match self {
            Self::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(learning_rate, beta1, beta2, epsilon)),
            Self::GradientDescent { learning_rate } => {
                Box::new(GradientDescent::new(learning_rate))
            }
            Self::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => Box::new(GradientDescentWithMomentum::new(learning_rate, momentum)),
        }
    }
}

impl SgdSpec {
    pub fn build(&self) -> Sgd<Box<dyn Optimizer>> {
        Sgd::new(
            self.optimizer.build(),
            self.batch_size,
            self.max_epochs,
            self.tolerance,
            self.shuffle,
        )
    }
}

impl RnnSpec {
    /// Builds an `Rnn` without layers following this spec.
    ///
    /// # Arguments
    /// * `loss_fn` - The output layer.
    ///
    /// # Returns
    /// The model or an error if the initialization rule is invalid.
    pub fn build<L: LossFn>(&self, loss_fn: L) -> Result<Rnn<L, Box<dyn ParamGen>>> {
        let rng = generate_rng(self.seed);
        let param_gen = self.param_gen.build(&rng)?;
        let rnn = Rnn::new(self.rho, self.single, loss_fn, param_gen);

        Ok(match self.seed {
            Some(seed) => rnn.with_seed(seed),
            None => rnn,
        })
    }
}
