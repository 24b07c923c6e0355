use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;

use crate::initialization::RandErr;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum MlErr {
    /// Two buffers or tensors that should agree on a length don't.
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// The network holds no layers.
    EmptyNetwork,
    /// The layer shapes and the parameter vector were never resolved.
    Uninitialized,
    /// There's no stored data to evaluate the objective on.
    NoData {
        begin: usize,
        batch_size: usize,
        available: usize,
    },
    /// The initialization rule couldn't provide enough parameters.
    InitExhausted { layer: usize },
    /// A layer was asked for the gradient of a step it never propagated backward.
    MissingStep { layer: &'static str, step: usize },
    /// A parameter slice couldn't be viewed with the layer's shape.
    Shape(ShapeError),
    /// A random parameter generator was given invalid distribution values.
    Rand(RandErr),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch for {what}, got {got} and expected {expected}"
            ),
            MlErr::EmptyNetwork => write!(f, "The network doesn't have any layers"),
            MlErr::Uninitialized => write!(
                f,
                "The network's shapes and parameters haven't been resolved yet"
            ),
            MlErr::NoData {
                begin,
                batch_size,
                available,
            } => write!(
                f,
                "Requested points [{begin}, {}) but only {available} are stored",
                begin + batch_size
            ),
            MlErr::InitExhausted { layer } => write!(
                f,
                "The initialization rule ran out of parameters at layer {layer}"
            ),
            MlErr::MissingStep { layer, step } => write!(
                f,
                "The {layer} layer has no backward state for step {step}"
            ),
            MlErr::Shape(e) => write!(f, "shape error: {e}"),
            MlErr::Rand(e) => write!(f, "invalid distribution: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            MlErr::Rand(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<RandErr> for MlErr {
    fn from(value: RandErr) -> Self {
        Self::Rand(value)
    }
}
