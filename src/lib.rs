//! A recurrent network trained with truncated backpropagation through time.
//!
//! Layers are stacked in an [`Rnn`], which owns the flat parameter vector and unrolls the
//! network over sequence batches shaped `(features, points, time)`. Training goes through any
//! [`FunctionOptimizer`], which sees the model as a [`SeparableFunction`] over its data points.

pub mod arch;
pub mod config;
pub mod initialization;
pub mod optimization;
pub mod rnn;

mod error;

pub use error::{MlErr, Result};
pub use optimization::{FunctionOptimizer, SeparableFunction};
pub use rnn::Rnn;
