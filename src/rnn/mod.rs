mod bptt;
mod cache;
mod model;
mod objective;

pub use cache::StepCache;
pub use model::{DEFAULT_BATCH_SIZE, Rnn};
