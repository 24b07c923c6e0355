pub mod activations;
pub mod layers;
pub mod loss;

mod layout;
mod network;

pub use layout::ParameterLayout;
pub use network::Network;
