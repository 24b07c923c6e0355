mod activation;
mod dropout;
mod layer;
mod linear;
mod recurrent;

pub use activation::Activation;
pub use dropout::Dropout;
pub use layer::Layer;
pub use linear::Linear;
pub use recurrent::Recurrent;
