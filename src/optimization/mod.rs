mod adam;
mod callback;
mod gradient_descent;
mod gradient_descent_with_momentum;
mod optimizer;
mod separable;
mod sgd;

pub use adam::Adam;
pub use callback::{Callback, EarlyStopAtMinLoss, PrintLoss};
pub use gradient_descent::GradientDescent;
pub use gradient_descent_with_momentum::GradientDescentWithMomentum;
pub use optimizer::Optimizer;
pub use separable::SeparableFunction;
pub use sgd::{FunctionOptimizer, Sgd};
