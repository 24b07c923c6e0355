use super::{Sigmoid, Tanh};

/// An element-wise activation function.
#[derive(Clone, Debug)]
pub enum ActFn {
    Sigmoid(Sigmoid),
    Tanh(Tanh),
}

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn tanh() -> Self {
        Self::Tanh(Tanh)
    }

    pub fn f(&self, z: f32) -> f32 {
        match self {
            Self::Sigmoid(a) => a.f(z),
            Self::Tanh(a) => a.f(z),
        }
    }

    /// The derivative expressed in terms of the activation's own output, which is what
    /// the per-step cache holds.
    pub fn df_from_output(&self, a: f32) -> f32 {
        match self {
            Self::Sigmoid(s) => s.df_from_output(a),
            Self::Tanh(t) => t.df_from_output(a),
        }
    }
}
