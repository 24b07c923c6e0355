/// Hyperbolic tangent.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tanh;

impl Tanh {
    pub fn f(&self, z: f32) -> f32 {
        z.tanh()
    }

    pub fn df_from_output(&self, a: f32) -> f32 {
        1. - a * a
    }
}
