/// `amp / (1 + e^-z)`.
#[derive(Clone, Debug)]
pub struct Sigmoid {
    amp: f32,
}

impl Sigmoid {
    pub fn new(amp: f32) -> Self {
        Self { amp }
    }

    pub fn f(&self, z: f32) -> f32 {
        self.amp / (1. + (-z).exp())
    }

    pub fn df_from_output(&self, a: f32) -> f32 {
        a * (self.amp - a) / self.amp
    }
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self::new(1.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_from_output_matches_finite_difference() {
        let sigmoid = Sigmoid::new(2.);
        let h = 1e-3;

        for z in [-2., -0.5, 0., 0.7, 3.] {
            let numeric = (sigmoid.f(z + h) - sigmoid.f(z - h)) / (2. * h);
            let analytic = sigmoid.df_from_output(sigmoid.f(z));
            assert!((numeric - analytic).abs() < 1e-3, "z = {z}");
        }
    }
}
