use super::{ParamGen, param_gen::draw};

/// Starts every parameter at `value`, for at most `limit` of them.
pub struct ConstParamGen {
    value: f32,
    budget: usize,
}

impl ConstParamGen {
    pub fn new(value: f32, limit: usize) -> Self {
        Self {
            value,
            budget: limit,
        }
    }

    /// A `ConstParamGen` that never runs out, for whole networks.
    pub fn unbounded(value: f32) -> Self {
        Self::new(value, usize::MAX)
    }
}

impl ParamGen for ConstParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        draw(&mut self.budget, n).map(|n| vec![self.value; n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_yields_nothing() {
        assert!(ConstParamGen::new(1., 0).sample(1).is_none());
    }

    #[test]
    fn a_layer_larger_than_the_limit_gets_the_rest() {
        let mut param_gen = ConstParamGen::new(0.5, 10);

        assert_eq!(param_gen.sample(7).unwrap(), vec![0.5; 7]);
        assert_eq!(param_gen.sample(7).unwrap(), vec![0.5; 3]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn unbounded_fills_any_network() {
        let mut param_gen = ConstParamGen::unbounded(-1.);
        let mut layer = [0.; 4_096];

        for _ in 0..4 {
            param_gen.fill(&mut layer).unwrap();
        }
        assert!(layer.iter().all(|&p| p == -1.));
    }
}
