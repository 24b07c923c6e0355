use super::ParamGen;

/// An initialization rule that delegates to a chain of rules.
///
/// Each rule in the chain is used until it's exhausted, so giving each one a limit equal
/// to a layer's parameter count yields a different rule per layer.
pub struct ChainedParamGen {
    param_gens: Vec<Box<dyn ParamGen>>,
    curr: usize,
}

impl ChainedParamGen {
    /// Creates a new `ChainedParamGen`.
    ///
    /// # Arguments
    /// * `param_gens` - The rules, in the order the layers were added.
    pub fn new(param_gens: Vec<Box<dyn ParamGen>>) -> Self {
        Self {
            param_gens,
            curr: 0,
        }
    }
}

impl ParamGen for ChainedParamGen {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        while self.curr < self.param_gens.len() {
            match self.param_gens[self.curr].sample(n) {
                Some(sample) if sample.len() == n => return Some(sample),
                Some(mut sample) => {
                    self.curr += 1;

                    if let Some(rest) = self.sample(n - sample.len()) {
                        sample.extend(rest);
                    }

                    return Some(sample);
                }
                None => self.curr += 1,
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::{super::ConstParamGen, *};

    #[test]
    fn empty_chain_is_exhausted() {
        let mut param_gen = ChainedParamGen::new(vec![]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn one_rule_per_layer() {
        let param_gens: Vec<Box<dyn ParamGen>> = vec![
            Box::new(ConstParamGen::new(0., 6)),
            Box::new(ConstParamGen::new(1., 3)),
        ];
        let mut param_gen = ChainedParamGen::new(param_gens);

        let mut layer0 = [9.; 6];
        let mut layer1 = [9.; 3];
        param_gen.fill(&mut layer0).unwrap();
        param_gen.fill(&mut layer1).unwrap();

        assert_eq!(layer0, [0.; 6]);
        assert_eq!(layer1, [1.; 3]);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn samples_straddle_rules() {
        let param_gens: Vec<Box<dyn ParamGen>> = vec![
            Box::new(ConstParamGen::new(0., 1)),
            Box::new(ConstParamGen::new(1., 3)),
        ];
        let mut param_gen = ChainedParamGen::new(param_gens);

        assert_eq!(param_gen.sample(2).unwrap(), [0., 1.]);
        assert_eq!(param_gen.sample(2).unwrap(), [1., 1.]);
        assert!(param_gen.sample(1).is_none());
    }
}
