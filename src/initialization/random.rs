use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::{ParamGen, Result, param_gen::draw};

/// Samples every parameter from `distribution`, for at most `limit` of them.
///
/// The rng is shared so a `ChainedParamGen` built from one seed stays reproducible across the
/// rules of every layer.
pub struct RandParamGen<R: Rng, D: Distribution<f32>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
    budget: usize,
}

impl<R: Rng, D: Distribution<f32>> RandParamGen<R, D> {
    pub fn new(rng: Rc<RefCell<R>>, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            budget: limit,
        }
    }
}

impl<R: Rng> RandParamGen<R, Uniform<f32>> {
    /// `U[low, high)`, failing on an empty or unbounded range.
    pub fn uniform(rng: Rc<RefCell<R>>, limit: usize, low: f32, high: f32) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new(low, high)?, limit))
    }

    /// Glorot uniform, `U[-r, r)` with `r = sqrt(6 / (fan_in + fan_out))`.
    pub fn xavier_uniform(
        rng: Rc<RefCell<R>>,
        limit: usize,
        fan_in: usize,
        fan_out: usize,
    ) -> Result<Self> {
        let r = (6. / (fan_in + fan_out) as f32).sqrt();
        Self::uniform(rng, limit, -r, r)
    }
}

impl<R: Rng> RandParamGen<R, Normal<f32>> {
    /// `N(mean, std_dev²)`, failing if `std_dev` isn't finite.
    pub fn normal(rng: Rc<RefCell<R>>, limit: usize, mean: f32, std_dev: f32) -> Result<Self> {
        Ok(Self::new(rng, Normal::new(mean, std_dev)?, limit))
    }

    /// He normal, `N(0, 2 / fan_in)`.
    pub fn kaiming(rng: Rc<RefCell<R>>, limit: usize, fan_in: usize) -> Result<Self> {
        Self::normal(rng, limit, 0., (2. / fan_in as f32).sqrt())
    }
}

impl<R: Rng, D: Distribution<f32>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        let n = draw(&mut self.budget, n)?;
        let mut rng = self.rng.borrow_mut();

        Some((&self.distribution).sample_iter(&mut *rng).take(n).collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn seeded_rng(seed: u64) -> Rc<RefCell<StdRng>> {
        Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn uniform_samples_stay_in_range() {
        let mut param_gen = RandParamGen::uniform(seeded_rng(42), 100, -0.5, 0.5).unwrap();
        let sample = param_gen.sample(100).unwrap();

        assert_eq!(sample.len(), 100);
        assert!(sample.iter().all(|x| (-0.5..0.5).contains(x)));
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn same_seed_same_parameters() {
        let mut a = RandParamGen::xavier_uniform(seeded_rng(7), 16, 4, 4).unwrap();
        let mut b = RandParamGen::xavier_uniform(seeded_rng(7), 16, 4, 4).unwrap();

        assert_eq!(a.sample(16), b.sample(16));
    }

    #[test]
    fn kaiming_is_centered() {
        let mut param_gen = RandParamGen::kaiming(seeded_rng(3), usize::MAX, 8).unwrap();
        let sample = param_gen.sample(4_000).unwrap();
        let mean = sample.iter().sum::<f32>() / sample.len() as f32;

        assert!(mean.abs() < 0.05);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(RandParamGen::uniform(seeded_rng(0), 1, 1., -1.).is_err());
        assert!(RandParamGen::normal(seeded_rng(0), 1, 0., f32::NAN).is_err());
    }
}
