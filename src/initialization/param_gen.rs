/// The initialization rule of a network: generates the values of the parameter
/// vector the first time the network's shapes are resolved.
///
/// It gets asked once per layer, in construction order, for exactly that layer's
/// parameter count.
pub trait ParamGen {
    /// Should sample at most `n` parameters.
    ///
    /// # Arguments
    /// * `n` - The upper limit of samples to generate.
    ///
    /// # Returns
    /// `None` if the generator is exhausted.
    fn sample(&mut self, n: usize) -> Option<Vec<f32>>;

    /// Fills `buf` entirely, sampling as many times as needed.
    ///
    /// # Arguments
    /// * `buf` - The slice of the parameter vector owned by a single layer.
    ///
    /// # Returns
    /// `None` if the generator got exhausted before `buf` was full.
    fn fill(&mut self, buf: &mut [f32]) -> Option<()> {
        let mut filled = 0;

        while filled < buf.len() {
            let sample = self.sample(buf.len() - filled)?;
            if sample.is_empty() {
                return None;
            }

            buf[filled..filled + sample.len()].copy_from_slice(&sample);
            filled += sample.len();
        }

        Some(())
    }
}

/// Takes up to `n` values out of a generator's `budget`.
///
/// # Returns
/// How many values may be generated, or `None` once the budget is spent.
pub(super) fn draw(budget: &mut usize, n: usize) -> Option<usize> {
    if *budget == 0 {
        return None;
    }

    let n = n.min(*budget);
    *budget -= n;
    Some(n)
}

impl<T: ParamGen + ?Sized> ParamGen for Box<T> {
    fn sample(&mut self, n: usize) -> Option<Vec<f32>> {
        (**self).sample(n)
    }
}
