use log::info;

/// Hooks into the optimization loop.
pub trait Callback {
    fn begin_optimization(&mut self) {}

    /// Called after every epoch with its summed objective.
    ///
    /// # Returns
    /// Whether the optimization should stop.
    fn end_epoch(&mut self, _epoch: usize, _objective: f32) -> bool {
        false
    }

    fn end_optimization(&mut self, _objective: f32) {}
}

/// Logs the objective after every epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintLoss;

impl Callback for PrintLoss {
    fn end_epoch(&mut self, epoch: usize, objective: f32) -> bool {
        info!(epoch = epoch, objective = objective; "epoch finished");
        false
    }
}

/// Stops once the objective hasn't improved on its best value for `patience` epochs.
#[derive(Debug, Clone)]
pub struct EarlyStopAtMinLoss {
    patience: usize,
    best: f32,
    waited: usize,
}

impl EarlyStopAtMinLoss {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best: f32::INFINITY,
            waited: 0,
        }
    }

    /// The lowest objective seen so far.
    pub fn best(&self) -> f32 {
        self.best
    }
}

impl Callback for EarlyStopAtMinLoss {
    fn begin_optimization(&mut self) {
        self.best = f32::INFINITY;
        self.waited = 0;
    }

    fn end_epoch(&mut self, epoch: usize, objective: f32) -> bool {
        if objective < self.best {
            self.best = objective;
            self.waited = 0;
            return false;
        }

        self.waited += 1;
        if self.waited >= self.patience {
            info!(epoch = epoch, best = self.best; "objective stopped improving");
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_stop_waits_for_patience() {
        let mut cb = EarlyStopAtMinLoss::new(2);
        cb.begin_optimization();

        assert!(!cb.end_epoch(0, 3.0));
        assert!(!cb.end_epoch(1, 2.0));
        assert!(!cb.end_epoch(2, 2.5));
        assert!(cb.end_epoch(3, 2.1));
        assert_eq!(cb.best(), 2.0);
    }
}
