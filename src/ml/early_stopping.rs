// ============================================================
// Layer 5 — Early Stopping
// ============================================================
// Watches the validation loss after every epoch. The wait
// counter is compared with `patience` before it is incremented,
// so training stops on the (patience + 1)-th consecutive epoch
// that fails to beat the best loss by more than `min_delta`.
//
//   epoch:     1    2    3    4    5    6    7    8
//   val_loss: .90  .85  .86  .87  .85  .88  .89  .90   (patience 5)
//   wait:      0    0    1    2    3    4    5    5  → stop at 8

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience:   usize,
    min_delta:  f64,
    best_loss:  f64,
    best_epoch: usize,
    wait:       usize,
}

/// Result of feeding one epoch's validation loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// New best loss
    Improved,
    /// No improvement yet, keep training
    Continue,
    /// Patience exhausted
    Stop,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self::with_min_delta(patience, 0.0)
    }

    pub fn with_min_delta(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            best_loss:  f64::INFINITY,
            best_epoch: 0,
            wait:       0,
        }
    }

    /// Record the validation loss of `epoch`.
    /// A NaN loss never counts as an improvement.
    pub fn update(&mut self, epoch: usize, val_loss: f64) -> StopDecision {
        if val_loss < self.best_loss - self.min_delta {
            self.best_loss  = val_loss;
            self.best_epoch = epoch;
            self.wait       = 0;
            return StopDecision::Improved;
        }
        if self.wait >= self.patience {
            return StopDecision::Stop;
        }
        self.wait += 1;
        StopDecision::Continue
    }

    pub fn best_loss(&self) -> f64 { self.best_loss }

    /// 0 until the first improvement.
    pub fn best_epoch(&self) -> usize { self.best_epoch }

    pub fn epochs_without_improvement(&self) -> usize { self.wait }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_on_epoch_after_patience_runs_out() {
        let mut es = EarlyStopping::new(5);
        let losses = [0.90, 0.85, 0.86, 0.87, 0.85, 0.88, 0.89, 0.90];
        let decisions: Vec<StopDecision> = losses
            .iter()
            .enumerate()
            .map(|(i, &l)| es.update(i + 1, l))
            .collect();

        assert_eq!(decisions[0], StopDecision::Improved);
        assert_eq!(decisions[1], StopDecision::Improved);
        // equal loss is not an improvement
        assert_eq!(decisions[4], StopDecision::Continue);
        assert_eq!(decisions[6], StopDecision::Continue);
        assert_eq!(es.epochs_without_improvement(), 5);
        assert_eq!(decisions[7], StopDecision::Stop);
        assert_eq!(es.best_epoch(), 2);
        assert_eq!(es.best_loss(), 0.85);
    }

    #[test]
    fn test_improvement_resets_wait() {
        let mut es = EarlyStopping::new(2);
        es.update(1, 1.0);
        assert_eq!(es.update(2, 1.1), StopDecision::Continue);
        assert_eq!(es.update(3, 0.5), StopDecision::Improved);
        assert_eq!(es.epochs_without_improvement(), 0);
        assert_eq!(es.update(4, 0.6), StopDecision::Continue);
        assert_eq!(es.update(5, 0.7), StopDecision::Continue);
        assert_eq!(es.update(6, 0.8), StopDecision::Stop);
    }

    #[test]
    fn test_nan_is_not_an_improvement() {
        let mut es = EarlyStopping::new(1);
        assert_eq!(es.update(1, f64::NAN), StopDecision::Continue);
        assert_eq!(es.update(2, f64::NAN), StopDecision::Stop);
        assert_eq!(es.best_epoch(), 0);
    }

    #[test]
    fn test_zero_patience_stops_on_first_miss() {
        let mut es = EarlyStopping::new(0);
        assert_eq!(es.update(1, 1.0), StopDecision::Improved);
        assert_eq!(es.update(2, 1.0), StopDecision::Stop);
    }

    #[test]
    fn test_min_delta() {
        let mut es = EarlyStopping::with_min_delta(3, 0.1);
        es.update(1, 1.0);
        assert_eq!(es.update(2, 0.95), StopDecision::Continue);
        assert_eq!(es.update(3, 0.85), StopDecision::Improved);
    }
}
