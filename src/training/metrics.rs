use std::time::{Duration, Instant};

/// Wall-clock tracker for a training run: per-epoch durations, the split
/// between training and prediction within the last epoch, and a remaining
/// time estimate.
pub struct RunTimer {
    run_start: Instant,
    epoch_durations: Vec<Duration>,
    last_train: Duration,
    last_predict: Duration,
    total_epochs: usize,
}

impl RunTimer {
    pub fn new(total_epochs: usize) -> Self {
        RunTimer {
            run_start: Instant::now(),
            epoch_durations: Vec::with_capacity(total_epochs),
            last_train: Duration::ZERO,
            last_predict: Duration::ZERO,
            total_epochs,
        }
    }

    /// Record a finished epoch: time spent in the gradient loop and in evaluation.
    pub fn record_epoch(&mut self, train: Duration, predict: Duration) {
        self.last_train = train;
        self.last_predict = predict;
        self.epoch_durations.push(train + predict);
    }

    pub fn elapsed(&self) -> Duration {
        self.run_start.elapsed()
    }

    pub fn epochs_done(&self) -> usize {
        self.epoch_durations.len()
    }

    pub fn last_train(&self) -> Duration {
        self.last_train
    }

    pub fn last_predict(&self) -> Duration {
        self.last_predict
    }

    /// Mean epoch duration so far.
    pub fn average_epoch(&self) -> Duration {
        let n = self.epoch_durations.len();
        if n == 0 {
            return Duration::ZERO;
        }
        self.epoch_durations.iter().sum::<Duration>() / n as u32
    }

    /// Estimated time left if every remaining epoch runs (early stopping may end sooner).
    pub fn remaining(&self) -> Duration {
        let left = self.total_epochs.saturating_sub(self.epochs_done());
        self.average_epoch() * left as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_epoch() {
        let mut t = RunTimer::new(10);
        t.record_epoch(Duration::from_millis(800), Duration::from_millis(200)); // 1s
        t.record_epoch(Duration::from_millis(2500), Duration::from_millis(500)); // 3s
        assert_eq!(t.average_epoch(), Duration::from_secs(2));
        assert_eq!(t.epochs_done(), 2);
    }

    #[test]
    fn test_remaining_uses_epochs_left() {
        let mut t = RunTimer::new(5);
        t.record_epoch(Duration::from_secs(2), Duration::ZERO);
        // 4 epochs left at 2s each
        assert_eq!(t.remaining(), Duration::from_secs(8));
    }

    #[test]
    fn test_last_epoch_split() {
        let mut t = RunTimer::new(3);
        t.record_epoch(Duration::from_secs(1), Duration::from_secs(2));
        t.record_epoch(Duration::from_secs(4), Duration::from_secs(5));
        assert_eq!(t.last_train(), Duration::from_secs(4));
        assert_eq!(t.last_predict(), Duration::from_secs(5));
    }

    #[test]
    fn test_no_epochs_yet() {
        let t = RunTimer::new(3);
        assert_eq!(t.average_epoch(), Duration::ZERO);
        assert_eq!(t.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_remaining_after_overrun_is_zero() {
        let mut t = RunTimer::new(1);
        t.record_epoch(Duration::from_secs(1), Duration::ZERO);
        t.record_epoch(Duration::from_secs(1), Duration::ZERO);
        assert_eq!(t.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_advances() {
        let t = RunTimer::new(1);
        std::thread::sleep(Duration::from_millis(5));
        assert!(t.elapsed() >= Duration::from_millis(5));
    }
}
