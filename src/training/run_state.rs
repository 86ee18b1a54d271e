use serde::Serialize;

/// Train/dev scores and mean loss observed for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochRecord {
    /// 1-based.
    pub epoch: usize,
    pub mean_loss: f32,
    pub train_score: f64,
    pub dev_score: f64,
}

/// What the trainer should do after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochDecision {
    /// New best: save a checkpoint for this epoch.
    Improved,
    /// No improvement, still within patience.
    Stalled { epochs_without_improvement: usize },
    /// Patience exhausted.
    Stop,
}

/// Best score, best epoch, stall counter and history of one training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingRunState {
    best_dev_score: Option<f64>,
    best_epoch: Option<usize>,
    epochs_without_improvement: usize,
    history: Vec<EpochRecord>,
}

impl TrainingRunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one epoch into the state.
    ///
    /// The first epoch always improves; later ones must strictly beat the
    /// best dev score. The run stops once more than `patience` consecutive
    /// epochs fail to improve.
    pub fn advance(mut self, record: EpochRecord, patience: usize) -> (Self, EpochDecision) {
        let improved = match self.best_dev_score {
            None => true,
            Some(best) => record.dev_score > best,
        };
        self.history.push(record);

        if improved {
            self.best_dev_score = Some(record.dev_score);
            self.best_epoch = Some(record.epoch);
            self.epochs_without_improvement = 0;
            return (self, EpochDecision::Improved);
        }

        self.epochs_without_improvement += 1;
        let decision = if self.epochs_without_improvement > patience {
            EpochDecision::Stop
        } else {
            EpochDecision::Stalled {
                epochs_without_improvement: self.epochs_without_improvement,
            }
        };
        (self, decision)
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn best_dev_score(&self) -> Option<f64> {
        self.best_dev_score
    }

    pub fn epochs_without_improvement(&self) -> usize {
        self.epochs_without_improvement
    }

    pub fn history(&self) -> &[EpochRecord] {
        &self.history
    }

    pub fn into_history(self) -> Vec<EpochRecord> {
        self.history
    }
}
