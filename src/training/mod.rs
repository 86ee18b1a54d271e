//! Supervised training: the epoch loop with dev-set model selection, the
//! evaluator and its classification report, the loss, and run bookkeeping.

pub mod evaluator;
pub mod loss;
pub mod metrics;
pub mod report;
pub mod run_state;
pub mod trainer;

pub use evaluator::Evaluator;
pub use report::{ClassMetrics, ClassificationReport};
pub use run_state::{EpochDecision, EpochRecord, TrainingRunState};
pub use trainer::{Trainer, TrainerConfig, TrainingOutcome};
