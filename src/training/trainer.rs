use std::time::Instant;

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use crate::ai::state_encoding::{encode_boards, encode_targets};
use crate::ai::MoveModel;
use crate::checkpoint::{CheckpointManager, CheckpointMetrics};
use crate::data::BatchSource;
use crate::error::{CheckpointError, TrainingError};
use crate::training::evaluator::{check_input, check_output, progress_bar, Evaluator};
use crate::training::loss::cross_entropy;
use crate::training::metrics::RunTimer;
use crate::training::report::ClassificationReport;
use crate::training::run_state::{EpochDecision, EpochRecord, TrainingRunState};

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_epochs: usize,
    pub learning_rate: f64,
    /// Consecutive non-improving epochs tolerated before stopping.
    #[serde(alias = "earlyStopping")]
    pub early_stopping: usize,
    /// Draw per-batch progress bars.
    pub show_progress: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_epochs: 20,
            learning_rate: 1e-3,
            early_stopping: 5,
            show_progress: true,
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct TrainingOutcome<M> {
    /// 1-based index of the best epoch.
    pub best_epoch: usize,
    pub best_dev_score: f64,
    /// Weights reloaded from the best epoch's checkpoint.
    pub best_model: M,
    pub history: Vec<EpochRecord>,
    /// Dev report of `best_model`, recomputed after the reload.
    pub final_report: ClassificationReport,
}

/// Supervised trainer for next-move networks with dev-set model selection
/// and early stopping.
pub struct Trainer {
    config: TrainerConfig,
    checkpoints: CheckpointManager,
}

impl Trainer {
    pub fn new(config: TrainerConfig, checkpoints: CheckpointManager) -> Self {
        Trainer {
            config,
            checkpoints,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn checkpoints(&self) -> &CheckpointManager {
        &self.checkpoints
    }

    /// Run the full training loop.
    ///
    /// Each epoch trains on every batch of `train`, scores the eval-mode model
    /// on both splits by weighted recall, and checkpoints the epoch when the
    /// dev score improves. Once the epoch budget or the patience runs out,
    /// the best checkpoint is reloaded and rescored on `dev`.
    pub fn run<B, M, O>(
        &self,
        mut model: M,
        optimizer: &mut O,
        train: &mut dyn BatchSource,
        dev: &mut dyn BatchSource,
        device: &B::Device,
    ) -> Result<TrainingOutcome<M>, TrainingError>
    where
        B: AutodiffBackend,
        M: MoveModel<B> + AutodiffModule<B>,
        M::InnerModule: MoveModel<B::InnerBackend>,
        O: Optimizer<M, B>,
    {
        let num_epochs = self.config.num_epochs;
        let patience = self.config.early_stopping;
        let evaluator = Evaluator::new(self.config.show_progress);
        let mut state = TrainingRunState::new();
        let mut timer = RunTimer::new(num_epochs);

        log::info!(
            "Starting {} training for {} epochs ({} train / {} dev samples, checkpoints in {})",
            model.architecture().variant(),
            num_epochs,
            train.num_samples(),
            dev.num_samples(),
            self.checkpoints.dir().display()
        );

        for epoch in 1..=num_epochs {
            let start = Instant::now();
            let (next, mean_loss) = self.train_epoch(model, optimizer, train, device, epoch)?;
            model = next;
            log::info!("epoch {epoch}/{num_epochs} - loss = {mean_loss:.6}");
            let train_elapsed = start.elapsed();

            let predict_start = Instant::now();
            let eval_model = model.valid();
            let train_score = evaluator
                .evaluate::<B::InnerBackend, _>(&eval_model, train, device)?
                .weighted_recall();
            let dev_score = evaluator
                .evaluate::<B::InnerBackend, _>(&eval_model, dev, device)?
                .weighted_recall();
            timer.record_epoch(train_elapsed, predict_start.elapsed());

            log::info!(
                "accuracy train: {:.2}%, dev: {:.2}% ; time: {}s (last_train: {}s, last_pred: {}s, remaining: ~{}s)",
                100.0 * train_score,
                100.0 * dev_score,
                timer.elapsed().as_secs(),
                timer.last_train().as_secs(),
                timer.last_predict().as_secs(),
                timer.remaining().as_secs()
            );

            let record = EpochRecord {
                epoch,
                mean_loss,
                train_score,
                dev_score,
            };
            let (next_state, decision) = state.advance(record, patience);
            state = next_state;

            match decision {
                EpochDecision::Improved => {
                    let metrics = CheckpointMetrics {
                        train_score,
                        dev_score,
                        mean_loss,
                    };
                    let path = self.checkpoints.save::<B, _>(&model, epoch, &metrics)?;
                    log::info!("checkpoint saved: {}", path.display());
                }
                EpochDecision::Stalled {
                    epochs_without_improvement,
                } => {
                    log::debug!("no improvement for {epochs_without_improvement} epoch(s)");
                }
                EpochDecision::Stop => {
                    log::info!(
                        "early stopping at epoch {epoch}: no improvement for {} epochs",
                        state.epochs_without_improvement()
                    );
                    break;
                }
            }

            if let (Some(best_epoch), Some(best)) = (state.best_epoch(), state.best_dev_score()) {
                log::info!("best score on dev: epoch {best_epoch} ({:.3}%)", 100.0 * best);
            }
        }

        let (best_epoch, best_dev_score) = match (state.best_epoch(), state.best_dev_score()) {
            (Some(epoch), Some(score)) => (epoch, score),
            _ => {
                let dir = self.checkpoints.dir().to_path_buf();
                return Err(CheckpointError::NoCheckpoint(dir).into());
            }
        };

        let best_model = self.checkpoints.load::<B, _>(best_epoch, model, device)?;
        let final_report =
            evaluator.evaluate::<B::InnerBackend, _>(&best_model.valid(), dev, device)?;
        log::info!(
            "recomputed best dev (epoch {best_epoch}): weighted recall {:.3}%",
            100.0 * final_report.weighted_recall()
        );

        Ok(TrainingOutcome {
            best_epoch,
            best_dev_score,
            best_model,
            history: state.into_history(),
            final_report,
        })
    }

    /// One pass over `train`. Returns the updated model and the mean batch loss.
    fn train_epoch<B, M, O>(
        &self,
        mut model: M,
        optimizer: &mut O,
        train: &mut dyn BatchSource,
        device: &B::Device,
        epoch: usize,
    ) -> Result<(M, f32), TrainingError>
    where
        B: AutodiffBackend,
        M: MoveModel<B> + AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let progress = progress_bar(train.num_batches(), self.config.show_progress, "train");
        let mut total_loss = 0.0f32;
        let mut num_batches = 0usize;

        for (batch_idx, batch) in train.batches().enumerate() {
            if batch.is_empty() {
                continue;
            }
            check_input::<B, _>(&model, &batch)?;
            let inputs = encode_boards::<B>(&batch, device);
            let targets = encode_targets::<B>(&batch, device);

            let logits = model.forward(inputs);
            check_output(&logits, batch.len(), batch.num_classes())?;
            let loss = cross_entropy(logits, targets);

            let loss_value = loss.clone().into_scalar().elem::<f32>();
            if !loss_value.is_finite() {
                progress.abandon();
                return Err(TrainingError::NonFiniteLoss {
                    epoch,
                    batch: batch_idx + 1,
                    loss: loss_value,
                });
            }

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(self.config.learning_rate, model, grads);

            total_loss += loss_value;
            num_batches += 1;
            log::debug!("epoch {epoch} batch {} loss {loss_value:.6}", batch_idx + 1);

            if batch_idx % 10 == 0 {
                progress.set_message(format!("loss: {:.6}", total_loss / num_batches as f32));
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        let mean_loss = if num_batches > 0 {
            total_loss / num_batches as f32
        } else {
            0.0
        };
        Ok((model, mean_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MlpNetwork, MlpNetworkConfig};
    use crate::data::{DataLoader, Sample};
    use crate::game::{num_classes, BoardState, Cell};
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::AdamConfig;

    type TrainBackend = Autodiff<NdArray<f32>>;

    /// One black stone per board; the target is the stone's own position.
    fn stone_samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let class = (i * 5) % 16;
                let board = BoardState::empty(8).with_cell(class / 8, class % 8, Cell::Black);
                Sample::with_move(vec![board], class).unwrap()
            })
            .collect()
    }

    fn config(num_epochs: usize, learning_rate: f64, early_stopping: usize) -> TrainerConfig {
        TrainerConfig {
            num_epochs,
            learning_rate,
            early_stopping,
            show_progress: false,
        }
    }

    fn small_mlp() -> MlpNetwork<TrainBackend> {
        MlpNetworkConfig::new(8)
            .with_hidden_dim(32)
            .with_dropout(0.0)
            .init::<TrainBackend>(&Default::default())
    }

    fn epochs_on_disk(trainer: &Trainer) -> Vec<usize> {
        trainer
            .checkpoints()
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|(_, m)| m.epoch)
            .collect()
    }

    #[test]
    fn test_every_improving_epoch_has_a_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(config(4, 1e-2, 10), CheckpointManager::new(dir.path()));
        let device = Default::default();
        let mut optimizer = AdamConfig::new().init::<TrainBackend, MlpNetwork<TrainBackend>>();
        let mut train = DataLoader::new(stone_samples(48), 8, 8, 1)
            .unwrap()
            .with_shuffle(7);
        let mut dev = DataLoader::new(stone_samples(16), 8, 8, 1).unwrap();

        let outcome = trainer
            .run::<TrainBackend, _, _>(
                small_mlp(),
                &mut optimizer,
                &mut train,
                &mut dev,
                &device,
            )
            .unwrap();

        let mut improving = Vec::new();
        let mut best: Option<f64> = None;
        for record in &outcome.history {
            if best.map_or(true, |b| record.dev_score > b) {
                best = Some(record.dev_score);
                improving.push(record.epoch);
            }
        }
        assert_eq!(epochs_on_disk(&trainer), improving);
        assert_eq!(improving.last(), Some(&outcome.best_epoch));
        assert_eq!(Some(outcome.best_dev_score), best);
        assert_eq!(outcome.history.len(), 4);
        assert!(outcome.history.iter().all(|r| r.mean_loss.is_finite()));

        // The reloaded model reproduces the checkpointed dev score.
        assert!((outcome.final_report.weighted_recall() - outcome.best_dev_score).abs() < 1e-9);
    }

    #[test]
    fn test_early_stop_when_dev_score_never_moves() {
        let dir = tempfile::tempdir().unwrap();
        // A zero learning rate leaves the weights and therefore every score unchanged.
        let trainer = Trainer::new(config(10, 0.0, 1), CheckpointManager::new(dir.path()));
        let device = Default::default();
        let mut optimizer = AdamConfig::new().init::<TrainBackend, MlpNetwork<TrainBackend>>();
        let mut train = DataLoader::new(stone_samples(16), 4, 8, 1).unwrap();
        let mut dev = DataLoader::new(stone_samples(8), 4, 8, 1).unwrap();

        let outcome = trainer
            .run::<TrainBackend, _, _>(
                small_mlp(),
                &mut optimizer,
                &mut train,
                &mut dev,
                &device,
            )
            .unwrap();

        assert_eq!(outcome.best_epoch, 1);
        assert_eq!(outcome.history.len(), 3);
        assert_eq!(epochs_on_disk(&trainer), vec![1]);
    }

    #[test]
    fn test_single_epoch_with_empty_dev_split() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(config(1, 1e-3, 0), CheckpointManager::new(dir.path()));
        let device = Default::default();
        let mut optimizer = AdamConfig::new().init::<TrainBackend, MlpNetwork<TrainBackend>>();
        let mut train = DataLoader::new(stone_samples(8), 4, 8, 1).unwrap();
        let mut dev = DataLoader::new(Vec::new(), 4, 8, 1).unwrap();

        let outcome = trainer
            .run::<TrainBackend, _, _>(
                small_mlp(),
                &mut optimizer,
                &mut train,
                &mut dev,
                &device,
            )
            .unwrap();

        assert_eq!(outcome.best_epoch, 1);
        assert_eq!(outcome.best_dev_score, 1.0);
        assert_eq!(epochs_on_disk(&trainer), vec![1]);
    }

    #[test]
    fn test_zero_epochs_has_no_checkpoint_to_reload() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(config(0, 1e-3, 0), CheckpointManager::new(dir.path()));
        let device = Default::default();
        let mut optimizer = AdamConfig::new().init::<TrainBackend, MlpNetwork<TrainBackend>>();
        let mut train = DataLoader::new(stone_samples(4), 4, 8, 1).unwrap();
        let mut dev = DataLoader::new(stone_samples(4), 4, 8, 1).unwrap();

        let err = trainer
            .run::<TrainBackend, _, _>(
                small_mlp(),
                &mut optimizer,
                &mut train,
                &mut dev,
                &device,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::Checkpoint(CheckpointError::NoCheckpoint(_))
        ));
    }

    #[test]
    fn test_non_finite_loss_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(config(3, 1e-3, 0), CheckpointManager::new(dir.path()));
        let device = Default::default();
        let mut optimizer = AdamConfig::new().init::<TrainBackend, MlpNetwork<TrainBackend>>();

        let mut target = vec![0.0f32; num_classes(8)];
        target[0] = f32::NAN;
        let poisoned = Sample::new(vec![BoardState::empty(8)], target).unwrap();
        let mut train = DataLoader::new(vec![poisoned], 4, 8, 1).unwrap();
        let mut dev = DataLoader::new(stone_samples(4), 4, 8, 1).unwrap();

        let err = trainer
            .run::<TrainBackend, _, _>(
                small_mlp(),
                &mut optimizer,
                &mut train,
                &mut dev,
                &device,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::NonFiniteLoss { epoch: 1, batch: 1, .. }
        ));
        assert!(epochs_on_disk(&trainer).is_empty());
    }

    #[test]
    fn test_mismatched_history_window_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(config(1, 1e-3, 0), CheckpointManager::new(dir.path()));
        let device = Default::default();
        let mut optimizer = AdamConfig::new().init::<TrainBackend, MlpNetwork<TrainBackend>>();
        let mut train = DataLoader::new(stone_samples(4), 4, 8, 3).unwrap();
        let mut dev = DataLoader::new(stone_samples(4), 4, 8, 3).unwrap();

        let err = trainer
            .run::<TrainBackend, _, _>(
                small_mlp(),
                &mut optimizer,
                &mut train,
                &mut dev,
                &device,
            )
            .unwrap_err();
        assert!(matches!(err, TrainingError::InputMismatch { seq_len: 3, .. }));
    }

    #[test]
    fn test_trainer_config_accepts_camel_case_patience() {
        let config: TrainerConfig = toml::from_str("earlyStopping = 3").unwrap();
        assert_eq!(config.early_stopping, 3);
        assert_eq!(config.num_epochs, TrainerConfig::default().num_epochs);
    }
}
