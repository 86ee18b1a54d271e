use burn::prelude::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::ai::state_encoding::encode_boards;
use crate::ai::MoveModel;
use crate::data::{argmax, Batch, BatchSource};
use crate::error::TrainingError;
use crate::training::report::ClassificationReport;

/// Scores a model over a full split.
///
/// Pass the eval-mode module (`AutodiffModule::valid()`) so that dropout is
/// off and no gradient graph is built.
pub struct Evaluator {
    show_progress: bool,
}

impl Evaluator {
    pub fn new(show_progress: bool) -> Self {
        Evaluator { show_progress }
    }

    pub fn evaluate<B: Backend, M: MoveModel<B>>(
        &self,
        model: &M,
        data: &mut dyn BatchSource,
        device: &B::Device,
    ) -> Result<ClassificationReport, TrainingError> {
        let progress = progress_bar(data.num_batches(), self.show_progress, "eval");
        let mut predicted = Vec::with_capacity(data.num_samples());
        let mut actual = Vec::with_capacity(data.num_samples());

        for batch in data.batches() {
            if batch.is_empty() {
                continue;
            }
            check_input(model, &batch)?;
            let logits = model.forward(encode_boards::<B>(&batch, device));
            let scores = logits_to_vec(logits, batch.len(), batch.num_classes())?;

            predicted.extend(scores.chunks(batch.num_classes()).map(argmax));
            actual.extend(batch.target_classes());
            progress.inc(1);
        }
        progress.finish_and_clear();

        log::debug!("evaluated {} samples", actual.len());
        Ok(ClassificationReport::from_pairs(&predicted, &actual))
    }
}

/// Reject batches whose history length or board size the network cannot take.
pub(crate) fn check_input<B: Backend, M: MoveModel<B>>(
    model: &M,
    batch: &Batch,
) -> Result<(), TrainingError> {
    let architecture = model.architecture();
    if architecture.accepts(batch.seq_len(), batch.board_size()) {
        Ok(())
    } else {
        Err(TrainingError::InputMismatch {
            architecture: architecture.variant().to_string(),
            seq_len: batch.seq_len(),
            board_size: batch.board_size(),
        })
    }
}

/// Check the `[rows, classes]` output shape.
pub(crate) fn check_output<B: Backend>(
    output: &Tensor<B, 2>,
    rows: usize,
    classes: usize,
) -> Result<(), TrainingError> {
    let dims = output.dims();
    if dims != [rows, classes] {
        return Err(TrainingError::ShapeMismatch {
            expected: [rows, classes],
            got: dims.to_vec(),
        });
    }
    Ok(())
}

fn logits_to_vec<B: Backend>(
    logits: Tensor<B, 2>,
    rows: usize,
    classes: usize,
) -> Result<Vec<f32>, TrainingError> {
    check_output(&logits, rows, classes)?;
    logits
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TrainingError::TensorData(format!("{e:?}")))
}

pub(crate) fn progress_bar(len: usize, visible: bool, label: &str) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {prefix} {msg}")
    {
        progress.set_style(style);
    }
    progress.set_prefix(label.to_string());
    progress
}
