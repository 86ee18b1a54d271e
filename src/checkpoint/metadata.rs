use serde::{Deserialize, Serialize};

/// Scores of the epoch a checkpoint was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub train_score: f64,
    pub dev_score: f64,
    pub mean_loss: f32,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub epoch: usize,
    pub timestamp: u64,
    /// Network family, e.g. "MLP".
    pub model: String,
    pub metrics: CheckpointMetrics,
}
