//! Per-epoch model snapshots: weights, the architecture descriptor needed to
//! rebuild the network, and the scores that triggered the save.

mod manager;
mod metadata;

pub use manager::CheckpointManager;
pub use metadata::{CheckpointMetadata, CheckpointMetrics};
