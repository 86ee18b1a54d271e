//! Samples, host-side batches and the restartable batch iterator consumed by
//! the trainer and the evaluator.

pub mod jsonl;
mod loader;
mod sample;

pub use loader::{BatchSource, DataLoader};
pub use sample::{argmax, Batch, Sample};
