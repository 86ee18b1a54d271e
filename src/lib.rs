//! # ML Othello
//!
//! Supervised next-move prediction for grid board games (Othello by
//! default). Three network families share one training loop built on the
//! Burn ML framework, with dev-set model selection, early stopping and
//! per-epoch checkpoints.
//!
//! ## Modules
//!
//! - [`game`]: Board snapshots and position classes
//! - [`data`]: Samples, batches and the restartable batch iterator
//! - [`ai`]: The `MoveModel` capability, MLP/LSTM/CNN networks, tensor encoding
//! - [`training`]: Trainer, evaluator, classification report, run state
//! - [`checkpoint`]: Per-epoch model persistence
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod game;
pub mod training;
