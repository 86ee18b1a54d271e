use std::path::PathBuf;

/// Errors raised while building samples, batches, or reading sample files.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("board has {got} cells, expected {expected} for a {size}x{size} grid")]
    BoardSize {
        size: usize,
        expected: usize,
        got: usize,
    },

    #[error("invalid cell value {0} (expected -1, 0 or 1)")]
    CellValue(i64),

    #[error("sample has no board states")]
    EmptySequence,

    #[error("sample mixes board sizes {first} and {other}")]
    MixedBoardSizes { first: usize, other: usize },

    #[error("target has {got} entries, expected {expected}")]
    TargetLength { expected: usize, got: usize },

    #[error("position class {class} out of range for {classes} classes")]
    ClassOutOfRange { class: usize, classes: usize },

    #[error("batch size must be > 0")]
    InvalidBatchSize,

    #[error("failed to read samples from {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("{path}:{line}: sample needs either \"move\" or \"target\"")]
    MissingTarget { path: PathBuf, line: usize },
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no checkpoint available for epoch {epoch} in {dir}")]
    NotFound { epoch: usize, dir: PathBuf },

    #[error("no checkpoint available in {0}: no epoch was recorded as best")]
    NoCheckpoint(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("checkpoint at {path} holds a {found} model, expected {expected}")]
    ArchitectureMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("failed to save model: {0}")]
    ModelSave(String),

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that abort a training run.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("non-finite loss {loss} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss { epoch: usize, batch: usize, loss: f32 },

    #[error("model output has shape {got:?}, expected {expected:?}")]
    ShapeMismatch { expected: [usize; 2], got: Vec<usize> },

    #[error("{architecture} model cannot take {seq_len} boards of size {board_size}x{board_size}")]
    InputMismatch {
        architecture: String,
        seq_len: usize,
        board_size: usize,
    },
    #[error("failed to read tensor data: {0}")]
    TensorData(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
