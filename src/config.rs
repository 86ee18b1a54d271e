use std::path::{Path, PathBuf};

use crate::ai::networks::MIN_CNN_BOARD_SIZE;
use crate::ai::{CnnNetworkConfig, LstmNetworkConfig, MlpNetworkConfig};
use crate::error::ConfigError;
use crate::game::DEFAULT_BOARD_SIZE;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub board_size: usize,
    /// Checkpoint base path; each network family appends its own suffix.
    pub path_save: PathBuf,
    /// Boards of history fed to the network per sample.
    #[serde(alias = "len_inpout_seq")]
    pub len_input_seq: usize,
    pub training: TrainerConfig,
    pub data: DataConfig,
    pub mlp: MlpOptions,
    #[serde(alias = "LSTM_conf")]
    pub lstm: LstmOptions,
    pub cnn: CnnOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            board_size: DEFAULT_BOARD_SIZE,
            path_save: PathBuf::from("save_models"),
            len_input_seq: 1,
            training: TrainerConfig::default(),
            data: DataConfig::default(),
            mlp: MlpOptions::default(),
            lstm: LstmOptions::default(),
            cnn: CnnOptions::default(),
        }
    }
}

/// Batching of the train and dev splits.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub batch_size: usize,
    /// Reshuffle the training split every epoch.
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            batch_size: 1000,
            shuffle: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MlpOptions {
    pub hidden_dim: usize,
    pub dropout: f64,
}

impl Default for MlpOptions {
    fn default() -> Self {
        MlpOptions {
            hidden_dim: 128,
            dropout: 0.1,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LstmOptions {
    pub hidden_dim: usize,
    pub dropout: f64,
}

impl Default for LstmOptions {
    fn default() -> Self {
        LstmOptions {
            hidden_dim: 128,
            dropout: 0.1,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CnnOptions {
    pub dropout: f64,
}

impl Default for CnnOptions {
    fn default() -> Self {
        CnnOptions { dropout: 0.1 }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.board_size == 0 {
            return Err(ConfigError::Validation("board_size must be > 0".into()));
        }
        if self.len_input_seq == 0 {
            return Err(ConfigError::Validation("len_input_seq must be > 0".into()));
        }
        if self.training.num_epochs == 0 {
            return Err(ConfigError::Validation(
                "training.num_epochs must be > 0".into(),
            ));
        }
        if self.training.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "training.learning_rate must be > 0".into(),
            ));
        }
        if self.data.batch_size == 0 {
            return Err(ConfigError::Validation(
                "data.batch_size must be > 0".into(),
            ));
        }
        if self.mlp.hidden_dim == 0 {
            return Err(ConfigError::Validation("mlp.hidden_dim must be > 0".into()));
        }
        if self.lstm.hidden_dim == 0 {
            return Err(ConfigError::Validation(
                "lstm.hidden_dim must be > 0".into(),
            ));
        }
        for (name, p) in [
            ("mlp.dropout", self.mlp.dropout),
            ("lstm.dropout", self.lstm.dropout),
            ("cnn.dropout", self.cnn.dropout),
        ] {
            if !(0.0..1.0).contains(&p) {
                return Err(ConfigError::Validation(format!("{name} must be in [0, 1)")));
            }
        }

        Ok(())
    }

    pub fn mlp_network(&self) -> MlpNetworkConfig {
        MlpNetworkConfig::new(self.board_size)
            .with_seq_len(self.len_input_seq)
            .with_hidden_dim(self.mlp.hidden_dim)
            .with_dropout(self.mlp.dropout)
    }

    pub fn lstm_network(&self) -> LstmNetworkConfig {
        LstmNetworkConfig::new(self.board_size)
            .with_hidden_dim(self.lstm.hidden_dim)
            .with_dropout(self.lstm.dropout)
    }

    /// The two 2x2 conv/pool stages need at least a 5x5 board.
    pub fn cnn_network(&self) -> Result<CnnNetworkConfig, ConfigError> {
        if self.board_size < MIN_CNN_BOARD_SIZE {
            return Err(ConfigError::Validation(format!(
                "board_size must be >= {MIN_CNN_BOARD_SIZE} for the CNN, got {}",
                self.board_size
            )));
        }
        Ok(CnnNetworkConfig::new(self.board_size).with_dropout(self.cnn.dropout))
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
