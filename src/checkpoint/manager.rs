use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use burn::prelude::*;
use burn::record::DefaultRecorder;

use crate::ai::{Architecture, ModelVariant, MoveModel};
use crate::checkpoint::metadata::{CheckpointMetadata, CheckpointMetrics};
use crate::error::CheckpointError;
use crate::training::EpochRecord;

const WEIGHTS_FILE: &str = "weights";
const ARCHITECTURE_FILE: &str = "architecture.json";
const METADATA_FILE: &str = "metadata.json";
const HISTORY_FILE: &str = "history.json";

/// Saves and restores per-epoch model snapshots in one directory.
///
/// Layout:
/// ```text
/// <dir>/model_<epoch>/weights.mpk
/// <dir>/model_<epoch>/architecture.json
/// <dir>/model_<epoch>/metadata.json
/// <dir>/history.json
/// ```
/// Snapshots are never pruned.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        CheckpointManager { dir }
    }

    /// Manager for `<path_save>_MLP`, `<path_save>_LSTM` or `<path_save>_CNN`.
    pub fn for_variant(path_save: &Path, variant: ModelVariant) -> Self {
        let mut name = OsString::from(path_save.as_os_str());
        name.push(variant.dir_suffix());
        Self::new(PathBuf::from(name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_{epoch}"))
    }

    /// Snapshot `model` for `epoch`. An existing snapshot for the same epoch
    /// is replaced.
    pub fn save<B: Backend, M: MoveModel<B>>(
        &self,
        model: &M,
        epoch: usize,
        metrics: &CheckpointMetrics,
    ) -> Result<PathBuf, CheckpointError> {
        let final_dir = self.checkpoint_path(epoch);
        let tmp_dir = self.dir.join(format!("model_{epoch}.tmp"));
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        let recorder = DefaultRecorder::default();
        model
            .clone()
            .save_file(tmp_dir.join(WEIGHTS_FILE), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;

        let architecture = model.architecture();
        fs::write(
            tmp_dir.join(ARCHITECTURE_FILE),
            serde_json::to_string_pretty(&architecture)?,
        )?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = CheckpointMetadata {
            epoch,
            timestamp,
            model: architecture.variant().name().to_string(),
            metrics: *metrics,
        };
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        // Atomic rename
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;

        Ok(final_dir)
    }

    /// Load the snapshot for `epoch` into `skeleton`, returning the restored
    /// model. The skeleton must have been built with the saved architecture.
    pub fn load<B: Backend, M: MoveModel<B>>(
        &self,
        epoch: usize,
        skeleton: M,
        device: &B::Device,
    ) -> Result<M, CheckpointError> {
        let path = self.existing_checkpoint(epoch)?;

        let saved = self.load_architecture(epoch)?;
        let expected = skeleton.architecture();
        if !saved.same_as(&expected) {
            return Err(CheckpointError::ArchitectureMismatch {
                path,
                expected: expected.to_string(),
                found: saved.to_string(),
            });
        }

        let recorder = DefaultRecorder::default();
        skeleton
            .load_file(path.join(WEIGHTS_FILE), &recorder, device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))
    }

    /// Architecture descriptor stored with the snapshot for `epoch`.
    pub fn load_architecture(&self, epoch: usize) -> Result<Architecture, CheckpointError> {
        let path = self.existing_checkpoint(epoch)?.join(ARCHITECTURE_FILE);
        read_json(&path)
    }

    pub fn load_metadata(&self, epoch: usize) -> Result<CheckpointMetadata, CheckpointError> {
        let path = self.existing_checkpoint(epoch)?.join(METADATA_FILE);
        read_json(&path)
    }

    /// List all snapshots sorted by epoch (ascending).
    pub fn list_checkpoints(&self) -> Result<Vec<(PathBuf, CheckpointMetadata)>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if !name_str.starts_with("model_") || name_str.ends_with(".tmp") {
                continue;
            }
            let meta_path = path.join(METADATA_FILE);
            if meta_path.exists() {
                let metadata: CheckpointMetadata = read_json(&meta_path)?;
                results.push((path, metadata));
            }
        }
        results.sort_by_key(|(_, m)| m.epoch);
        Ok(results)
    }

    /// Write the per-epoch train/dev curves next to the snapshots.
    pub fn write_history(&self, history: &[EpochRecord]) -> Result<PathBuf, CheckpointError> {
        let path = self.dir.join(HISTORY_FILE);
        fs::write(&path, serde_json::to_string_pretty(history)?)?;
        Ok(path)
    }

    fn existing_checkpoint(&self, epoch: usize) -> Result<PathBuf, CheckpointError> {
        let path = self.checkpoint_path(epoch);
        if path.is_dir() {
            Ok(path)
        } else {
            Err(CheckpointError::NotFound {
                epoch,
                dir: self.dir.clone(),
            })
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::MetadataRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{LstmNetworkConfig, MlpNetwork, MlpNetworkConfig};
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn test_metrics() -> CheckpointMetrics {
        CheckpointMetrics {
            train_score: 0.42,
            dev_score: 0.37,
            mean_loss: 3.1,
        }
    }

    fn outputs(model: &MlpNetwork<TestBackend>) -> Vec<f32> {
        let device = Default::default();
        let input = Tensor::<TestBackend, 4>::ones([2, 1, 8, 8], &device);
        model.forward(input).into_data().to_vec().unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let device = Default::default();
        let model = MlpNetworkConfig::new(8)
            .with_hidden_dim(16)
            .init::<TestBackend>(&device);

        let path = manager.save(&model, 3, &test_metrics()).unwrap();
        assert_eq!(path, dir.path().join("model_3"));
        assert!(path.join("weights.mpk").exists());
        assert!(path.join("architecture.json").exists());
        assert!(path.join("metadata.json").exists());
        assert!(!dir.path().join("model_3.tmp").exists());

        let skeleton = MlpNetworkConfig::new(8)
            .with_hidden_dim(16)
            .init::<TestBackend>(&device);
        let restored = manager.load(3, skeleton, &device).unwrap();
        let (a, b) = (outputs(&model), outputs(&restored));
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_metadata_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let model = MlpNetworkConfig::new(8)
            .with_hidden_dim(8)
            .init::<TestBackend>(&Default::default());

        manager.save(&model, 2, &test_metrics()).unwrap();
        let meta = manager.load_metadata(2).unwrap();
        assert_eq!(meta.epoch, 2);
        assert_eq!(meta.model, "MLP");
        assert_eq!(meta.metrics, test_metrics());

        let arch = manager.load_architecture(2).unwrap();
        assert_eq!(arch.variant(), ModelVariant::Mlp);
    }

    #[test]
    fn test_load_missing_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let device = Default::default();
        let skeleton = MlpNetworkConfig::new(8).init::<TestBackend>(&device);

        let err = manager.load(7, skeleton, &device).unwrap_err();
        assert!(
            matches!(err, CheckpointError::NotFound { epoch: 7, .. }),
            "expected NotFound, got: {err}"
        );
        assert!(err.to_string().contains("no checkpoint available"));
    }

    #[test]
    fn test_load_rejects_other_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let device = Default::default();
        let model = MlpNetworkConfig::new(8)
            .with_hidden_dim(16)
            .init::<TestBackend>(&device);
        manager.save(&model, 1, &test_metrics()).unwrap();

        let wider = MlpNetworkConfig::new(8)
            .with_hidden_dim(32)
            .init::<TestBackend>(&device);
        let err = manager.load(1, wider, &device).unwrap_err();
        assert!(matches!(err, CheckpointError::ArchitectureMismatch { .. }));

        let lstm = LstmNetworkConfig::new(8)
            .with_hidden_dim(16)
            .init::<TestBackend>(&device);
        let err = manager.load(1, lstm, &device).unwrap_err();
        assert!(matches!(err, CheckpointError::ArchitectureMismatch { .. }));
    }

    #[test]
    fn test_list_checkpoints_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let model = MlpNetworkConfig::new(8)
            .with_hidden_dim(8)
            .init::<TestBackend>(&Default::default());

        for epoch in [10, 2, 5] {
            manager.save(&model, epoch, &test_metrics()).unwrap();
        }
        // Stray entries are ignored.
        fs::create_dir_all(dir.path().join("model_11.tmp")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let epochs: Vec<usize> = manager
            .list_checkpoints()
            .unwrap()
            .iter()
            .map(|(_, m)| m.epoch)
            .collect();
        assert_eq!(epochs, vec![2, 5, 10]);
    }

    #[test]
    fn test_resave_same_epoch_replaces_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let model = MlpNetworkConfig::new(8)
            .with_hidden_dim(8)
            .init::<TestBackend>(&Default::default());

        manager.save(&model, 1, &test_metrics()).unwrap();
        let better = CheckpointMetrics {
            dev_score: 0.9,
            ..test_metrics()
        };
        manager.save(&model, 1, &better).unwrap();

        assert_eq!(manager.list_checkpoints().unwrap().len(), 1);
        assert_eq!(manager.load_metadata(1).unwrap().metrics.dev_score, 0.9);
    }

    #[test]
    fn test_for_variant_appends_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("save_models");

        let manager = CheckpointManager::for_variant(&base, ModelVariant::Lstm);
        assert_eq!(manager.dir(), dir.path().join("save_models_LSTM"));
        assert!(manager.dir().is_dir());

        // Idempotent
        let again = CheckpointManager::for_variant(&base, ModelVariant::Lstm);
        assert_eq!(again.dir(), manager.dir());
    }

    #[test]
    fn test_write_history() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path());
        let history = vec![
            EpochRecord {
                epoch: 1,
                mean_loss: 4.0,
                train_score: 0.1,
                dev_score: 0.2,
            },
            EpochRecord {
                epoch: 2,
                mean_loss: 3.5,
                train_score: 0.3,
                dev_score: 0.25,
            },
        ];

        let path = manager.write_history(&history).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["epoch"], 2);
        assert_eq!(json[0]["dev_score"], 0.2);
    }
}
