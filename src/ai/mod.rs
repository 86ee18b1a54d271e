//! The move-prediction capability shared by every network variant, plus the
//! architecture descriptors written into checkpoints.

pub mod networks;
pub mod state_encoding;

use std::fmt;

use burn::prelude::*;
use burn::tensor::activation::softmax;
use serde::{Deserialize, Serialize};

pub use networks::{
    CnnNetwork, CnnNetworkConfig, LstmNetwork, LstmNetworkConfig, MlpNetwork, MlpNetworkConfig,
    MIN_CNN_BOARD_SIZE,
};

/// A trainable next-move predictor.
///
/// Inputs are always `[batch, seq_len, size, size]`; each variant reshapes
/// them as it needs. Outputs are raw logits of shape `[batch, size²]`.
///
/// Train mode is the module on an autodiff backend (dropout active). Eval
/// mode is its `AutodiffModule::valid()` counterpart: same parameters, no
/// gradient graph, dropout disabled.
pub trait MoveModel<B: Backend>: Module<B> {
    fn forward(&self, boards: Tensor<B, 4>) -> Tensor<B, 2>;

    /// Architecture tag and configuration of this instance.
    fn architecture(&self) -> Architecture;
}

impl<B: Backend> MoveModel<B> for MlpNetwork<B> {
    fn forward(&self, boards: Tensor<B, 4>) -> Tensor<B, 2> {
        MlpNetwork::forward(self, boards)
    }

    fn architecture(&self) -> Architecture {
        Architecture::Mlp(self.config())
    }
}

impl<B: Backend> MoveModel<B> for LstmNetwork<B> {
    fn forward(&self, boards: Tensor<B, 4>) -> Tensor<B, 2> {
        LstmNetwork::forward(self, boards)
    }

    fn architecture(&self) -> Architecture {
        Architecture::Lstm(self.config())
    }
}

impl<B: Backend> MoveModel<B> for CnnNetwork<B> {
    fn forward(&self, boards: Tensor<B, 4>) -> Tensor<B, 2> {
        CnnNetwork::forward(self, boards)
    }

    fn architecture(&self) -> Architecture {
        Architecture::Cnn(self.config())
    }
}

/// Probability distribution over positions (softmax of the logits).
pub fn predict_proba<B: Backend, M: MoveModel<B>>(model: &M, boards: Tensor<B, 4>) -> Tensor<B, 2> {
    softmax(model.forward(boards), 1)
}

/// The three network families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    Mlp,
    Lstm,
    Cnn,
}

impl ModelVariant {
    pub fn name(self) -> &'static str {
        match self {
            ModelVariant::Mlp => "MLP",
            ModelVariant::Lstm => "LSTM",
            ModelVariant::Cnn => "CNN",
        }
    }

    /// Suffix appended to the configured save path for this variant's checkpoints.
    pub fn dir_suffix(self) -> &'static str {
        match self {
            ModelVariant::Mlp => "_MLP",
            ModelVariant::Lstm => "_LSTM",
            ModelVariant::Cnn => "_CNN",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Architecture tag plus the configuration needed to rebuild the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "architecture", rename_all = "lowercase")]
pub enum Architecture {
    Mlp(MlpNetworkConfig),
    Lstm(LstmNetworkConfig),
    Cnn(CnnNetworkConfig),
}

impl Architecture {
    pub fn variant(&self) -> ModelVariant {
        match self {
            Architecture::Mlp(_) => ModelVariant::Mlp,
            Architecture::Lstm(_) => ModelVariant::Lstm,
            Architecture::Cnn(_) => ModelVariant::Cnn,
        }
    }

    pub fn board_size(&self) -> usize {
        match self {
            Architecture::Mlp(c) => c.board_size,
            Architecture::Lstm(c) => c.board_size,
            Architecture::Cnn(c) => c.board_size,
        }
    }

    /// Whether batches of `seq_len` boards on a `board_size` grid fit this
    /// network. Only the MLP has a fixed history window; the CNN's conv/pool
    /// stages need at least a `MIN_CNN_BOARD_SIZE` board.
    pub fn accepts(&self, seq_len: usize, board_size: usize) -> bool {
        if board_size != self.board_size() || seq_len == 0 {
            return false;
        }
        match self {
            Architecture::Mlp(c) => c.seq_len == seq_len,
            Architecture::Lstm(_) => true,
            Architecture::Cnn(_) => board_size >= MIN_CNN_BOARD_SIZE,
        }
    }

    /// Compare two descriptors by their serialized form.
    pub fn same_as(&self, other: &Architecture) -> bool {
        match (serde_json::to_value(self), serde_json::to_value(other)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{json}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::module::AutodiffModule;

    type InferBackend = NdArray<f32>;
    type TrainBackend = Autodiff<InferBackend>;

    fn boards<B: Backend>(batch: usize, seq: usize, device: &B::Device) -> Tensor<B, 4> {
        Tensor::ones([batch, seq, 8, 8], device)
    }

    #[test]
    fn test_every_variant_outputs_one_score_per_position() {
        let device = Default::default();
        let mlp = MlpNetworkConfig::new(8).init::<InferBackend>(&device);
        let lstm = LstmNetworkConfig::new(8)
            .with_hidden_dim(16)
            .init::<InferBackend>(&device);
        let cnn = CnnNetworkConfig::new(8).init::<InferBackend>(&device);

        assert_eq!(MoveModel::forward(&mlp, boards(6, 1, &device)).dims(), [6, 64]);
        assert_eq!(MoveModel::forward(&lstm, boards(6, 1, &device)).dims(), [6, 64]);
        assert_eq!(MoveModel::forward(&cnn, boards(6, 1, &device)).dims(), [6, 64]);
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let device = Default::default();
        let model = MlpNetworkConfig::new(8)
            .with_dropout(0.5)
            .init::<TrainBackend>(&device);
        let eval = model.valid();

        let a: Vec<f32> = MoveModel::forward(&eval, boards(2, 1, &device))
            .into_data()
            .to_vec()
            .unwrap();
        let b: Vec<f32> = MoveModel::forward(&eval, boards(2, 1, &device))
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let device = Default::default();
        let model = CnnNetworkConfig::new(8).init::<InferBackend>(&device);
        let probs: Vec<f32> = predict_proba(&model, boards(3, 1, &device))
            .into_data()
            .to_vec()
            .unwrap();
        for row in probs.chunks(64) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "row sums to {sum}");
        }
    }

    #[test]
    fn test_architecture_tags() {
        let device = Default::default();
        let model = LstmNetworkConfig::new(8)
            .with_hidden_dim(32)
            .init::<InferBackend>(&device);
        let arch = MoveModel::architecture(&model);
        assert_eq!(arch.variant(), ModelVariant::Lstm);
        assert_eq!(arch.board_size(), 8);

        let json = serde_json::to_value(&arch).unwrap();
        assert_eq!(json["architecture"], "lstm");
        assert_eq!(json["hidden_dim"], 32);
    }

    #[test]
    fn test_architecture_json_roundtrip() {
        let arch = Architecture::Mlp(MlpNetworkConfig::new(8).with_seq_len(2));
        let json = serde_json::to_string(&arch).unwrap();
        let back: Architecture = serde_json::from_str(&json).unwrap();
        assert!(arch.same_as(&back));
        assert!(!arch.same_as(&Architecture::Mlp(MlpNetworkConfig::new(8))));
    }

    #[test]
    fn test_accepts_checks_window_and_board() {
        let mlp = Architecture::Mlp(MlpNetworkConfig::new(8).with_seq_len(2));
        assert!(mlp.accepts(2, 8));
        assert!(!mlp.accepts(1, 8));
        assert!(!mlp.accepts(2, 6));

        let lstm = Architecture::Lstm(LstmNetworkConfig::new(8));
        assert!(lstm.accepts(5, 8));
        assert!(!lstm.accepts(5, 7));

        assert!(Architecture::Cnn(CnnNetworkConfig::new(MIN_CNN_BOARD_SIZE)).accepts(1, 5));
        assert!(!Architecture::Cnn(CnnNetworkConfig::new(4)).accepts(1, 4));
    }

    #[test]
    fn test_variant_dir_suffix() {
        assert_eq!(ModelVariant::Mlp.dir_suffix(), "_MLP");
        assert_eq!(ModelVariant::Lstm.dir_suffix(), "_LSTM");
        assert_eq!(ModelVariant::Cnn.dir_suffix(), "_CNN");
        assert_eq!(ModelVariant::Cnn.to_string(), "CNN");
    }
}
