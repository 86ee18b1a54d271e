use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Multilayer perceptron over the flattened board history.
///
/// ```text
/// Input:   [batch, seq, size, size]
/// Flatten: seq * size²
/// Lin1:    seq * size² -> hidden, ReLU, Dropout
/// Lin2:    hidden -> hidden, ReLU, Dropout
/// Lin3:    hidden -> size²  (logits, one per position)
/// ```
#[derive(Module, Debug)]
pub struct MlpNetwork<B: Backend> {
    lin1: Linear<B>,
    lin2: Linear<B>,
    lin3: Linear<B>,
    dropout: Dropout,
    relu: Relu,
    board_size: usize,
    seq_len: usize,
    hidden_dim: usize,
}

#[derive(Config, Debug)]
pub struct MlpNetworkConfig {
    pub board_size: usize,
    #[config(default = 1)]
    pub seq_len: usize,
    #[config(default = 128)]
    pub hidden_dim: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl MlpNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MlpNetwork<B> {
        let cells = self.board_size * self.board_size;
        MlpNetwork {
            lin1: LinearConfig::new(self.seq_len * cells, self.hidden_dim).init(device),
            lin2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            lin3: LinearConfig::new(self.hidden_dim, cells).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            relu: Relu::new(),
            board_size: self.board_size,
            seq_len: self.seq_len,
            hidden_dim: self.hidden_dim,
        }
    }
}

impl<B: Backend> MlpNetwork<B> {
    /// Forward pass: `[batch, seq, size, size]` -> `[batch, size²]` logits.
    pub fn forward(&self, boards: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = boards.flatten::<2>(1, 3);
        let x = self.dropout.forward(self.relu.forward(self.lin1.forward(x)));
        let x = self.dropout.forward(self.relu.forward(self.lin2.forward(x)));
        self.lin3.forward(x)
    }

    pub fn config(&self) -> MlpNetworkConfig {
        MlpNetworkConfig::new(self.board_size)
            .with_seq_len(self.seq_len)
            .with_hidden_dim(self.hidden_dim)
            .with_dropout(self.dropout.prob)
    }
}
