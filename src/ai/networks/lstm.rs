use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig};
use burn::prelude::*;

/// Recurrent network over the board history.
///
/// ```text
/// Input:   [batch, seq, size, size] -> [batch, seq, size²]
/// LSTM:    size² -> hidden
/// Concat:  final hidden state ++ final cell state = 2 * hidden
/// Dropout
/// Output:  2 * hidden -> size²  (logits, one per position)
/// ```
#[derive(Module, Debug)]
pub struct LstmNetwork<B: Backend> {
    lstm: Lstm<B>,
    hidden2output: Linear<B>,
    dropout: Dropout,
    board_size: usize,
    hidden_dim: usize,
}

#[derive(Config, Debug)]
pub struct LstmNetworkConfig {
    pub board_size: usize,
    #[config(default = 128)]
    pub hidden_dim: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl LstmNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmNetwork<B> {
        let cells = self.board_size * self.board_size;
        LstmNetwork {
            lstm: LstmConfig::new(cells, self.hidden_dim, true).init(device),
            hidden2output: LinearConfig::new(self.hidden_dim * 2, cells).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            board_size: self.board_size,
            hidden_dim: self.hidden_dim,
        }
    }
}

impl<B: Backend> LstmNetwork<B> {
    /// Forward pass: `[batch, seq, size, size]` -> `[batch, size²]` logits.
    pub fn forward(&self, boards: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, seq_len, _, _] = boards.dims();
        let cells = self.board_size * self.board_size;

        let x = boards.reshape([batch_size, seq_len, cells]);
        let (_, state) = self.lstm.forward(x, None);
        let x = Tensor::cat(vec![state.hidden, state.cell], 1);
        self.hidden2output.forward(self.dropout.forward(x))
    }

    pub fn config(&self) -> LstmNetworkConfig {
        LstmNetworkConfig::new(self.board_size)
            .with_hidden_dim(self.hidden_dim)
            .with_dropout(self.dropout.prob)
    }
}
