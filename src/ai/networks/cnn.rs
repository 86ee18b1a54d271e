use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Smallest board the two conv/pool stages can handle.
pub const MIN_CNN_BOARD_SIZE: usize = 5;

/// Convolutional network over the most recent board.
///
/// ```text
/// Input:   [batch, seq, size, size] -> last board [batch, 1, size, size]
/// Conv1:   1 -> 32 channels, 2x2 kernel   => size - 1
/// Pool1:   2x2 max, stride 1              => size - 2
/// Conv2:   32 -> 64 channels, 2x2 kernel  => size - 3
/// Pool2:   2x2 max, stride 1              => size - 4
/// Flatten: 64 * (size - 4)²  (1024 for an 8x8 board), ReLU, Dropout
/// FC:      -> size²  (logits, one per position)
/// ```
#[derive(Module, Debug)]
pub struct CnnNetwork<B: Backend> {
    conv1: Conv2d<B>,
    pool1: MaxPool2d,
    conv2: Conv2d<B>,
    pool2: MaxPool2d,
    fc: Linear<B>,
    dropout: Dropout,
    relu: Relu,
    board_size: usize,
}

#[derive(Config, Debug)]
pub struct CnnNetworkConfig {
    pub board_size: usize,
    #[config(default = 0.1)]
    pub dropout: f64,
}

impl CnnNetworkConfig {
    /// Width of the flattened feature map fed to the output layer.
    pub fn flattened_dim(&self) -> usize {
        let side = self.board_size.saturating_sub(4);
        64 * side * side
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> CnnNetwork<B> {
        CnnNetwork {
            conv1: Conv2dConfig::new([1, 32], [2, 2]).init(device),
            pool1: MaxPool2dConfig::new([2, 2]).with_strides([1, 1]).init(),
            conv2: Conv2dConfig::new([32, 64], [2, 2]).init(device),
            pool2: MaxPool2dConfig::new([2, 2]).with_strides([1, 1]).init(),
            fc: LinearConfig::new(self.flattened_dim(), self.board_size * self.board_size)
                .init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            relu: Relu::new(),
            board_size: self.board_size,
        }
    }
}

impl<B: Backend> CnnNetwork<B> {
    /// Forward pass: `[batch, seq, size, size]` -> `[batch, size²]` logits.
    pub fn forward(&self, boards: Tensor<B, 4>) -> Tensor<B, 2> {
        let [_, seq_len, _, _] = boards.dims();

        let x = boards.narrow(1, seq_len - 1, 1);
        let x = self.pool1.forward(self.conv1.forward(x));
        let x = self.pool2.forward(self.conv2.forward(x));
        let x = self.relu.forward(x.flatten::<2>(1, 3));
        self.fc.forward(self.dropout.forward(x))
    }

    pub fn config(&self) -> CnnNetworkConfig {
        CnnNetworkConfig::new(self.board_size).with_dropout(self.dropout.prob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_flattened_dim_for_othello() {
        assert_eq!(CnnNetworkConfig::new(8).flattened_dim(), 1024);
        assert_eq!(CnnNetworkConfig::new(MIN_CNN_BOARD_SIZE).flattened_dim(), 64);
    }

    #[test]
    fn test_network_output_shape() {
        let device = Default::default();
        let network = CnnNetworkConfig::new(8).init::<TestBackend>(&device);

        let input = Tensor::zeros([4, 1, 8, 8], &device);
        let output = network.forward(input);
        assert_eq!(output.dims(), [4, 64]);
    }

    #[test]
    fn test_network_uses_last_board_of_history() {
        let device = Default::default();
        let network = CnnNetworkConfig::new(8).init::<TestBackend>(&device);

        let input = Tensor::zeros([2, 3, 8, 8], &device);
        let output = network.forward(input);
        assert_eq!(output.dims(), [2, 64]);
    }
}
