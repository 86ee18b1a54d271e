mod cnn;
mod lstm;
mod mlp;

pub use cnn::{CnnNetwork, CnnNetworkConfig, MIN_CNN_BOARD_SIZE};
pub use lstm::{LstmNetwork, LstmNetworkConfig};
pub use mlp::{MlpNetwork, MlpNetworkConfig};
