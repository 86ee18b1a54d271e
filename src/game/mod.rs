//! Board representation shared by the data pipeline and the networks. Game
//! legality is not modelled here; boards are plain grid snapshots.

mod board;

pub use board::{
    class_position, num_classes, position_class, BoardState, Cell, DEFAULT_BOARD_SIZE,
};
