use crate::error::DataError;
use crate::game::{num_classes, BoardState};

/// One training example: a history of boards and the distribution over the
/// position that was played next.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    boards: Vec<BoardState>,
    target: Vec<f32>,
}

impl Sample {
    /// Build a sample from a board history (oldest first) and a target
    /// distribution over `board_size²` positions.
    pub fn new(boards: Vec<BoardState>, target: Vec<f32>) -> Result<Self, DataError> {
        let size = match boards.first() {
            Some(first) => first.size(),
            None => return Err(DataError::EmptySequence),
        };
        if let Some(other) = boards.iter().map(BoardState::size).find(|&s| s != size) {
            return Err(DataError::MixedBoardSizes { first: size, other });
        }
        let expected = num_classes(size);
        if target.len() != expected {
            return Err(DataError::TargetLength {
                expected,
                got: target.len(),
            });
        }
        Ok(Sample { boards, target })
    }

    /// Build a sample whose target is the one-hot encoding of `class`.
    pub fn with_move(boards: Vec<BoardState>, class: usize) -> Result<Self, DataError> {
        let size = boards.first().map(BoardState::size).ok_or(DataError::EmptySequence)?;
        let classes = num_classes(size);
        if class >= classes {
            return Err(DataError::ClassOutOfRange { class, classes });
        }
        let mut target = vec![0.0; classes];
        target[class] = 1.0;
        Self::new(boards, target)
    }

    pub fn boards(&self) -> &[BoardState] {
        &self.boards
    }

    pub fn target(&self) -> &[f32] {
        &self.target
    }

    pub fn board_size(&self) -> usize {
        self.boards[0].size()
    }

    /// Number of boards in the history.
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Arg-max of the target distribution.
    pub fn target_class(&self) -> usize {
        argmax(&self.target)
    }
}

/// Host-side batch: flat board values `[N, seq_len, size, size]`, flat targets
/// `[N, size²]` and the unpadded history length of each sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    boards: Vec<f32>,
    targets: Vec<f32>,
    lengths: Vec<usize>,
    board_size: usize,
    seq_len: usize,
}

impl Batch {
    /// Collate samples into a batch. Histories longer than `seq_len` keep the
    /// most recent boards; shorter ones are left-padded with empty boards.
    ///
    /// Samples must already match `board_size`; [`crate::data::DataLoader`]
    /// checks this when it is built.
    pub fn from_samples<'a>(
        samples: impl IntoIterator<Item = &'a Sample>,
        board_size: usize,
        seq_len: usize,
    ) -> Self {
        let cells = board_size * board_size;
        let mut boards = Vec::new();
        let mut targets = Vec::new();
        let mut lengths = Vec::new();

        for sample in samples {
            let history = sample.boards();
            let kept = history.len().min(seq_len);
            let padding = seq_len - kept;
            boards.resize(boards.len() + padding * cells, 0.0);
            for board in &history[history.len() - kept..] {
                board.encode_into(&mut boards);
            }
            targets.extend_from_slice(sample.target());
            lengths.push(kept);
        }

        Batch {
            boards,
            targets,
            lengths,
            board_size,
            seq_len,
        }
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn num_classes(&self) -> usize {
        num_classes(self.board_size)
    }

    pub fn boards(&self) -> &[f32] {
        &self.boards
    }

    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Arg-max class of every target row.
    pub fn target_classes(&self) -> Vec<usize> {
        self.targets.chunks(self.num_classes()).map(argmax).collect()
    }
}

/// Index of the largest value; ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
