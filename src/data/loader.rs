use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::sample::{Batch, Sample};
use crate::error::DataError;
use crate::game::num_classes;

/// A finite, restartable sequence of batches. Each call to [`batches`]
/// starts a fresh pass over the whole split.
///
/// [`batches`]: BatchSource::batches
pub trait BatchSource {
    /// Start a new pass over the split.
    fn batches(&mut self) -> Box<dyn Iterator<Item = Batch> + '_>;
    /// Number of batches in one pass.
    fn num_batches(&self) -> usize;
    /// Number of samples in one pass.
    fn num_samples(&self) -> usize;
}

/// In-memory batch iterator over a validated list of samples.
pub struct DataLoader {
    samples: Vec<Sample>,
    order: Vec<usize>,
    batch_size: usize,
    board_size: usize,
    seq_len: usize,
    rng: Option<StdRng>,
}

impl DataLoader {
    /// Create a loader. Every sample must be on a `board_size` grid; histories
    /// are fitted to `seq_len` boards when batched.
    pub fn new(
        samples: Vec<Sample>,
        batch_size: usize,
        board_size: usize,
        seq_len: usize,
    ) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::InvalidBatchSize);
        }
        let classes = num_classes(board_size);
        for sample in &samples {
            if sample.board_size() != board_size {
                return Err(DataError::BoardSize {
                    size: board_size,
                    expected: classes,
                    got: num_classes(sample.board_size()),
                });
            }
        }
        let order = (0..samples.len()).collect();
        Ok(DataLoader {
            samples,
            order,
            batch_size,
            board_size,
            seq_len: seq_len.max(1),
            rng: None,
        })
    }

    /// Reshuffle the sample order at the start of every pass.
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }
}

impl BatchSource for DataLoader {
    fn batches(&mut self) -> Box<dyn Iterator<Item = Batch> + '_> {
        if let Some(rng) = self.rng.as_mut() {
            self.order.shuffle(rng);
        }
        let samples = &self.samples;
        let board_size = self.board_size;
        let seq_len = self.seq_len;
        Box::new(self.order.chunks(self.batch_size).map(move |chunk| {
            Batch::from_samples(chunk.iter().map(|&i| &samples[i]), board_size, seq_len)
        }))
    }

    fn num_batches(&self) -> usize {
        self.samples.len().div_ceil(self.batch_size)
    }

    fn num_samples(&self) -> usize {
        self.samples.len()
    }
}
