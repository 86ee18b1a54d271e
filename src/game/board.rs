use crate::error::DataError;

/// Default side length of the grid (Othello).
pub const DEFAULT_BOARD_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Black,
    White,
}

impl Cell {
    /// Numeric value fed to the networks.
    pub fn value(self) -> f32 {
        match self {
            Cell::Empty => 0.0,
            Cell::Black => 1.0,
            Cell::White => -1.0,
        }
    }

    pub fn from_value(value: i64) -> Result<Self, DataError> {
        match value {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::Black),
            -1 => Ok(Cell::White),
            other => Err(DataError::CellValue(other)),
        }
    }
}

/// A square grid snapshot. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    size: usize,
    cells: Vec<Cell>,
}

impl BoardState {
    /// Create an empty board of the given side length.
    pub fn empty(size: usize) -> Self {
        BoardState {
            size,
            cells: vec![Cell::Empty; size * size],
        }
    }

    /// Build a board from row-major cell values (`0` empty, `1` black, `-1` white).
    pub fn from_values(size: usize, values: &[i8]) -> Result<Self, DataError> {
        let expected = size * size;
        if values.len() != expected {
            return Err(DataError::BoardSize {
                size,
                expected,
                got: values.len(),
            });
        }
        let cells = values
            .iter()
            .map(|&v| Cell::from_value(i64::from(v)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BoardState { size, cells })
    }

    /// Build a board from row-major cells.
    pub fn from_cells(size: usize, cells: Vec<Cell>) -> Result<Self, DataError> {
        let expected = size * size;
        if cells.len() != expected {
            return Err(DataError::BoardSize {
                size,
                expected,
                got: cells.len(),
            });
        }
        Ok(BoardState { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the cell at a specific position. Row 0 is the top.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.size + col]
    }

    /// Return a copy of this board with one cell changed.
    pub fn with_cell(&self, row: usize, col: usize, cell: Cell) -> Self {
        let mut next = self.clone();
        next.cells[row * self.size + col] = cell;
        next
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Append the row-major numeric encoding of this board to `out`.
    pub fn encode_into(&self, out: &mut Vec<f32>) {
        out.extend(self.cells.iter().map(|c| c.value()));
    }
}

/// Number of position classes on a `size`x`size` grid.
pub fn num_classes(size: usize) -> usize {
    size * size
}

/// Class index of the cell at (row, col).
pub fn position_class(row: usize, col: usize, size: usize) -> usize {
    row * size + col
}

/// Inverse of [`position_class`].
pub fn class_position(class: usize, size: usize) -> (usize, usize) {
    (class / size, class % size)
}
