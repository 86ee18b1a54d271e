use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::data::sample::Sample;
use crate::error::DataError;
use crate::game::BoardState;

/// One line of a sample file.
#[derive(Debug, Deserialize)]
struct RawSample {
    boards: Vec<Vec<i8>>,
    #[serde(default, rename = "move")]
    next_move: Option<usize>,
    #[serde(default)]
    target: Option<Vec<f32>>,
}

/// Read samples from a JSON-lines file.
///
/// Each non-blank line is an object with `boards` (oldest first, row-major
/// cell values) and either `move` (position class) or `target` (distribution).
pub fn read_samples(path: &Path, board_size: usize) -> Result<Vec<Sample>, DataError> {
    let content = fs::read_to_string(path).map_err(|e| DataError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_samples(&content, path, board_size)
}

fn parse_samples(content: &str, path: &Path, board_size: usize) -> Result<Vec<Sample>, DataError> {
    let mut samples = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        let raw: RawSample = serde_json::from_str(line).map_err(|e| DataError::Parse {
            path: path.to_path_buf(),
            line: line_no,
            source: e,
        })?;
        let boards = raw
            .boards
            .iter()
            .map(|values| BoardState::from_values(board_size, values))
            .collect::<Result<Vec<_>, _>>()?;
        let sample = match (raw.target, raw.next_move) {
            (Some(target), _) => Sample::new(boards, target)?,
            (None, Some(class)) => Sample::with_move(boards, class)?,
            (None, None) => {
                return Err(DataError::MissingTarget {
                    path: path.to_path_buf(),
                    line: line_no,
                })
            }
        };
        samples.push(sample);
    }
    Ok(samples)
}
