use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::model::board::Board;
use crate::model::config::BoardConfig;
use crate::ops::columns::{ColumnError, ColumnMap};
use crate::store::{BoardData, StoreError};

pub const BOARD_DIR: &str = "board";
pub const CONFIG_FILE: &str = "board.toml";
pub const DATA_FILE: &str = "data.json";

/// Error type for locating and loading a board
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("not a task board: no board/ directory found")]
    NotABoard,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse board.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("invalid columns in board.toml: {0}")]
    Columns(#[from] ColumnError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Walk up from `start` looking for a `board/` directory with a board.toml.
pub fn discover_board(start: &Path) -> Result<PathBuf, BoardError> {
    let mut current = start.to_path_buf();
    loop {
        let board_dir = current.join(BOARD_DIR);
        if board_dir.is_dir() && board_dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(BoardError::NotABoard);
        }
    }
}

/// Load the board rooted at `root` and check its column bindings.
pub fn load_board(root: &Path) -> Result<(Board, ColumnMap), BoardError> {
    let board_dir = root.join(BOARD_DIR);
    if !board_dir.is_dir() {
        return Err(BoardError::NotABoard);
    }
    let config = read_config(&board_dir)?;
    let columns = ColumnMap::from_config(&config.columns)?;
    let board = Board {
        root: root.to_path_buf(),
        board_dir,
        config,
    };
    Ok((board, columns))
}

pub fn read_config(board_dir: &Path) -> Result<BoardConfig, BoardError> {
    let path = board_dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|source| BoardError::ReadError {
        path: path.clone(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Parse data.json contents. Blank text is an empty board.
pub fn parse_data(text: &str) -> Result<BoardData, StoreError> {
    if text.trim().is_empty() {
        return Ok(BoardData::default());
    }
    Ok(serde_json::from_str(text)?)
}

/// Read data.json; a missing file is an empty board.
pub fn read_data(board_dir: &Path) -> Result<BoardData, StoreError> {
    let path = board_dir.join(DATA_FILE);
    match fs::read_to_string(&path) {
        Ok(text) => parse_data(&text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BoardData::default()),
        Err(source) => Err(StoreError::Io { path, source }),
    }
}

/// Replace data.json atomically: write a sibling temp file, then rename it.
pub fn write_data(board_dir: &Path, data: &BoardData) -> Result<(), StoreError> {
    let path = board_dir.join(DATA_FILE);
    let io_err = |source| StoreError::Io {
        path: path.clone(),
        source,
    };
    let mut json = serde_json::to_string_pretty(data)?;
    json.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(board_dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.persist(&path).map_err(|e| io_err(e.error))?;
    Ok(())
}
