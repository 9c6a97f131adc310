use std::path::PathBuf;

use super::config::BoardConfig;

/// A board directory located on disk
#[derive(Debug, Clone)]
pub struct Board {
    /// Directory containing `board/`
    pub root: PathBuf,
    /// Path to the `board/` directory
    pub board_dir: PathBuf,
    /// Parsed board.toml
    pub config: BoardConfig,
}
