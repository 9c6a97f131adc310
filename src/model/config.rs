use serde::{Deserialize, Serialize};

/// Configuration from board.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub board: BoardInfo,
    #[serde(default = "default_columns")]
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardInfo {
    pub name: String,
}

/// A kanban lane. `status` may be written in any status vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: String,
    pub title: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Default: see src/cli/handlers/init.rs template
    #[serde(default = "default_column_width")]
    pub column_width: usize,
    /// Default: see src/cli/handlers/init.rs template
    #[serde(default = "default_true")]
    pub show_unplaced: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            column_width: default_column_width(),
            show_unplaced: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_column_width() -> usize {
    28
}

/// The three kanban lanes used when board.toml lists none
pub fn default_columns() -> Vec<ColumnConfig> {
    [("todo", "To Do"), ("inprogress", "In Progress"), ("done", "Done")]
        .into_iter()
        .map(|(id, title)| ColumnConfig {
            id: id.to_string(),
            title: title.to_string(),
            status: id.to_string(),
        })
        .collect()
}
