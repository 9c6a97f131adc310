//! Kanban lanes.
//!
//! Each column maps to exactly one status. Grouping places a task in the
//! lane for its status, and tasks whose status has no lane (or is not a
//! known status at all) are collected as unplaced.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::config::ColumnConfig;
use crate::model::status::{Status, Vocab, VocabError};
use crate::model::task::{Task, TaskId};

/// Pseudo-column holding tasks whose status has no lane
pub const UNPLACED: &str = "unplaced";

/// Kanban column identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        ColumnId(id.into())
    }

    pub fn unplaced() -> Self {
        ColumnId(UNPLACED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        ColumnId::new(id)
    }
}

/// A position on the board: lane plus index within the lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub column: ColumnId,
    pub index: usize,
}

impl Location {
    pub fn new(column: impl Into<ColumnId>, index: usize) -> Self {
        Location {
            column: column.into(),
            index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub status: Status,
}

/// Error type for column bindings
#[derive(Debug, thiserror::Error)]
pub enum ColumnError {
    #[error("a board needs at least one column")]
    Empty,
    #[error("column id {0:?} is reserved")]
    ReservedId(String),
    #[error("duplicate column id: {0}")]
    DuplicateId(String),
    #[error("status {status} is bound to both {first} and {second}")]
    DuplicateStatus {
        status: Status,
        first: String,
        second: String,
    },
    #[error("column {column}: {source}")]
    BadStatus { column: String, source: VocabError },
}

/// The board's lanes, each bound one-to-one to a status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: Vec<Column>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap::kanban()
    }
}

/// Tasks split into lanes, in column order
#[derive(Debug)]
pub struct BoardColumns<'a> {
    pub lanes: IndexMap<ColumnId, Vec<&'a Task>>,
    /// Tasks with no lane: unbound or unrecognized status
    pub unplaced: Vec<&'a Task>,
}

impl ColumnMap {
    /// The standard `todo` / `inprogress` / `done` lanes
    pub fn kanban() -> Self {
        let lane = |id: &str, title: &str, status| Column {
            id: ColumnId::new(id),
            title: title.to_string(),
            status,
        };
        ColumnMap {
            columns: vec![
                lane("todo", "To Do", Status::Todo),
                lane("inprogress", "In Progress", Status::InProgress),
                lane("done", "Done", Status::Done),
            ],
        }
    }

    pub fn from_config(configs: &[ColumnConfig]) -> Result<Self, ColumnError> {
        if configs.is_empty() {
            return Err(ColumnError::Empty);
        }
        let mut ids = HashSet::new();
        let mut columns: Vec<Column> = Vec::with_capacity(configs.len());
        for cfg in configs {
            if cfg.id == UNPLACED {
                return Err(ColumnError::ReservedId(cfg.id.clone()));
            }
            if !ids.insert(cfg.id.as_str()) {
                return Err(ColumnError::DuplicateId(cfg.id.clone()));
            }
            let status = Status::parse_any(&cfg.status).map_err(|source| ColumnError::BadStatus {
                column: cfg.id.clone(),
                source,
            })?;
            if let Some(existing) = columns.iter().find(|c| c.status == status) {
                return Err(ColumnError::DuplicateStatus {
                    status,
                    first: existing.id.to_string(),
                    second: cfg.id.clone(),
                });
            }
            columns.push(Column {
                id: ColumnId::new(cfg.id.clone()),
                title: cfg.title.clone(),
                status,
            });
        }
        Ok(ColumnMap { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn get(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == *id)
    }

    /// Status bound to a lane
    pub fn status_for(&self, id: &ColumnId) -> Option<Status> {
        self.get(id).map(|c| c.status)
    }

    /// Lane bound to a status
    pub fn column_for(&self, status: Status) -> Option<&Column> {
        self.columns.iter().find(|c| c.status == status)
    }

    /// The lane a task is shown in, if any
    pub fn column_of(&self, task: &Task) -> Option<&Column> {
        task.status.known().and_then(|s| self.column_for(s))
    }

    pub fn group<'a, I>(&self, tasks: I) -> BoardColumns<'a>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut lanes: IndexMap<ColumnId, Vec<&'a Task>> = self
            .columns
            .iter()
            .map(|c| (c.id.clone(), Vec::new()))
            .collect();
        let mut unplaced = Vec::new();
        for task in tasks {
            match self.column_of(task).and_then(|c| lanes.get_mut(&c.id)) {
                Some(lane) => lane.push(task),
                None => unplaced.push(task),
            }
        }
        BoardColumns { lanes, unplaced }
    }

    /// Where a task currently sits when `tasks` is laid out as a board.
    pub fn locate(&self, tasks: &[Task], id: TaskId) -> Option<Location> {
        let board = self.group(tasks);
        for (column, lane) in &board.lanes {
            if let Some(index) = lane.iter().position(|t| t.id == id) {
                return Some(Location::new(column.clone(), index));
            }
        }
        board
            .unplaced
            .iter()
            .position(|t| t.id == id)
            .map(|index| Location::new(ColumnId::unplaced(), index))
    }
}
