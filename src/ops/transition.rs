//! Status changes driven by kanban drag-and-drop.
//!
//! A drop only changes a task's status when it lands in a different lane.
//! Position within a lane is view state and is never persisted. The engine
//! does not touch local task data: it asks the store for the change and
//! reports which collections must be refetched.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::columns::{ColumnId, ColumnMap, Location};
use crate::model::status::Status;
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::store::{Invalidation, StoreError, TaskStore};

/// What the board reports when a drag ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragResult {
    pub task_id: TaskId,
    pub source: Location,
    /// `None` when the drop was cancelled
    pub destination: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragDecision {
    /// Dropped outside any lane
    Cancelled,
    /// Dropped where it started
    Unchanged,
    /// Moved within its lane
    Reordered,
    /// Moved to another lane
    Move { task_id: TaskId, status: Status },
}

/// Error type for drag completion
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("no column named {0:?} on this board")]
    UnknownColumn(ColumnId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Decide what a drop means without performing it.
pub fn decide(drag: &DragResult, columns: &ColumnMap) -> Result<DragDecision, TransitionError> {
    let Some(destination) = &drag.destination else {
        return Ok(DragDecision::Cancelled);
    };
    if destination.column == drag.source.column {
        return Ok(if destination.index == drag.source.index {
            DragDecision::Unchanged
        } else {
            DragDecision::Reordered
        });
    }
    let status = columns
        .status_for(&destination.column)
        .ok_or_else(|| TransitionError::UnknownColumn(destination.column.clone()))?;
    Ok(DragDecision::Move {
        task_id: drag.task_id,
        status,
    })
}

#[derive(Debug)]
pub enum DragOutcome {
    /// Nothing to persist
    NoChange(DragDecision),
    /// The store accepted the new status
    Moved { task: Task, invalidate: Invalidation },
    /// The move was rejected; the view must be resynced from the store
    Failed {
        task_id: TaskId,
        error: TransitionError,
        invalidate: Invalidation,
    },
}

impl DragOutcome {
    pub fn invalidation(&self) -> Invalidation {
        match self {
            DragOutcome::NoChange(_) => Invalidation::NONE,
            DragOutcome::Moved { invalidate, .. } | DragOutcome::Failed { invalidate, .. } => {
                *invalidate
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DragOutcome::Failed { .. })
    }
}

/// Complete a drop: at most one status update, keyed by the dragged task.
///
/// Takes the store by shared reference, so drops of different tasks can be
/// awaited concurrently.
pub async fn complete_drag<S>(store: &S, columns: &ColumnMap, drag: &DragResult) -> DragOutcome
where
    S: TaskStore + ?Sized,
{
    let decision = match decide(drag, columns) {
        Ok(decision) => decision,
        Err(error) => {
            warn!(task = %drag.task_id, %error, "drop rejected");
            return DragOutcome::Failed {
                task_id: drag.task_id,
                error,
                invalidate: Invalidation::TASKS,
            };
        }
    };

    let (task_id, status) = match decision {
        DragDecision::Move { task_id, status } => (task_id, status),
        other => {
            debug!(task = %drag.task_id, decision = ?other, "drop needs no update");
            return DragOutcome::NoChange(other);
        }
    };

    match store.update_task_field(task_id, TaskPatch::status(status)).await {
        Ok(task) => {
            info!(task = %task_id, %status, "task moved");
            DragOutcome::Moved {
                task,
                invalidate: Invalidation::TASKS,
            }
        }
        Err(err) => {
            warn!(task = %task_id, error = %err, "status update failed");
            DragOutcome::Failed {
                task_id,
                error: err.into(),
                invalidate: Invalidation::TASKS,
            }
        }
    }
}
