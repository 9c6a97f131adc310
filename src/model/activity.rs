use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{FieldChange, TaskField, TaskId};

/// One recorded field change, newest entries are appended last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub task_id: TaskId,
    pub field: TaskField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl ActivityEntry {
    pub fn from_change(task_id: TaskId, change: FieldChange, at: DateTime<Utc>) -> Self {
        ActivityEntry {
            at,
            task_id,
            field: change.field,
            from: change.from,
            to: change.to,
        }
    }
}

/// The newest `limit` entries, newest first
pub fn latest(entries: &[ActivityEntry], limit: usize) -> Vec<ActivityEntry> {
    entries.iter().rev().take(limit).cloned().collect()
}
