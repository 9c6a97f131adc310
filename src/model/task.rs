use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::ProjectId;
use super::status::{Priority, Recognized, Status, Vocabulary};

/// Stable task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Board status; may hold a value outside the vocabulary
    pub status: Recognized<Status>,
    #[serde(default = "default_priority")]
    pub priority: Recognized<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Free-text assignee name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Completion percentage, 0..=100
    #[serde(default)]
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}

fn default_priority() -> Recognized<Priority> {
    Recognized::Known(Priority::Medium)
}

impl Task {
    /// Create a todo task with medium priority and no project
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Task {
            id,
            title: title.into(),
            description: None,
            status: Recognized::Known(Status::Todo),
            priority: default_priority(),
            project_id: None,
            assignee: None,
            due_date: None,
            progress: 0,
            created_at: Utc::now(),
        }
    }

    /// Assignee name, ignoring blank values
    pub fn assignee_name(&self) -> Option<&str> {
        self.assignee
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Fields for a task about to be created
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub project_id: Option<ProjectId>,
    pub assignee: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// A partial update of a task.
///
/// `None` leaves a field alone. For optional fields, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<ProjectId>>,
    pub assignee: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub progress: Option<u8>,
}

impl TaskPatch {
    /// A patch touching only the status
    pub fn status(status: Status) -> Self {
        TaskPatch {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// Which task field an activity entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskField {
    Title,
    Description,
    Status,
    Priority,
    Project,
    Assignee,
    DueDate,
    Progress,
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskField::Title => "title",
            TaskField::Description => "description",
            TaskField::Status => "status",
            TaskField::Priority => "priority",
            TaskField::Project => "project",
            TaskField::Assignee => "assignee",
            TaskField::DueDate => "due_date",
            TaskField::Progress => "progress",
        };
        f.write_str(name)
    }
}

/// One effective change made by a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: TaskField,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Task {
    /// Apply `patch` in place and report the fields that actually changed.
    ///
    /// Setting a field to its current value is not a change, so re-applying
    /// the same patch returns an empty list.
    pub fn apply_patch(&mut self, patch: &TaskPatch) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        if let Some(title) = &patch.title
            && *title != self.title
        {
            changes.push(change(TaskField::Title, Some(&self.title), Some(title)));
            self.title = title.clone();
        }
        if let Some(description) = &patch.description
            && *description != self.description
        {
            changes.push(change(
                TaskField::Description,
                self.description.as_ref(),
                description.as_ref(),
            ));
            self.description = description.clone();
        }
        if let Some(status) = patch.status
            && !self.status.is(status)
        {
            let from = self.status.label(Vocabulary::Canonical).to_string();
            changes.push(change(TaskField::Status, Some(&from), Some(&status)));
            self.status = Recognized::Known(status);
        }
        if let Some(priority) = patch.priority
            && !self.priority.is(priority)
        {
            let from = self.priority.label(Vocabulary::Canonical).to_string();
            changes.push(change(TaskField::Priority, Some(&from), Some(&priority)));
            self.priority = Recognized::Known(priority);
        }
        if let Some(project_id) = patch.project_id
            && project_id != self.project_id
        {
            changes.push(change(TaskField::Project, self.project_id.as_ref(), project_id.as_ref()));
            self.project_id = project_id;
        }
        if let Some(assignee) = &patch.assignee
            && *assignee != self.assignee
        {
            changes.push(change(TaskField::Assignee, self.assignee.as_ref(), assignee.as_ref()));
            self.assignee = assignee.clone();
        }
        if let Some(due_date) = patch.due_date
            && due_date != self.due_date
        {
            changes.push(change(TaskField::DueDate, self.due_date.as_ref(), due_date.as_ref()));
            self.due_date = due_date;
        }
        if let Some(progress) = patch.progress
            && progress != self.progress
        {
            changes.push(change(TaskField::Progress, Some(&self.progress), Some(&progress)));
            self.progress = progress;
        }

        changes
    }
}

fn change<A: fmt::Display + ?Sized, B: fmt::Display + ?Sized>(
    field: TaskField,
    from: Option<&A>,
    to: Option<&B>,
) -> FieldChange {
    FieldChange {
        field,
        from: from.map(|v| v.to_string()),
        to: to.map(|v| v.to_string()),
    }
}
