use serde::Serialize;

use crate::model::activity::ActivityEntry;
use crate::model::catalog::{Catalog, Project};
use crate::model::status::{Priority, Vocab, Vocabulary};
use crate::model::task::Task;
use crate::ops::columns::{BoardColumns, ColumnMap};
use crate::ops::filter::{BoardView, Dimension};
use crate::ops::search::SearchStatus;
use crate::ops::session::{Notice, NoticeLevel};
use crate::util::unicode::{display_width, fit_to_width, single_line};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: u64,
    pub title: String,
    /// List-view label (Open, InProgress, Blocked, Closed)
    pub status: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub progress: u8,
}

#[derive(Serialize)]
pub struct ListJson {
    pub tasks: Vec<TaskJson>,
    pub filters: FiltersJson,
    pub search: SearchStatus,
}

#[derive(Serialize)]
pub struct FiltersJson {
    pub set: Vec<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

#[derive(Serialize)]
pub struct LaneJson {
    pub id: String,
    pub title: String,
    /// Kanban label of the lane's status
    pub status: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct BoardJson {
    pub lanes: Vec<LaneJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unplaced: Vec<TaskJson>,
    pub search: SearchStatus,
}

#[derive(Serialize)]
pub struct OptionsJson {
    pub projects: Vec<Project>,
    pub assignees: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, catalog: &Catalog) -> TaskJson {
    TaskJson {
        id: task.id.0,
        title: task.title.clone(),
        status: task.status.label(Vocabulary::List).to_string(),
        priority: task.priority.label(Vocabulary::List).to_string(),
        description: task.description.clone(),
        project_id: task.project_id.map(|p| p.0),
        client_id: catalog.client_of(task).map(|c| c.0),
        assignee: task.assignee_name().map(str::to_string),
        due_date: task.due_date.map(|d| d.to_string()),
        progress: task.progress,
    }
}

pub fn view_to_json(view: &BoardView, catalog: &Catalog) -> ListJson {
    let state = &view.dimension_state;
    ListJson {
        tasks: view
            .filtered_tasks
            .iter()
            .map(|t| task_to_json(t, catalog))
            .collect(),
        filters: FiltersJson {
            set: state.set_dimensions(),
            client: state.client().map(|c| c.0),
            project: state.project().map(|p| p.0),
            status: state.status().map(|s| s.to_string()),
            priority: state.priority().map(|p| p.to_string()),
            assignee: state.assignee().map(str::to_string),
        },
        search: view.search.clone(),
    }
}

pub fn board_to_json(
    columns: &ColumnMap,
    lanes: &BoardColumns<'_>,
    search: &SearchStatus,
    catalog: &Catalog,
) -> BoardJson {
    let lanes_json = columns
        .columns()
        .iter()
        .map(|column| LaneJson {
            id: column.id.to_string(),
            title: column.title.clone(),
            status: column
                .status
                .encode(Vocabulary::Kanban)
                .unwrap_or_else(|| column.status.canonical())
                .to_string(),
            tasks: lanes
                .lanes
                .get(&column.id)
                .map(|tasks| tasks.iter().map(|t| task_to_json(t, catalog)).collect())
                .unwrap_or_default(),
        })
        .collect();
    BoardJson {
        lanes: lanes_json,
        unplaced: lanes
            .unplaced
            .iter()
            .map(|t| task_to_json(t, catalog))
            .collect(),
        search: search.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task, catalog: &Catalog) -> String {
    let mut line = format!(
        "#{} [{}] {}",
        task.id,
        task.status.label(Vocabulary::List),
        task.title
    );
    if let Some(project) = catalog.project_of(task) {
        line.push_str(&format!("  ({})", project.name));
    }
    if let Some(assignee) = task.assignee_name() {
        line.push_str(&format!("  @{}", assignee));
    }
    if !task.priority.is(Priority::Medium) {
        line.push_str(&format!("  !{}", task.priority.label(Vocabulary::Canonical)));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due));
    }
    line
}

/// One line describing the active filters and query, or None when nothing narrows the view
pub fn format_view_header(view: &BoardView, catalog: &Catalog) -> Option<String> {
    let state = &view.dimension_state;
    let mut parts = Vec::new();
    if let Some(id) = state.client() {
        let name = catalog.client(id).map(|c| c.name.as_str()).unwrap_or("?");
        parts.push(format!("client={}", name));
    }
    if let Some(id) = state.project() {
        let name = catalog.project(id).map(|p| p.name.as_str()).unwrap_or("?");
        parts.push(format!("project={}", name));
    }
    if let Some(status) = state.status() {
        parts.push(format!("status={}", status));
    }
    if let Some(priority) = state.priority() {
        parts.push(format!("priority={}", priority));
    }
    if let Some(assignee) = state.assignee() {
        parts.push(format!("assignee={}", assignee));
    }
    match &view.search {
        SearchStatus::Inactive => {}
        SearchStatus::Pending { query } => parts.push(format!("search \"{}\" pending", query)),
        SearchStatus::Ready { query, matched } => {
            parts.push(format!("search \"{}\" ({} matched)", query, matched))
        }
        SearchStatus::Failed { query, .. } => parts.push(format!("search \"{}\" failed", query)),
    }
    if parts.is_empty() {
        None
    } else {
        Some(format!("-- {} --", parts.join(", ")))
    }
}

/// Lay lanes out side by side, one task per row
pub fn render_board(
    columns: &ColumnMap,
    lanes: &BoardColumns<'_>,
    width: usize,
    show_unplaced: bool,
) -> Vec<String> {
    let width = width.max(8);
    let gap = "  ";
    let mut lines = Vec::new();

    let lane_tasks: Vec<&[&Task]> = columns
        .columns()
        .iter()
        .map(|c| lanes.lanes.get(&c.id).map(Vec::as_slice).unwrap_or(&[]))
        .collect();

    let header: Vec<String> = columns
        .columns()
        .iter()
        .zip(&lane_tasks)
        .map(|(c, tasks)| fit_to_width(&format!("{} ({})", c.title, tasks.len()), width))
        .collect();
    lines.push(header.join(gap).trim_end().to_string());
    let rule: Vec<String> = lane_tasks.iter().map(|_| "─".repeat(width)).collect();
    lines.push(rule.join(gap));

    let rows = lane_tasks.iter().map(|t| t.len()).max().unwrap_or(0);
    for row in 0..rows {
        let cells: Vec<String> = lane_tasks
            .iter()
            .map(|tasks| match tasks.get(row) {
                Some(task) => fit_to_width(&board_cell(task), width),
                None => " ".repeat(width),
            })
            .collect();
        lines.push(cells.join(gap).trim_end().to_string());
    }

    if show_unplaced && !lanes.unplaced.is_empty() {
        lines.push(String::new());
        lines.push(format!("-- Unplaced ({}) --", lanes.unplaced.len()));
        for task in &lanes.unplaced {
            lines.push(format!(
                "{}  [{}]",
                board_cell(task),
                task.status.label(Vocabulary::List)
            ));
        }
    }
    lines
}

fn board_cell(task: &Task) -> String {
    format!("#{} {}", task.id, single_line(&task.title))
}

pub fn format_activity_line(entry: &ActivityEntry) -> String {
    let from = entry.from.as_deref().unwrap_or("-");
    let to = entry.to.as_deref().unwrap_or("-");
    format!(
        "{}  #{} {}: {} → {}",
        entry.at.format("%Y-%m-%d %H:%M"),
        entry.task_id,
        entry.field,
        from,
        to
    )
}

pub fn format_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => notice.message.clone(),
        NoticeLevel::Error => format!("error: {}", notice.message),
    }
}

/// Format a two-column table with the first column padded to its widest entry
pub fn format_table(rows: &[(String, String)]) -> Vec<String> {
    let key_width = rows.iter().map(|(k, _)| display_width(k)).max().unwrap_or(0);
    rows.iter()
        .map(|(k, v)| format!("{}  {}", fit_to_width(k, key_width), v))
        .collect()
}
