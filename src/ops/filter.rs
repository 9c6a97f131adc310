//! Cascading filters.
//!
//! Five dimensions narrow the task set. Client, project and assignee form a
//! chain: each one's options depend on the selection above it, and changing
//! an upstream selection clears everything below it. Status and priority are
//! independent.

use std::collections::BTreeSet;

use serde::Serialize;

use super::search::{SearchState, SearchStatus};
use crate::model::catalog::{Catalog, ClientId, Project, ProjectId};
use crate::model::status::{Priority, Status};
use crate::model::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Client,
    Project,
    Status,
    Priority,
    Assignee,
}

/// Error type for selections that skip an upstream dimension
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("select a client before choosing a project")]
    RequiresClient,
    #[error("select a project before choosing an assignee")]
    RequiresProject,
}

/// One user selection. `None` means "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionChange {
    Client(Option<ClientId>),
    Project(Option<ProjectId>),
    Status(Option<Status>),
    Priority(Option<Priority>),
    Assignee(Option<String>),
    ClearAll,
}

/// Map the "all" option (and blank input) to unset.
pub fn parse_selection(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(raw)
    }
}

/// Current selection in every dimension; unset matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    client: Option<ClientId>,
    project: Option<ProjectId>,
    status: Option<Status>,
    priority: Option<Priority>,
    assignee: Option<String>,
}

impl FilterState {
    pub fn client(&self) -> Option<ClientId> {
        self.client
    }

    pub fn project(&self) -> Option<ProjectId> {
        self.project
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }

    /// Always clears project and assignee, even when re-selecting the same client.
    pub fn select_client(&mut self, client: Option<ClientId>) {
        self.client = client;
        self.project = None;
        self.assignee = None;
    }

    pub fn select_project(&mut self, project: Option<ProjectId>) -> Result<(), FilterError> {
        if project.is_some() && self.client.is_none() {
            return Err(FilterError::RequiresClient);
        }
        self.project = project;
        self.assignee = None;
        Ok(())
    }

    pub fn select_status(&mut self, status: Option<Status>) {
        self.status = status;
    }

    pub fn select_priority(&mut self, priority: Option<Priority>) {
        self.priority = priority;
    }

    pub fn select_assignee(&mut self, assignee: Option<String>) -> Result<(), FilterError> {
        let assignee = assignee
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        if assignee.is_some() && self.project.is_none() {
            return Err(FilterError::RequiresProject);
        }
        self.assignee = assignee;
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = FilterState::default();
    }

    /// Apply one selection event. On error the state is unchanged.
    pub fn apply(&mut self, change: DimensionChange) -> Result<(), FilterError> {
        match change {
            DimensionChange::Client(c) => self.select_client(c),
            DimensionChange::Project(p) => self.select_project(p)?,
            DimensionChange::Status(s) => self.select_status(s),
            DimensionChange::Priority(p) => self.select_priority(p),
            DimensionChange::Assignee(a) => self.select_assignee(a)?,
            DimensionChange::ClearAll => self.clear(),
        }
        Ok(())
    }

    /// Dimensions holding a concrete value
    pub fn set_dimensions(&self) -> Vec<Dimension> {
        let mut set = Vec::new();
        if self.client.is_some() {
            set.push(Dimension::Client);
        }
        if self.project.is_some() {
            set.push(Dimension::Project);
        }
        if self.status.is_some() {
            set.push(Dimension::Status);
        }
        if self.priority.is_some() {
            set.push(Dimension::Priority);
        }
        if self.assignee.is_some() {
            set.push(Dimension::Assignee);
        }
        set
    }

    pub fn is_unset(&self) -> bool {
        self.set_dimensions().is_empty()
    }

    /// True when `task` satisfies every set dimension.
    ///
    /// A dangling project reference counts as no project, and unrecognized
    /// status or priority values match no concrete selection.
    pub fn matches(&self, task: &Task, catalog: &Catalog) -> bool {
        if let Some(client) = self.client
            && catalog.client_of(task) != Some(client)
        {
            return false;
        }
        if let Some(project) = self.project
            && catalog.project_of(task).map(|p| p.id) != Some(project)
        {
            return false;
        }
        if let Some(status) = self.status
            && !task.status.is(status)
        {
            return false;
        }
        if let Some(priority) = self.priority
            && !task.priority.is(priority)
        {
            return false;
        }
        if let Some(assignee) = &self.assignee
            && task.assignee_name() != Some(assignee.as_str())
        {
            return false;
        }
        true
    }

    /// Projects selectable under the current client
    pub fn available_projects(&self, catalog: &Catalog) -> Vec<Project> {
        match self.client {
            Some(client) => catalog.projects_of(client).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Distinct assignees among all tasks of the selected project, sorted
    pub fn available_assignees(&self, tasks: &[Task]) -> Vec<String> {
        let (Some(_), Some(project)) = (self.client, self.project) else {
            return Vec::new();
        };
        tasks
            .iter()
            .filter(|t| t.project_id == Some(project))
            .filter_map(|t| t.assignee_name())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Everything a view is derived from
#[derive(Debug, Clone, Copy)]
pub struct ViewInputs<'a> {
    /// The full task collection
    pub tasks: &'a [Task],
    pub catalog: &'a Catalog,
    pub search: &'a SearchState,
}

/// Derived state handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub filtered_tasks: Vec<Task>,
    pub available_projects: Vec<Project>,
    pub available_assignees: Vec<String>,
    pub dimension_state: FilterState,
    pub search: SearchStatus,
}

/// Recompute the whole view from the current inputs.
///
/// Filters run over the search source (see [`SearchState::source`]) with the
/// same predicate whether or not a query is active, so search and filters
/// intersect.
pub fn derive_view(state: &FilterState, inputs: ViewInputs<'_>) -> BoardView {
    let filtered_tasks = inputs
        .search
        .source(inputs.tasks)
        .into_iter()
        .filter(|t| state.matches(t, inputs.catalog))
        .cloned()
        .collect();

    BoardView {
        filtered_tasks,
        available_projects: state.available_projects(inputs.catalog),
        available_assignees: state.available_assignees(inputs.tasks),
        dimension_state: state.clone(),
        search: inputs.search.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::Client;
    use crate::model::status::Recognized;
    use crate::model::task::TaskId;
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Client { id: ClientId(5), name: "Acme".into() },
                Client { id: ClientId(6), name: "Globex".into() },
            ],
            vec![
                Project { id: ProjectId(10), name: "Website".into(), client_id: ClientId(5) },
                Project { id: ProjectId(11), name: "Mobile".into(), client_id: ClientId(5) },
                Project { id: ProjectId(20), name: "Billing".into(), client_id: ClientId(6) },
            ],
        )
    }

    fn task(id: u64, status: &str, project: Option<u64>, assignee: Option<&str>) -> Task {
        let mut t = Task::new(TaskId(id), format!("Task {}", id));
        t.status = Recognized::from_raw(status);
        t.project_id = project.map(ProjectId);
        t.assignee = assignee.map(str::to_string);
        t
    }

    fn tasks() -> Vec<Task> {
        vec![
            task(1, "todo", Some(10), Some("ana")),
            task(2, "done", Some(10), Some("ben")),
            task(3, "todo", Some(11), Some("cy")),
            task(4, "inprogress", Some(20), Some("ana")),
            task(5, "todo", None, None),
            task(6, "todo", Some(99), Some("dee")),
            task(7, "someday", Some(10), Some("")),
        ]
    }

    fn view(state: &FilterState, tasks: &[Task]) -> BoardView {
        derive_view(
            state,
            ViewInputs {
                tasks,
                catalog: &catalog(),
                search: &SearchState::Inactive,
            },
        )
    }

    fn ids(view: &BoardView) -> Vec<u64> {
        view.filtered_tasks.iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn test_unset_state_shows_everything() {
        let tasks = tasks();
        let v = view(&FilterState::default(), &tasks);
        assert_eq!(v.filtered_tasks.len(), tasks.len());
        assert!(v.available_projects.is_empty());
        assert!(v.available_assignees.is_empty());
    }

    #[test]
    fn test_client_then_status() {
        let tasks = vec![task(1, "todo", Some(10), None), task(2, "done", Some(10), None)];
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        state.select_status(Some(Status::Todo));
        assert_eq!(ids(&view(&state, &tasks)), vec![1]);
    }

    #[test]
    fn test_client_filter_excludes_missing_and_dangling_projects() {
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        assert_eq!(ids(&view(&state, &tasks())), vec![1, 2, 3, 7]);
    }

    #[test]
    fn test_available_projects_follow_client() {
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        let v = view(&state, &tasks());
        let projects: Vec<_> = v.available_projects.iter().map(|p| p.id.0).collect();
        assert_eq!(projects, vec![10, 11]);
        assert!(v.available_projects.iter().all(|p| p.client_id == ClientId(5)));
    }

    #[test]
    fn test_available_assignees_are_distinct_and_non_empty() {
        let mut all = tasks();
        all.push(task(8, "todo", Some(10), Some(" ana ")));
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        assert!(view(&state, &all).available_assignees.is_empty());
        state.select_project(Some(ProjectId(10))).unwrap();
        assert_eq!(view(&state, &all).available_assignees, vec!["ana", "ben"]);
    }

    #[test]
    fn test_client_change_resets_downstream() {
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        state.select_project(Some(ProjectId(10))).unwrap();
        state.select_assignee(Some("ana".into())).unwrap();
        state.select_status(Some(Status::Todo));

        state.select_client(Some(ClientId(6)));
        assert_eq!(state.project(), None);
        assert_eq!(state.assignee(), None);
        assert_eq!(state.status(), Some(Status::Todo));
    }

    #[test]
    fn test_project_change_resets_assignee_only() {
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        state.select_project(Some(ProjectId(10))).unwrap();
        state.select_assignee(Some("ana".into())).unwrap();
        state.select_priority(Some(Priority::High));

        state.select_project(Some(ProjectId(11))).unwrap();
        assert_eq!(state.client(), Some(ClientId(5)));
        assert_eq!(state.assignee(), None);
        assert_eq!(state.priority(), Some(Priority::High));
    }

    #[test]
    fn test_independent_dimensions_do_not_reset() {
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        state.select_project(Some(ProjectId(10))).unwrap();
        state.select_assignee(Some("ana".into())).unwrap();
        state.select_status(Some(Status::Done));
        state.select_priority(Some(Priority::Low));
        state.select_assignee(Some("ben".into())).unwrap();
        assert_eq!(
            state.set_dimensions(),
            vec![
                Dimension::Client,
                Dimension::Project,
                Dimension::Status,
                Dimension::Priority,
                Dimension::Assignee
            ]
        );
    }

    #[test]
    fn test_chain_is_enforced() {
        let mut state = FilterState::default();
        assert_eq!(state.select_project(Some(ProjectId(10))), Err(FilterError::RequiresClient));
        state.select_client(Some(ClientId(5)));
        assert_eq!(state.select_assignee(Some("ana".into())), Err(FilterError::RequiresProject));
        assert!(state.select_assignee(Some("  ".into())).is_ok());
        assert_eq!(state.assignee(), None);
    }

    #[test]
    fn test_clear_all() {
        let mut state = FilterState::default();
        state.apply(DimensionChange::Client(Some(ClientId(5)))).unwrap();
        state.apply(DimensionChange::Project(Some(ProjectId(10)))).unwrap();
        state.apply(DimensionChange::Priority(Some(Priority::High))).unwrap();
        state.apply(DimensionChange::ClearAll).unwrap();
        assert!(state.is_unset());
    }

    #[test]
    fn test_unrecognized_status_matches_no_status_filter() {
        let mut state = FilterState::default();
        let tasks = tasks();
        assert!(ids(&view(&state, &tasks)).contains(&7));
        for status in Status::ALL {
            state.select_status(Some(status));
            assert!(!ids(&view(&state, &tasks)).contains(&7));
        }
    }

    #[test]
    fn test_assignee_filter() {
        let mut state = FilterState::default();
        state.select_client(Some(ClientId(5)));
        state.select_project(Some(ProjectId(10))).unwrap();
        state.select_assignee(Some("ben".into())).unwrap();
        assert_eq!(ids(&view(&state, &tasks())), vec![2]);
    }

    #[test]
    fn test_search_and_filter_intersect() {
        let mut t = task(3, "todo", None, None);
        t.priority = Recognized::Known(Priority::Medium);
        let tasks = vec![task(1, "todo", None, None), t];
        let search = SearchState::Ready {
            query: "bug".into(),
            ids: vec![TaskId(3)],
        };
        let mut state = FilterState::default();
        state.select_priority(Some(Priority::High));
        let v = derive_view(
            &state,
            ViewInputs {
                tasks: &tasks,
                catalog: &catalog(),
                search: &search,
            },
        );
        assert!(v.filtered_tasks.is_empty());
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("all"), None);
        assert_eq!(parse_selection("All"), None);
        assert_eq!(parse_selection(" "), None);
        assert_eq!(parse_selection("5"), Some("5"));
    }
}
