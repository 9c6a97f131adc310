//! Free-text search over tasks.
//!
//! Queries run against the store and may complete out of order. Each query
//! gets a ticket, and only the ticket for the most recently issued query may
//! land its results. While a search is active the board shows the
//! intersection of its matches with the filtered set.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use crate::model::task::{Task, TaskId};
use crate::store::StoreError;

/// Which text field of a task matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Title,
    Description,
    Assignee,
}

/// A free-text query: case-insensitive literal match
#[derive(Debug, Clone)]
pub struct TextQuery {
    re: Regex,
}

impl TextQuery {
    /// `None` for a blank query
    pub fn new(query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .ok()
            .map(|re| TextQuery { re })
    }

    /// Fields of `task` containing the query
    pub fn match_fields(&self, task: &Task) -> Vec<MatchField> {
        let mut fields = Vec::new();
        if self.re.is_match(&task.title) {
            fields.push(MatchField::Title);
        }
        if let Some(description) = &task.description
            && self.re.is_match(description)
        {
            fields.push(MatchField::Description);
        }
        if let Some(assignee) = task.assignee_name()
            && self.re.is_match(assignee)
        {
            fields.push(MatchField::Assignee);
        }
        fields
    }

    pub fn matches(&self, task: &Task) -> bool {
        !self.match_fields(task).is_empty()
    }
}

// ---------------------------------------------------------------------------
// Last-issued-query-wins tracking
// ---------------------------------------------------------------------------

/// Handle for one issued search; only the newest ticket may land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    /// No query: filters apply to the full collection
    Inactive,
    Pending {
        query: String,
    },
    /// Matching task ids, resolved against the current collection on use
    Ready {
        query: String,
        ids: Vec<TaskId>,
    },
    Failed {
        query: String,
        message: String,
    },
}

/// Serializable summary of the search state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SearchStatus {
    Inactive,
    Pending { query: String },
    Ready { query: String, matched: usize },
    Failed { query: String, message: String },
}

impl SearchState {
    pub fn query(&self) -> Option<&str> {
        match self {
            SearchState::Inactive => None,
            SearchState::Pending { query }
            | SearchState::Ready { query, .. }
            | SearchState::Failed { query, .. } => Some(query),
        }
    }

    /// The task set filters run over.
    ///
    /// The full collection without a query, the matches once results are in,
    /// and nothing while a query is in flight or has failed.
    pub fn source<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        match self {
            SearchState::Inactive => tasks.iter().collect(),
            SearchState::Ready { ids, .. } => {
                let ids: HashSet<TaskId> = ids.iter().copied().collect();
                tasks.iter().filter(|t| ids.contains(&t.id)).collect()
            }
            SearchState::Pending { .. } | SearchState::Failed { .. } => Vec::new(),
        }
    }

    pub fn status(&self) -> SearchStatus {
        match self {
            SearchState::Inactive => SearchStatus::Inactive,
            SearchState::Pending { query } => SearchStatus::Pending {
                query: query.clone(),
            },
            SearchState::Ready { query, ids } => SearchStatus::Ready {
                query: query.clone(),
                matched: ids.len(),
            },
            SearchState::Failed { query, message } => SearchStatus::Failed {
                query: query.clone(),
                message: message.clone(),
            },
        }
    }
}

/// Tracks the current query and discards responses to superseded ones.
#[derive(Debug, Clone)]
pub struct SearchTracker {
    generation: u64,
    state: SearchState,
}

impl Default for SearchTracker {
    fn default() -> Self {
        SearchTracker {
            generation: 0,
            state: SearchState::Inactive,
        }
    }
}

impl SearchTracker {
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Start a new query. A blank query deactivates search and returns `None`.
    ///
    /// Either way every earlier ticket becomes stale.
    pub fn begin(&mut self, query: &str) -> Option<SearchTicket> {
        self.generation += 1;
        let query = query.trim();
        if query.is_empty() {
            self.state = SearchState::Inactive;
            return None;
        }
        self.state = SearchState::Pending {
            query: query.to_string(),
        };
        Some(SearchTicket {
            generation: self.generation,
            query: query.to_string(),
        })
    }

    /// Land a response. Returns false, changing nothing, if `ticket` is stale.
    pub fn complete(&mut self, ticket: SearchTicket, result: Result<Vec<Task>, StoreError>) -> bool {
        if ticket.generation != self.generation {
            debug!(query = %ticket.query, "discarding stale search response");
            return false;
        }
        self.state = match result {
            Ok(tasks) => SearchState::Ready {
                query: ticket.query,
                ids: tasks.iter().map(|t| t.id).collect(),
            },
            Err(err) => SearchState::Failed {
                query: ticket.query,
                message: err.to_string(),
            },
        };
        true
    }
}
