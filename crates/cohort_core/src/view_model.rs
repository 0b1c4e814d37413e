use crate::collections::{CollectionId, Group};
use crate::query::{Filters, StatsQuery, StatsSnapshot};
use crate::store::{ProjectId, ProjectMeta};
use crate::tasks::RefreshKey;

/// Read-only snapshot of the session store for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionViewModel<T> {
    pub project: Option<ProjectId>,
    pub active_group: Group,
    pub active_collection: Option<CollectionId>,
    pub search: String,
    pub filters: Filters,
    pub page: u32,
    pub items: Vec<T>,
    pub total_count: u64,
    pub has_more: bool,
    pub initial_loaded: bool,
    pub loading_more: bool,
    pub last_error: Option<String>,
    pub stats_query: StatsQuery,
    pub stats: Option<StatsSnapshot>,
    pub stats_error: Option<String>,
    pub meta: Option<ProjectMeta>,
    pub refresh: Vec<RefreshRowView>,
    pub task_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRowView {
    pub key: RefreshKey,
    pub refreshing: bool,
    pub label: Option<String>,
}

impl<T> SessionViewModel<T> {
    pub fn refresh_entry(&self, key: RefreshKey) -> Option<&RefreshRowView> {
        self.refresh.iter().find(|row| row.key == key)
    }
}
