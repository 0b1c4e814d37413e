use std::collections::BTreeMap;

use crate::collections::{CollectionId, Group};
use crate::query::{Filters, StatsQuery, StatsSnapshot, PAGE_SIZE};
use crate::tasks::{RefreshKey, RefreshStatusEntry, TaskHandle, TaskType};
use crate::view_model::{RefreshRowView, SessionViewModel};

/// Opaque identifier of the project everything else is scoped to.
pub type ProjectId = u64;

/// Generation counter bumped synchronously on every project switch.
/// Asynchronous operations capture it at issue time and compare it at
/// completion time; a mismatch means the result belongs to a context that
/// no longer applies and must be discarded.
pub type Marker = u64;

/// Project-level metadata and per-collection row counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectMeta {
    pub counts: BTreeMap<CollectionId, u64>,
    pub synced_at: Option<String>,
}

/// All mutable per-project UI-facing state. Pure setters only; no network
/// or timer behavior lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore<T> {
    project: Option<ProjectId>,
    marker: Marker,
    active_group: Group,
    active_collection: Option<CollectionId>,
    search: String,
    filters: Filters,
    page: u32,
    items: Vec<T>,
    total_count: u64,
    has_more: bool,
    initial_loaded: bool,
    loading_more: bool,
    reset_inflight: bool,
    last_error: Option<String>,
    stats_query: StatsQuery,
    stats: Option<StatsSnapshot>,
    stats_error: Option<String>,
    meta: Option<ProjectMeta>,
    refresh: BTreeMap<RefreshKey, RefreshStatusEntry>,
    tasks: BTreeMap<TaskType, TaskHandle>,
    search_generation: u64,
    dirty: bool,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self {
            project: None,
            marker: 0,
            active_group: Group::default(),
            active_collection: None,
            search: String::new(),
            filters: Filters::default(),
            page: 1,
            items: Vec::new(),
            total_count: 0,
            has_more: false,
            initial_loaded: false,
            loading_more: false,
            reset_inflight: false,
            last_error: None,
            stats_query: StatsQuery::default(),
            stats: None,
            stats_error: None,
            meta: None,
            refresh: BTreeMap::new(),
            tasks: BTreeMap::new(),
            search_generation: 0,
            dirty: false,
        }
    }
}

impl<T> SessionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self) -> Option<ProjectId> {
        self.project
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    pub fn active_group(&self) -> Group {
        self.active_group
    }

    pub fn active_collection(&self) -> Option<CollectionId> {
        self.active_collection
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn initial_loaded(&self) -> bool {
        self.initial_loaded
    }

    pub fn loading_more(&self) -> bool {
        self.loading_more
    }

    pub fn reset_inflight(&self) -> bool {
        self.reset_inflight
    }

    pub fn stats_query(&self) -> &StatsQuery {
        &self.stats_query
    }

    pub fn search_generation(&self) -> u64 {
        self.search_generation
    }

    pub fn has_task(&self, task_type: TaskType) -> bool {
        self.tasks.contains_key(&task_type)
    }

    /// Returns the dirty flag and clears it. The rendering layer uses this
    /// to coalesce redraws.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Applies a persisted last-active collection before the first project
    /// is selected. The collection's group wins over the default group so
    /// the restored selection does not flicker away.
    pub(crate) fn restore_collection(&mut self, collection: Option<CollectionId>) {
        if let Some(collection) = collection {
            self.active_collection = Some(collection);
            self.active_group = collection.group();
            self.mark_dirty();
        }
    }

    /// The single atomic reset procedure for a project change: bumps the
    /// marker, discards every piece of ephemeral state, and re-validates
    /// the surviving collection selection against the group map.
    pub(crate) fn switch_project(&mut self, project: ProjectId) {
        self.project = Some(project);
        self.marker += 1;
        self.search.clear();
        self.search_generation += 1;
        self.filters = Filters::default();
        self.reset_page_state();
        self.stats_query = StatsQuery::default();
        self.stats = None;
        self.stats_error = None;
        self.meta = None;
        self.refresh.clear();
        self.tasks.clear();
        if let Some(collection) = self.active_collection {
            self.active_group = collection.group();
        }
        self.mark_dirty();
    }

    pub(crate) fn set_group(&mut self, group: Group) {
        self.active_group = group;
        self.mark_dirty();
    }

    pub(crate) fn clear_collection(&mut self) {
        self.active_collection = None;
        self.search.clear();
        self.search_generation += 1;
        self.filters = Filters::default();
        self.reset_page_state();
        self.stats = None;
        self.stats_error = None;
        self.mark_dirty();
    }

    /// Activates a collection: selection, group consistency, and a fresh
    /// query state (lazily created, never merged with the previous one).
    pub(crate) fn activate_collection(&mut self, collection: CollectionId) {
        self.active_collection = Some(collection);
        self.active_group = collection.group();
        self.search.clear();
        self.search_generation += 1;
        self.filters = Filters::default();
        self.reset_page_state();
        self.stats = None;
        self.stats_error = None;
        self.mark_dirty();
    }

    fn reset_page_state(&mut self) {
        self.page = 1;
        self.items = Vec::new();
        self.total_count = 0;
        self.has_more = false;
        self.initial_loaded = false;
        self.loading_more = false;
        self.reset_inflight = false;
        self.last_error = None;
    }

    pub(crate) fn apply_filter(&mut self, update: crate::query::FilterUpdate) {
        self.filters.apply(update);
        self.page = 1;
        self.mark_dirty();
    }

    pub(crate) fn set_search(&mut self, text: String) {
        self.search = text;
        self.mark_dirty();
    }

    pub(crate) fn bump_search_generation(&mut self) -> u64 {
        self.search_generation += 1;
        self.search_generation
    }

    pub(crate) fn reset_page_number(&mut self) {
        self.page = 1;
    }

    pub(crate) fn begin_load_more(&mut self) {
        self.loading_more = true;
        self.mark_dirty();
    }

    /// Marks a reset fetch as outstanding. Cleared by the next reset
    /// completion under the same marker, successful or not.
    pub(crate) fn begin_reset_fetch(&mut self) {
        self.reset_inflight = true;
    }

    /// Writes a fetched page. Reset pages replace the item list and the
    /// display count; incremental pages append and advance the stored page
    /// number. `has_more` follows the page-size heuristic in both cases.
    pub(crate) fn apply_page(&mut self, reset: bool, page: u32, items: Vec<T>, total_count: u64) {
        self.has_more = items.len() == PAGE_SIZE;
        if reset {
            self.reset_inflight = false;
            self.items = items;
            self.total_count = total_count;
        } else {
            self.items.extend(items);
        }
        self.page = page;
        self.initial_loaded = true;
        self.loading_more = false;
        self.last_error = None;
        self.mark_dirty();
    }

    /// A failed fetch clears the in-flight flag it was issued under and
    /// surfaces the error; previously loaded items stay untouched.
    pub(crate) fn fail_page(&mut self, reset: bool, error: String) {
        if reset {
            self.reset_inflight = false;
        }
        self.loading_more = false;
        self.last_error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn stats_query_mut(&mut self) -> &mut StatsQuery {
        self.mark_dirty();
        &mut self.stats_query
    }

    pub(crate) fn set_stats(&mut self, stats: Option<StatsSnapshot>) {
        self.stats = stats;
        self.stats_error = None;
        self.mark_dirty();
    }

    pub(crate) fn fail_stats(&mut self, error: String) {
        self.stats_error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn set_meta(&mut self, meta: ProjectMeta) {
        self.meta = Some(meta);
        self.mark_dirty();
    }

    pub(crate) fn set_refresh(&mut self, keys: &[RefreshKey], label: Option<String>) {
        for key in keys {
            self.refresh.insert(
                *key,
                RefreshStatusEntry {
                    refreshing: true,
                    label: label.clone(),
                },
            );
        }
        self.mark_dirty();
    }

    /// Clears the entries back to the idle `{false, None}` value. Used on
    /// terminal progress regardless of success or failure.
    pub(crate) fn clear_refresh(&mut self, keys: &[RefreshKey]) {
        for key in keys {
            self.refresh.insert(*key, RefreshStatusEntry::default());
        }
        self.mark_dirty();
    }

    pub(crate) fn insert_task(&mut self, handle: TaskHandle) {
        self.tasks.insert(handle.task_type, handle);
        self.mark_dirty();
    }

    pub(crate) fn update_task(
        &mut self,
        task_type: TaskType,
        status: crate::tasks::TaskStatus,
        loaded: u64,
        total: Option<u64>,
    ) {
        if let Some(handle) = self.tasks.get_mut(&task_type) {
            handle.status = status;
            handle.loaded = loaded;
            handle.total = total;
            self.mark_dirty();
        }
    }

    pub(crate) fn remove_task(&mut self, task_type: TaskType) {
        self.tasks.remove(&task_type);
        self.mark_dirty();
    }
}

impl<T: Clone> SessionStore<T> {
    /// Snapshot for the rendering layer.
    pub fn view(&self) -> SessionViewModel<T> {
        SessionViewModel {
            project: self.project,
            active_group: self.active_group,
            active_collection: self.active_collection,
            search: self.search.clone(),
            filters: self.filters.clone(),
            page: self.page,
            items: self.items.clone(),
            total_count: self.total_count,
            has_more: self.has_more,
            initial_loaded: self.initial_loaded,
            loading_more: self.loading_more,
            last_error: self.last_error.clone(),
            stats_query: self.stats_query.clone(),
            stats: self.stats.clone(),
            stats_error: self.stats_error.clone(),
            meta: self.meta.clone(),
            refresh: self
                .refresh
                .iter()
                .map(|(key, entry)| RefreshRowView {
                    key: *key,
                    refreshing: entry.refreshing,
                    label: entry.label.clone(),
                })
                .collect(),
            task_count: self.tasks.len(),
        }
    }
}
