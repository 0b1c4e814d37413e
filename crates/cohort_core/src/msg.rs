use crate::collections::{CollectionId, Group};
use crate::query::{FilterUpdate, IsoDate, StatsGroupBy, StatsPeriod, StatsSnapshot};
use crate::store::{Marker, ProjectId, ProjectMeta};
use crate::tasks::{TaskId, TaskStatus, TaskType};

/// Everything that can happen to the session: user intents from the
/// rendering layer and completions coming back from the engine. Completions
/// carry the marker captured when their operation was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg<T> {
    /// Persisted last-active collection, applied once before the first
    /// project selection.
    SessionRestored { collection: Option<CollectionId> },
    ProjectSelected(ProjectId),
    GroupSelected(Group),
    CollectionSelected(CollectionId),
    FilterChanged(FilterUpdate),
    /// Raw search text; the fetch fires only after the debounce elapses.
    SearchChanged(String),
    SearchDebounceElapsed { generation: u64 },
    LoadMoreRequested,
    /// User-initiated "refresh this collection".
    RefreshRequested(CollectionId),
    /// Date range chosen for an interaction import, which the platform
    /// requires an explicit time window for.
    RefreshRangeConfirmed {
        collection: CollectionId,
        date_from: IsoDate,
        date_to: IsoDate,
    },
    StatsPeriodChanged(StatsPeriod),
    StatsGroupByChanged(StatsGroupBy),
    StatsBoundsChanged {
        date_from: Option<IsoDate>,
        date_to: Option<IsoDate>,
    },

    PageLoaded {
        marker: Marker,
        collection: CollectionId,
        page: u32,
        reset: bool,
        items: Vec<T>,
        total_count: u64,
    },
    PageFailed {
        marker: Marker,
        collection: CollectionId,
        reset: bool,
        error: String,
    },
    StatsLoaded {
        marker: Marker,
        collection: CollectionId,
        stats: Option<StatsSnapshot>,
    },
    StatsFailed {
        marker: Marker,
        error: String,
    },
    ProjectMetaLoaded {
        marker: Marker,
        meta: ProjectMeta,
    },
    TaskStarted {
        marker: Marker,
        task_type: TaskType,
        task_id: TaskId,
    },
    TaskStartFailed {
        marker: Marker,
        task_type: TaskType,
        error: String,
    },
    TaskProgress {
        marker: Marker,
        task_type: TaskType,
        status: TaskStatus,
        loaded: u64,
        total: Option<u64>,
    },
    /// Terminal progress: the job finished server-side, successfully or not.
    TaskCompleted {
        marker: Marker,
        task_type: TaskType,
        result: Result<(), String>,
    },
    /// Startup reconciliation response: the tasks currently running for the
    /// project.
    ActiveTasksListed {
        marker: Marker,
        tasks: Vec<(TaskType, TaskId)>,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
