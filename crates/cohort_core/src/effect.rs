use crate::collections::CollectionId;
use crate::query::{IsoDate, QueryShape, StatsQuery};
use crate::store::{Marker, ProjectId};
use crate::tasks::{TaskId, TaskType};

/// Side effects the update function requests from the shell. Network
/// effects carry the marker they were issued under; the matching completion
/// message echoes it back for the staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchPage {
        marker: Marker,
        project: ProjectId,
        collection: CollectionId,
        page: u32,
        reset: bool,
        search: String,
        shape: QueryShape,
    },
    FetchStats {
        marker: Marker,
        project: ProjectId,
        collection: CollectionId,
        query: StatsQuery,
    },
    FetchProjectMeta {
        marker: Marker,
        project: ProjectId,
    },
    StartTask {
        marker: Marker,
        project: ProjectId,
        task_type: TaskType,
        params: TaskParams,
    },
    /// Reattach a progress observer to a task the server reports as already
    /// running. Never starts a duplicate job.
    ResumeTask {
        marker: Marker,
        task_type: TaskType,
        task_id: TaskId,
    },
    ListActiveTasks {
        marker: Marker,
        project: ProjectId,
    },
    /// Arm the search debounce timer; fires `Msg::SearchDebounceElapsed`
    /// with the same generation after the quiet period.
    ScheduleSearchDebounce {
        generation: u64,
    },
    /// Ask the rendering layer for an explicit date range before starting
    /// an interaction import.
    RequestDateRange {
        collection: CollectionId,
    },
    PersistSelection {
        collection: Option<CollectionId>,
    },
    /// Toast-equivalent user notification.
    NotifyUser {
        message: String,
    },
}

/// Optional parameters of a task start.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskParams {
    pub date_from: Option<IsoDate>,
    pub date_to: Option<IsoDate>,
}
