//! Background import tasks and the refresh-status bookkeeping they drive.

use crate::collections::CollectionId;

/// Server-assigned task identifier.
pub type TaskId = String;

/// The closed set of long-running server-side import jobs. At most one task
/// per type is expected to run per project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskType {
    Members,
    History,
    Posts,
    Interactions,
    MailingAudit,
    ProfileEnrich,
    Contest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Fetching,
    Processing,
    Done,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

/// Key of a refresh-status entry: either a collection whose rows a task
/// (re)populates, or a synthetic key for detail-field refreshes that leave
/// the row set untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RefreshKey {
    Collection(CollectionId),
    /// Member profile enrichment; rows keep their identity.
    ProfileDetails,
    /// Mailing dialogue metadata analysis.
    MailingDialogs,
}

impl TaskType {
    /// The refresh-status keys a task's progress fans out to. A single task
    /// may affect several entries (interactions drive likes, comments and
    /// reposts together).
    pub fn affected_keys(self) -> &'static [RefreshKey] {
        match self {
            TaskType::Members => &[RefreshKey::Collection(CollectionId::Members)],
            TaskType::History => &[
                RefreshKey::Collection(CollectionId::JoinedHistory),
                RefreshKey::Collection(CollectionId::LeftHistory),
            ],
            TaskType::Posts => &[
                RefreshKey::Collection(CollectionId::Posts),
                RefreshKey::Collection(CollectionId::Authors),
            ],
            TaskType::Interactions => &[
                RefreshKey::Collection(CollectionId::Likes),
                RefreshKey::Collection(CollectionId::Comments),
                RefreshKey::Collection(CollectionId::Reposts),
            ],
            TaskType::MailingAudit => &[RefreshKey::MailingDialogs],
            TaskType::ProfileEnrich => &[RefreshKey::ProfileDetails],
            TaskType::Contest => &[
                RefreshKey::Collection(CollectionId::ContestWinners),
                RefreshKey::Collection(CollectionId::ContestEntrants),
                RefreshKey::Collection(CollectionId::ContestPosts),
            ],
        }
    }

    /// Stable name used on the wire and in `listActiveTasks` responses.
    pub fn api_slug(self) -> &'static str {
        match self {
            TaskType::Members => "members",
            TaskType::History => "history",
            TaskType::Posts => "posts",
            TaskType::Interactions => "interactions",
            TaskType::MailingAudit => "mailing-audit",
            TaskType::ProfileEnrich => "profile-enrich",
            TaskType::Contest => "contest",
        }
    }

    pub fn from_slug(slug: &str) -> Option<TaskType> {
        const ALL: [TaskType; 7] = [
            TaskType::Members,
            TaskType::History,
            TaskType::Posts,
            TaskType::Interactions,
            TaskType::MailingAudit,
            TaskType::ProfileEnrich,
            TaskType::Contest,
        ];
        ALL.into_iter().find(|t| t.api_slug() == slug)
    }
}

impl CollectionId {
    /// The import task a user-initiated refresh of this collection starts.
    pub fn refresh_task(self) -> TaskType {
        match self {
            CollectionId::Members => TaskType::Members,
            CollectionId::JoinedHistory | CollectionId::LeftHistory => TaskType::History,
            CollectionId::Posts | CollectionId::Authors => TaskType::Posts,
            CollectionId::Likes | CollectionId::Comments | CollectionId::Reposts => {
                TaskType::Interactions
            }
            CollectionId::MailingTargets => TaskType::MailingAudit,
            CollectionId::ContestWinners
            | CollectionId::ContestEntrants
            | CollectionId::ContestPosts => TaskType::Contest,
        }
    }
}

/// An observed in-flight server task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: TaskId,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Per-key refresh indicator shown next to a collection while its task runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshStatusEntry {
    pub refreshing: bool,
    pub label: Option<String>,
}

/// Maps a progress tick to the human-readable label the status entry shows.
pub fn progress_label(status: TaskStatus, loaded: u64, total: Option<u64>) -> Option<String> {
    match status {
        TaskStatus::Queued => Some("Queued".to_string()),
        TaskStatus::Fetching => Some(match total {
            Some(total) => format!("{loaded} / {total}"),
            None => format!("{loaded} loaded"),
        }),
        TaskStatus::Processing => Some("Processing results".to_string()),
        TaskStatus::Done => Some("Done".to_string()),
        TaskStatus::Error => None,
    }
}
