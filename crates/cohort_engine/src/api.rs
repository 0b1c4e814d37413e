use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub access_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Interval between task progress polls.
    pub poll_interval: Duration,
    /// Quiet period before a scheduled search debounce fires.
    pub debounce_delay: Duration,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8900".to_string(),
            access_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            debounce_delay: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("http status {0}")]
    Status(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("task failed: {0}")]
    TaskFailed(String),
}

/// One collection row as the platform returns it. The payload stays opaque
/// JSON; only the identity is interpreted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Query arguments of a page fetch. `params` carries the already-routed
/// filter dimensions as query pairs; the engine does not know which subset
/// a collection admits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageQuery {
    pub search: String,
    pub page_size: u32,
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageData {
    pub items: Vec<Record>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsParams {
    pub period: String,
    pub group_by: String,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub can_write: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsBucketData {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatsData {
    pub buckets: Vec<StatsBucketData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetaData {
    #[serde(default)]
    pub counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub synced_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRequest {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Fetching,
    Processing,
    Done,
    Error,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Error)
    }
}

/// One sample of a task's progress channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskTick {
    pub status: TaskState,
    #[serde(default)]
    pub loaded: u64,
    #[serde(default)]
    pub total: Option<u64>,
}

/// The remote platform surface the engine consumes. Seam for tests and for
/// alternative transports.
#[async_trait::async_trait]
pub trait PlatformApi: Send + Sync {
    async fn query_collection(
        &self,
        project: u64,
        collection: &str,
        page: u32,
        query: &PageQuery,
    ) -> Result<PageData, ApiError>;

    /// Returns `None` when the platform has no statistics for a collection.
    async fn query_stats(
        &self,
        project: u64,
        collection: &str,
        params: &StatsParams,
    ) -> Result<Option<StatsData>, ApiError>;

    async fn fetch_project_meta(&self, project: u64) -> Result<MetaData, ApiError>;

    /// Starts a server-side import; returns the task id.
    async fn start_task(
        &self,
        project: u64,
        task_type: &str,
        request: &TaskRequest,
    ) -> Result<String, ApiError>;

    async fn poll_task(&self, task_id: &str) -> Result<TaskTick, ApiError>;

    /// Map of task type to task id for jobs currently running on the
    /// project; drives startup reconciliation.
    async fn list_active_tasks(&self, project: u64) -> Result<Vec<(String, String)>, ApiError>;

    /// Administrative wipe of a collection. Distinct from a refresh.
    async fn clear_collection(&self, project: u64, collection: &str) -> Result<(), ApiError>;
}
