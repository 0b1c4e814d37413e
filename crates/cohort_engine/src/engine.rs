use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use cohort_logging::cohort_warn;

use crate::api::{
    ApiError, ApiSettings, MetaData, PageData, PageQuery, PlatformApi, StatsData, StatsParams,
    TaskRequest, TaskState, TaskTick,
};
use crate::http::HttpApi;

/// Commands the shell feeds the engine. Network commands carry the marker
/// the core issued them under; the engine echoes it back untouched and
/// applies no staleness policy of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    FetchPage {
        marker: u64,
        project: u64,
        collection: String,
        page: u32,
        reset: bool,
        query: PageQuery,
    },
    FetchStats {
        marker: u64,
        project: u64,
        collection: String,
        params: StatsParams,
    },
    FetchMeta {
        marker: u64,
        project: u64,
    },
    StartTask {
        marker: u64,
        project: u64,
        task_type: String,
        request: TaskRequest,
    },
    /// Attach a progress observer to an already-running task.
    ResumeTask {
        marker: u64,
        task_type: String,
        task_id: String,
    },
    ListActiveTasks {
        marker: u64,
        project: u64,
    },
    ScheduleDebounce {
        generation: u64,
    },
    ClearCollection {
        marker: u64,
        project: u64,
        collection: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PageFetched {
        marker: u64,
        collection: String,
        page: u32,
        reset: bool,
        result: Result<PageData, ApiError>,
    },
    StatsFetched {
        marker: u64,
        collection: String,
        result: Result<Option<StatsData>, ApiError>,
    },
    MetaFetched {
        marker: u64,
        result: Result<MetaData, ApiError>,
    },
    TaskStarted {
        marker: u64,
        task_type: String,
        result: Result<String, ApiError>,
    },
    TaskTick {
        marker: u64,
        task_type: String,
        tick: TaskTick,
    },
    /// The observed task reached a terminal state, or polling it failed.
    TaskTerminal {
        marker: u64,
        task_type: String,
        result: Result<(), ApiError>,
    },
    ActiveTasks {
        marker: u64,
        result: Result<Vec<(String, String)>, ApiError>,
    },
    DebounceElapsed {
        generation: u64,
    },
    CollectionCleared {
        marker: u64,
        collection: String,
        result: Result<(), ApiError>,
    },
}

/// Handle to the engine thread: commands in, events out.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let poll_interval = settings.poll_interval;
        let debounce_delay = settings.debounce_delay;
        let api = Arc::new(HttpApi::new(settings)?);
        Ok(Self::with_api(api, poll_interval, debounce_delay))
    }

    /// Runs the engine against any `PlatformApi`; the seam tests use.
    pub fn with_api(
        api: Arc<dyn PlatformApi>,
        poll_interval: Duration,
        debounce_delay: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    cohort_warn!("engine runtime failed to start: {}", err);
                    return;
                }
            };
            let observers: Observers = Arc::new(Mutex::new(HashMap::new()));
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let event_tx = event_tx.clone();
                let observers = observers.clone();
                runtime.spawn(async move {
                    handle_command(
                        api.as_ref(),
                        command,
                        event_tx,
                        &observers,
                        poll_interval,
                        debounce_delay,
                    )
                    .await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }
}

/// One observer per task id, keyed by the marker its events are emitted
/// under. Re-binding an observed task re-keys the running loop instead of
/// attaching a second one.
type Observers = Arc<Mutex<HashMap<String, u64>>>;

fn claim_observer(observers: &Observers, task_id: &str, marker: u64) -> bool {
    let Ok(mut map) = observers.lock() else {
        return false;
    };
    match map.entry(task_id.to_string()) {
        Entry::Occupied(mut slot) => {
            slot.insert(marker);
            false
        }
        Entry::Vacant(slot) => {
            slot.insert(marker);
            true
        }
    }
}

fn observer_marker(observers: &Observers, task_id: &str) -> Option<u64> {
    observers.lock().ok()?.get(task_id).copied()
}

fn release_observer(observers: &Observers, task_id: &str) {
    if let Ok(mut map) = observers.lock() {
        map.remove(task_id);
    }
}

async fn handle_command(
    api: &dyn PlatformApi,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
    observers: &Observers,
    poll_interval: Duration,
    debounce_delay: Duration,
) {
    match command {
        EngineCommand::FetchPage {
            marker,
            project,
            collection,
            page,
            reset,
            query,
        } => {
            let result = api.query_collection(project, &collection, page, &query).await;
            let _ = event_tx.send(EngineEvent::PageFetched {
                marker,
                collection,
                page,
                reset,
                result,
            });
        }
        EngineCommand::FetchStats {
            marker,
            project,
            collection,
            params,
        } => {
            let result = api.query_stats(project, &collection, &params).await;
            let _ = event_tx.send(EngineEvent::StatsFetched {
                marker,
                collection,
                result,
            });
        }
        EngineCommand::FetchMeta { marker, project } => {
            let result = api.fetch_project_meta(project).await;
            let _ = event_tx.send(EngineEvent::MetaFetched { marker, result });
        }
        EngineCommand::StartTask {
            marker,
            project,
            task_type,
            request,
        } => {
            let result = api.start_task(project, &task_type, &request).await;
            let _ = event_tx.send(EngineEvent::TaskStarted {
                marker,
                task_type: task_type.clone(),
                result: result.clone(),
            });
            if let Ok(task_id) = result {
                if claim_observer(observers, &task_id, marker) {
                    observe_task(api, observers, task_type, task_id, poll_interval, &event_tx)
                        .await;
                }
            }
        }
        EngineCommand::ResumeTask {
            marker,
            task_type,
            task_id,
        } => {
            if claim_observer(observers, &task_id, marker) {
                observe_task(api, observers, task_type, task_id, poll_interval, &event_tx).await;
            }
        }
        EngineCommand::ListActiveTasks { marker, project } => {
            let result = api.list_active_tasks(project).await;
            let _ = event_tx.send(EngineEvent::ActiveTasks { marker, result });
        }
        EngineCommand::ScheduleDebounce { generation } => {
            tokio::time::sleep(debounce_delay).await;
            let _ = event_tx.send(EngineEvent::DebounceElapsed { generation });
        }
        EngineCommand::ClearCollection {
            marker,
            project,
            collection,
        } => {
            let result = api.clear_collection(project, &collection).await;
            let _ = event_tx.send(EngineEvent::CollectionCleared {
                marker,
                collection,
                result,
            });
        }
    }
}

/// Polls a task until it reaches a terminal state. Dropping the observer
/// never cancels the server-side job; it only stops observation. Each tick
/// is emitted under the registry's current marker for the task, so a resume
/// after a project round trip re-keys the loop instead of duplicating it.
async fn observe_task(
    api: &dyn PlatformApi,
    observers: &Observers,
    task_type: String,
    task_id: String,
    poll_interval: Duration,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    let mut marker = observer_marker(observers, &task_id).unwrap_or(0);
    loop {
        match api.poll_task(&task_id).await {
            Ok(tick) => {
                if let Some(current) = observer_marker(observers, &task_id) {
                    marker = current;
                }
                let status = tick.status;
                let _ = event_tx.send(EngineEvent::TaskTick {
                    marker,
                    task_type: task_type.clone(),
                    tick,
                });
                if status.is_terminal() {
                    release_observer(observers, &task_id);
                    let result = match status {
                        TaskState::Error => Err(ApiError::TaskFailed(task_id.clone())),
                        _ => Ok(()),
                    };
                    let _ = event_tx.send(EngineEvent::TaskTerminal {
                        marker,
                        task_type,
                        result,
                    });
                    return;
                }
            }
            Err(err) => {
                release_observer(observers, &task_id);
                cohort_warn!("poll of task {} failed: {}", task_id, err);
                let _ = event_tx.send(EngineEvent::TaskTerminal {
                    marker,
                    task_type,
                    result: Err(err),
                });
                return;
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
}
