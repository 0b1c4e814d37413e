use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cohort_engine::{
    ApiError, EngineCommand, EngineEvent, EngineHandle, MetaData, PageData, PageQuery, PlatformApi,
    StatsData, StatsParams, TaskRequest, TaskState, TaskTick,
};

/// Scripted platform: serves a fixed sequence of progress ticks.
struct ScriptedApi {
    ticks: Mutex<VecDeque<TaskTick>>,
    started_task_id: Option<String>,
}

impl ScriptedApi {
    fn new(ticks: Vec<TaskTick>) -> Self {
        Self {
            ticks: Mutex::new(ticks.into()),
            started_task_id: None,
        }
    }

    fn with_start(mut self, task_id: &str) -> Self {
        self.started_task_id = Some(task_id.to_string());
        self
    }
}

#[async_trait::async_trait]
impl PlatformApi for ScriptedApi {
    async fn query_collection(
        &self,
        _project: u64,
        _collection: &str,
        _page: u32,
        _query: &PageQuery,
    ) -> Result<PageData, ApiError> {
        Err(ApiError::Network("not scripted".to_string()))
    }

    async fn query_stats(
        &self,
        _project: u64,
        _collection: &str,
        _params: &StatsParams,
    ) -> Result<Option<StatsData>, ApiError> {
        Err(ApiError::Network("not scripted".to_string()))
    }

    async fn fetch_project_meta(&self, _project: u64) -> Result<MetaData, ApiError> {
        Err(ApiError::Network("not scripted".to_string()))
    }

    async fn start_task(
        &self,
        _project: u64,
        _task_type: &str,
        _request: &TaskRequest,
    ) -> Result<String, ApiError> {
        self.started_task_id
            .clone()
            .ok_or_else(|| ApiError::Network("start refused".to_string()))
    }

    async fn poll_task(&self, _task_id: &str) -> Result<TaskTick, ApiError> {
        let mut ticks = self.ticks.lock().expect("tick script");
        ticks
            .pop_front()
            .ok_or_else(|| ApiError::Network("script exhausted".to_string()))
    }

    async fn list_active_tasks(&self, _project: u64) -> Result<Vec<(String, String)>, ApiError> {
        Ok(Vec::new())
    }

    async fn clear_collection(&self, _project: u64, _collection: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

fn fast_engine(api: ScriptedApi) -> EngineHandle {
    EngineHandle::with_api(
        Arc::new(api),
        Duration::from_millis(5),
        Duration::from_millis(5),
    )
}

fn drain_until(engine: &EngineHandle, stop: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        match engine.try_recv() {
            Some(event) => {
                let done = stop(&event);
                events.push(event);
                if done {
                    return events;
                }
            }
            None => thread::sleep(Duration::from_millis(2)),
        }
    }
    panic!("engine never produced the expected event; got {events:?}");
}

fn tick(status: TaskState, loaded: u64, total: Option<u64>) -> TaskTick {
    TaskTick {
        status,
        loaded,
        total,
    }
}

#[test]
fn resumed_task_is_polled_until_terminal() {
    let engine = fast_engine(ScriptedApi::new(vec![
        tick(TaskState::Fetching, 10, Some(100)),
        tick(TaskState::Processing, 100, Some(100)),
        tick(TaskState::Done, 100, Some(100)),
    ]));

    engine.send(EngineCommand::ResumeTask {
        marker: 3,
        task_type: "posts".to_string(),
        task_id: "task-42".to_string(),
    });

    let events = drain_until(&engine, |event| {
        matches!(event, EngineEvent::TaskTerminal { .. })
    });

    let statuses: Vec<TaskState> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::TaskTick { marker: 3, tick, .. } => Some(tick.status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![TaskState::Fetching, TaskState::Processing, TaskState::Done]
    );
    assert!(matches!(
        events.last(),
        Some(EngineEvent::TaskTerminal {
            marker: 3,
            result: Ok(()),
            ..
        })
    ));
}

#[test]
fn started_task_reports_id_then_observes() {
    let api = ScriptedApi::new(vec![tick(TaskState::Done, 5, Some(5))]).with_start("task-7");
    let engine = fast_engine(api);

    engine.send(EngineCommand::StartTask {
        marker: 1,
        project: 7,
        task_type: "members".to_string(),
        request: TaskRequest::default(),
    });

    let events = drain_until(&engine, |event| {
        matches!(event, EngineEvent::TaskTerminal { .. })
    });

    assert!(matches!(
        events.first(),
        Some(EngineEvent::TaskStarted {
            marker: 1,
            result: Ok(task_id),
            ..
        }) if task_id == "task-7"
    ));
}

#[test]
fn error_status_surfaces_as_failed_terminal() {
    let engine = fast_engine(ScriptedApi::new(vec![
        tick(TaskState::Fetching, 10, None),
        tick(TaskState::Error, 10, None),
    ]));

    engine.send(EngineCommand::ResumeTask {
        marker: 4,
        task_type: "interactions".to_string(),
        task_id: "task-9".to_string(),
    });

    let events = drain_until(&engine, |event| {
        matches!(event, EngineEvent::TaskTerminal { .. })
    });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::TaskTerminal {
            result: Err(ApiError::TaskFailed(_)),
            ..
        })
    ));
}

#[test]
fn rebinding_an_observed_task_rekeys_the_marker_without_a_second_loop() {
    let api = ScriptedApi::new(vec![
        tick(TaskState::Fetching, 10, Some(100)),
        tick(TaskState::Done, 100, Some(100)),
    ]);
    // Slow enough that the second resume lands between two polls.
    let engine = EngineHandle::with_api(
        Arc::new(api),
        Duration::from_millis(50),
        Duration::from_millis(5),
    );

    engine.send(EngineCommand::ResumeTask {
        marker: 1,
        task_type: "posts".to_string(),
        task_id: "task-5".to_string(),
    });
    let events = drain_until(&engine, |event| {
        matches!(event, EngineEvent::TaskTick { .. })
    });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::TaskTick { marker: 1, .. })
    ));

    // Project round trip: reconciliation reports the same task id again
    // under the new marker.
    engine.send(EngineCommand::ResumeTask {
        marker: 2,
        task_type: "posts".to_string(),
        task_id: "task-5".to_string(),
    });
    let events = drain_until(&engine, |event| {
        matches!(event, EngineEvent::TaskTerminal { .. })
    });

    // One remaining scripted tick: a duplicate loop would have drained the
    // script twice and produced extra events.
    let tick_markers: Vec<u64> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::TaskTick { marker, .. } => Some(*marker),
            _ => None,
        })
        .collect();
    assert_eq!(tick_markers, vec![2]);
    assert!(matches!(
        events.last(),
        Some(EngineEvent::TaskTerminal {
            marker: 2,
            result: Ok(()),
            ..
        })
    ));
}

#[test]
fn debounce_echoes_its_generation_after_the_delay() {
    let engine = fast_engine(ScriptedApi::new(Vec::new()));

    engine.send(EngineCommand::ScheduleDebounce { generation: 11 });

    let events = drain_until(&engine, |event| {
        matches!(event, EngineEvent::DebounceElapsed { .. })
    });
    assert_eq!(
        events.last(),
        Some(&EngineEvent::DebounceElapsed { generation: 11 })
    );
}
