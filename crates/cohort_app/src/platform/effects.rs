use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use cohort_core::{
    AgeBracket, CanMessage, CollectionId, Effect, Filters, Msg, OnlineRecency, PlatformFilter,
    ProjectMeta, QualityFilter, QueryShape, SexFilter, StatsBucket, StatsGroupBy, StatsPeriod,
    StatsSnapshot, TaskStatus, TaskType, PAGE_SIZE,
};
use cohort_engine::{
    ApiError, ApiSettings, EngineCommand, EngineEvent, EngineHandle, PageQuery, Record, StatsData,
    StatsParams, TaskRequest, TaskState,
};
use cohort_logging::{cohort_info, cohort_warn};

use super::persistence;

/// Executes the effects the core requests: network commands go to the
/// engine, persistence goes to disk, notifications go to the log. Engine
/// events come back on a dedicated thread and are mapped into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    state_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        msg_tx: mpsc::Sender<Msg<Record>>,
        settings: ApiSettings,
        state_dir: PathBuf,
    ) -> Result<Self, ApiError> {
        let engine = EngineHandle::new(settings)?;
        let runner = Self { engine, state_dir };
        runner.spawn_event_loop(msg_tx);
        Ok(runner)
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchPage {
                    marker,
                    project,
                    collection,
                    page,
                    reset,
                    search,
                    shape,
                } => {
                    self.engine.send(EngineCommand::FetchPage {
                        marker,
                        project,
                        collection: collection.api_slug().to_string(),
                        page,
                        reset,
                        query: PageQuery {
                            search,
                            page_size: PAGE_SIZE as u32,
                            params: shape_params(&shape),
                        },
                    });
                }
                Effect::FetchStats {
                    marker,
                    project,
                    collection,
                    query,
                } => {
                    self.engine.send(EngineCommand::FetchStats {
                        marker,
                        project,
                        collection: collection.api_slug().to_string(),
                        params: StatsParams {
                            period: period_value(query.period).to_string(),
                            group_by: group_by_value(query.group_by).to_string(),
                            date_from: query.date_from,
                            date_to: query.date_to,
                            can_write: query.can_write,
                        },
                    });
                }
                Effect::FetchProjectMeta { marker, project } => {
                    self.engine.send(EngineCommand::FetchMeta { marker, project });
                }
                Effect::StartTask {
                    marker,
                    project,
                    task_type,
                    params,
                } => {
                    self.engine.send(EngineCommand::StartTask {
                        marker,
                        project,
                        task_type: task_type.api_slug().to_string(),
                        request: TaskRequest {
                            date_from: params.date_from,
                            date_to: params.date_to,
                        },
                    });
                }
                Effect::ResumeTask {
                    marker,
                    task_type,
                    task_id,
                } => {
                    self.engine.send(EngineCommand::ResumeTask {
                        marker,
                        task_type: task_type.api_slug().to_string(),
                        task_id,
                    });
                }
                Effect::ListActiveTasks { marker, project } => {
                    self.engine
                        .send(EngineCommand::ListActiveTasks { marker, project });
                }
                Effect::ScheduleSearchDebounce { generation } => {
                    self.engine.send(EngineCommand::ScheduleDebounce { generation });
                }
                Effect::RequestDateRange { collection } => {
                    // A frontend opens its date picker here; headless runs
                    // only record that the import is waiting for a range.
                    cohort_info!(
                        "import of {} needs a date range before it can start",
                        collection.api_slug()
                    );
                }
                Effect::PersistSelection { collection } => {
                    persistence::save_selection(&self.state_dir, collection);
                }
                Effect::NotifyUser { message } => {
                    cohort_warn!("{}", message);
                }
            }
        }
    }

    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg<Record>>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                if let Some(msg) = map_event(event) {
                    if msg_tx.send(msg).is_err() {
                        return;
                    }
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

fn map_event(event: EngineEvent) -> Option<Msg<Record>> {
    match event {
        EngineEvent::PageFetched {
            marker,
            collection,
            page,
            reset,
            result,
        } => {
            let collection = known_collection(&collection)?;
            Some(match result {
                Ok(data) => Msg::PageLoaded {
                    marker,
                    collection,
                    page,
                    reset,
                    items: data.items,
                    total_count: data.total_count,
                },
                Err(err) => Msg::PageFailed {
                    marker,
                    collection,
                    reset,
                    error: err.to_string(),
                },
            })
        }
        EngineEvent::StatsFetched {
            marker,
            collection,
            result,
        } => {
            let collection = known_collection(&collection)?;
            Some(match result {
                Ok(data) => Msg::StatsLoaded {
                    marker,
                    collection,
                    stats: data.map(stats_snapshot),
                },
                Err(err) => Msg::StatsFailed {
                    marker,
                    error: err.to_string(),
                },
            })
        }
        EngineEvent::MetaFetched { marker, result } => match result {
            Ok(data) => {
                let counts = data
                    .counts
                    .into_iter()
                    .filter_map(|(slug, count)| {
                        Some((CollectionId::from_slug(&slug)?, count))
                    })
                    .collect();
                let synced_at = data
                    .synced_at
                    .or_else(|| Some(Utc::now().to_rfc3339()));
                Some(Msg::ProjectMetaLoaded {
                    marker,
                    meta: ProjectMeta { counts, synced_at },
                })
            }
            Err(err) => {
                cohort_warn!("project meta fetch failed: {}", err);
                None
            }
        },
        EngineEvent::TaskStarted {
            marker,
            task_type,
            result,
        } => {
            let task_type = known_task_type(&task_type)?;
            Some(match result {
                Ok(task_id) => Msg::TaskStarted {
                    marker,
                    task_type,
                    task_id,
                },
                Err(err) => Msg::TaskStartFailed {
                    marker,
                    task_type,
                    error: err.to_string(),
                },
            })
        }
        EngineEvent::TaskTick {
            marker,
            task_type,
            tick,
        } => {
            let task_type = known_task_type(&task_type)?;
            Some(Msg::TaskProgress {
                marker,
                task_type,
                status: map_status(tick.status),
                loaded: tick.loaded,
                total: tick.total,
            })
        }
        EngineEvent::TaskTerminal {
            marker,
            task_type,
            result,
        } => {
            let task_type = known_task_type(&task_type)?;
            Some(Msg::TaskCompleted {
                marker,
                task_type,
                result: result.map_err(|err| err.to_string()),
            })
        }
        EngineEvent::ActiveTasks { marker, result } => match result {
            Ok(pairs) => {
                let tasks = pairs
                    .into_iter()
                    .filter_map(|(slug, task_id)| Some((known_task_type(&slug)?, task_id)))
                    .collect();
                Some(Msg::ActiveTasksListed { marker, tasks })
            }
            Err(err) => {
                cohort_warn!("active task listing failed: {}", err);
                None
            }
        },
        EngineEvent::DebounceElapsed { generation } => {
            Some(Msg::SearchDebounceElapsed { generation })
        }
        EngineEvent::CollectionCleared {
            collection, result, ..
        } => {
            match result {
                Ok(()) => cohort_info!("collection {} cleared", collection),
                Err(err) => cohort_warn!("clear of collection {} failed: {}", collection, err),
            }
            None
        }
    }
}

fn known_collection(slug: &str) -> Option<CollectionId> {
    let collection = CollectionId::from_slug(slug);
    if collection.is_none() {
        cohort_warn!("dropping event for unknown collection {:?}", slug);
    }
    collection
}

fn known_task_type(slug: &str) -> Option<TaskType> {
    let task_type = TaskType::from_slug(slug);
    if task_type.is_none() {
        cohort_warn!("dropping event for unknown task type {:?}", slug);
    }
    task_type
}

fn map_status(state: TaskState) -> TaskStatus {
    match state {
        TaskState::Queued => TaskStatus::Queued,
        TaskState::Fetching => TaskStatus::Fetching,
        TaskState::Processing => TaskStatus::Processing,
        TaskState::Done => TaskStatus::Done,
        TaskState::Error => TaskStatus::Error,
    }
}

fn stats_snapshot(data: StatsData) -> StatsSnapshot {
    StatsSnapshot {
        buckets: data
            .buckets
            .into_iter()
            .map(|bucket| StatsBucket {
                label: bucket.label,
                count: bucket.count,
            })
            .collect(),
    }
}

/// Serializes the routed filter payload into query pairs. Default values
/// mean "no restriction" and are left out entirely.
fn shape_params(shape: &QueryShape) -> Vec<(String, String)> {
    let mut params = Vec::new();
    match shape {
        QueryShape::Membership(filters) => push_membership(&mut params, filters),
        QueryShape::Content => {}
        QueryShape::Interaction { platform } => push_platform(&mut params, *platform),
    }
    params
}

fn push_membership(params: &mut Vec<(String, String)>, filters: &Filters) {
    if let Some(value) = quality_value(filters.quality) {
        push(params, "quality", value);
    }
    if let Some(value) = sex_value(filters.sex) {
        push(params, "sex", value);
    }
    if let Some(value) = online_value(filters.online) {
        push(params, "online", value);
    }
    if let Some(value) = can_message_value(filters.can_message) {
        push(params, "can_message", value);
    }
    if let Some(month) = filters.birth_month {
        params.push(("birth_month".to_string(), month.to_string()));
    }
    push_platform(params, filters.platform);
    if let Some(value) = age_value(filters.age) {
        push(params, "age", value);
    }
}

fn push_platform(params: &mut Vec<(String, String)>, platform: PlatformFilter) {
    if let Some(value) = platform_value(platform) {
        push(params, "platform", value);
    }
}

fn push(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    params.push((key.to_string(), value.to_string()));
}

fn quality_value(quality: QualityFilter) -> Option<&'static str> {
    match quality {
        QualityFilter::Any => None,
        QualityFilter::Good => Some("good"),
        QualityFilter::Banned => Some("banned"),
        QualityFilter::Deleted => Some("deleted"),
    }
}

fn sex_value(sex: SexFilter) -> Option<&'static str> {
    match sex {
        SexFilter::Any => None,
        SexFilter::Female => Some("female"),
        SexFilter::Male => Some("male"),
    }
}

fn online_value(online: OnlineRecency) -> Option<&'static str> {
    match online {
        OnlineRecency::Any => None,
        OnlineRecency::Today => Some("today"),
        OnlineRecency::Week => Some("week"),
        OnlineRecency::Month => Some("month"),
    }
}

fn can_message_value(can_message: CanMessage) -> Option<&'static str> {
    match can_message {
        CanMessage::Any => None,
        CanMessage::Yes => Some("yes"),
        CanMessage::No => Some("no"),
    }
}

fn platform_value(platform: PlatformFilter) -> Option<&'static str> {
    match platform {
        PlatformFilter::Any => None,
        PlatformFilter::Mobile => Some("mobile"),
        PlatformFilter::Desktop => Some("desktop"),
    }
}

fn age_value(age: AgeBracket) -> Option<&'static str> {
    match age {
        AgeBracket::Any => None,
        AgeBracket::Under18 => Some("under-18"),
        AgeBracket::From18To24 => Some("18-24"),
        AgeBracket::From25To34 => Some("25-34"),
        AgeBracket::From35To44 => Some("35-44"),
        AgeBracket::Over45 => Some("45-plus"),
    }
}

fn period_value(period: StatsPeriod) -> &'static str {
    match period {
        StatsPeriod::Week => "week",
        StatsPeriod::Month => "month",
        StatsPeriod::Quarter => "quarter",
        StatsPeriod::Year => "year",
        StatsPeriod::All => "all",
        StatsPeriod::Custom => "custom",
    }
}

fn group_by_value(group_by: StatsGroupBy) -> &'static str {
    match group_by {
        StatsGroupBy::Day => "day",
        StatsGroupBy::Week => "week",
        StatsGroupBy::Month => "month",
        StatsGroupBy::Quarter => "quarter",
        StatsGroupBy::Year => "year",
    }
}
