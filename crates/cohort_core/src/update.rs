use crate::collections::{CollectionKind, Group};
use crate::effect::{Effect, TaskParams};
use crate::query::{CanMessage, FilterUpdate, QueryShape};
use crate::store::SessionStore;
use crate::tasks::{progress_label, TaskHandle, TaskStatus};
use crate::Msg;

/// Pure update function: applies a message to the session store and returns
/// any effects. This is the only place cross-cutting policy lives: group
/// consistency, refetch triggers, debounce, load-more gating, and the
/// staleness guard for completions.
pub fn update<T>(mut store: SessionStore<T>, msg: Msg<T>) -> (SessionStore<T>, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionRestored { collection } => {
            // Applied before any project selection; the persisted collection
            // takes priority over the default group on this first evaluation.
            store.restore_collection(collection);
            Vec::new()
        }
        Msg::ProjectSelected(project) => {
            if store.project() == Some(project) {
                return (store, Vec::new());
            }
            store.switch_project(project);
            let marker = store.marker();
            let mut effects = vec![
                Effect::ListActiveTasks { marker, project },
                Effect::FetchProjectMeta { marker, project },
            ];
            effects.extend(reset_fetch(&mut store));
            effects.extend(stats_fetch(&mut store));
            effects
        }
        Msg::GroupSelected(group) => {
            if store.active_group() == group {
                return (store, Vec::new());
            }
            store.set_group(group);
            match store.active_collection() {
                Some(collection) if collection.group() != group => {
                    // The selected collection no longer belongs to the
                    // active group; fall back to the empty state.
                    store.clear_collection();
                    vec![Effect::PersistSelection { collection: None }]
                }
                _ => Vec::new(),
            }
        }
        Msg::CollectionSelected(collection) => {
            if store.active_collection() == Some(collection) {
                return (store, Vec::new());
            }
            store.activate_collection(collection);
            let mut effects = vec![Effect::PersistSelection {
                collection: Some(collection),
            }];
            effects.extend(reset_fetch(&mut store));
            effects.extend(stats_fetch(&mut store));
            effects
        }
        Msg::FilterChanged(change) => {
            let touches_stats = matches!(change, FilterUpdate::CanMessage(_));
            if let FilterUpdate::CanMessage(value) = change {
                store.stats_query_mut().can_write = match value {
                    CanMessage::Any => None,
                    CanMessage::Yes => Some(true),
                    CanMessage::No => Some(false),
                };
            }
            store.apply_filter(change);
            let mut effects: Vec<Effect> = reset_fetch(&mut store).into_iter().collect();
            if touches_stats {
                effects.extend(stats_fetch(&mut store));
            }
            effects
        }
        Msg::SearchChanged(text) => {
            store.set_search(text);
            let generation = store.bump_search_generation();
            vec![Effect::ScheduleSearchDebounce { generation }]
        }
        Msg::SearchDebounceElapsed { generation } => {
            // A stale timer: the search changed again, or the context that
            // armed it is gone.
            if generation != store.search_generation() {
                return (store, Vec::new());
            }
            store.reset_page_number();
            reset_fetch(&mut store).into_iter().collect()
        }
        Msg::LoadMoreRequested => {
            // Refused while any fetch is outstanding: an incremental page or
            // a reset that is about to replace the list.
            if !store.has_more()
                || store.loading_more()
                || store.reset_inflight()
                || !store.initial_loaded()
            {
                return (store, Vec::new());
            }
            let (Some(project), Some(collection)) = (store.project(), store.active_collection())
            else {
                return (store, Vec::new());
            };
            let next_page = store.page() + 1;
            store.begin_load_more();
            vec![Effect::FetchPage {
                marker: store.marker(),
                project,
                collection,
                page: next_page,
                reset: false,
                search: store.search().to_string(),
                shape: QueryShape::for_collection(collection, store.filters()),
            }]
        }
        Msg::RefreshRequested(collection) => {
            if collection.kind() == CollectionKind::Interaction {
                // The platform needs an explicit time window for this import.
                return (store, vec![Effect::RequestDateRange { collection }]);
            }
            start_task_effects(&mut store, collection, TaskParams::default())
        }
        Msg::RefreshRangeConfirmed {
            collection,
            date_from,
            date_to,
        } => start_task_effects(
            &mut store,
            collection,
            TaskParams {
                date_from: Some(date_from),
                date_to: Some(date_to),
            },
        ),
        Msg::StatsPeriodChanged(period) => {
            store.stats_query_mut().set_period(period);
            stats_fetch(&mut store).into_iter().collect()
        }
        Msg::StatsGroupByChanged(group_by) => {
            store.stats_query_mut().set_group_by(group_by);
            stats_fetch(&mut store).into_iter().collect()
        }
        Msg::StatsBoundsChanged { date_from, date_to } => {
            {
                let query = store.stats_query_mut();
                query.date_from = date_from;
                query.date_to = date_to;
            }
            stats_fetch(&mut store).into_iter().collect()
        }
        Msg::PageLoaded {
            marker,
            page,
            reset,
            items,
            total_count,
            ..
        } => {
            // Only the project marker is compared; a response for another
            // collection or filter state within the same project still
            // applies (last response wins).
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.apply_page(reset, page, items, total_count);
            Vec::new()
        }
        Msg::PageFailed {
            marker,
            reset,
            error,
            ..
        } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.fail_page(reset, error);
            Vec::new()
        }
        Msg::StatsLoaded { marker, stats, .. } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.set_stats(stats);
            Vec::new()
        }
        Msg::StatsFailed { marker, error } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.fail_stats(error);
            Vec::new()
        }
        Msg::ProjectMetaLoaded { marker, meta } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.set_meta(meta);
            Vec::new()
        }
        Msg::TaskStarted {
            marker,
            task_type,
            task_id,
        } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.insert_task(TaskHandle {
                task_id,
                task_type,
                status: TaskStatus::Queued,
                loaded: 0,
                total: None,
            });
            Vec::new()
        }
        Msg::TaskStartFailed {
            marker,
            task_type,
            error,
        } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.clear_refresh(task_type.affected_keys());
            vec![Effect::NotifyUser {
                message: format!("Could not start {} import: {error}", task_type.api_slug()),
            }]
        }
        Msg::TaskProgress {
            marker,
            task_type,
            status,
            loaded,
            total,
        } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            store.update_task(task_type, status, loaded, total);
            store.set_refresh(
                task_type.affected_keys(),
                progress_label(status, loaded, total),
            );
            Vec::new()
        }
        Msg::TaskCompleted {
            marker,
            task_type,
            result,
        } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            let keys = task_type.affected_keys();
            let mut effects = Vec::new();
            // Metadata counters always reflect whatever the task managed to
            // import, even on failure.
            if let Some(project) = store.project() {
                effects.push(Effect::FetchProjectMeta {
                    marker: store.marker(),
                    project,
                });
            }
            let active_affected = store
                .active_collection()
                .is_some_and(|active| keys.contains(&crate::tasks::RefreshKey::Collection(active)));
            if active_affected {
                effects.extend(reset_fetch(&mut store));
                effects.extend(stats_fetch(&mut store));
            }
            store.clear_refresh(keys);
            store.remove_task(task_type);
            if let Err(error) = result {
                effects.push(Effect::NotifyUser {
                    message: format!("{} import failed: {error}", task_type.api_slug()),
                });
            }
            effects
        }
        Msg::ActiveTasksListed { marker, tasks } => {
            if marker != store.marker() {
                return (store, Vec::new());
            }
            let mut effects = Vec::new();
            for (task_type, task_id) in tasks {
                if store.has_task(task_type) {
                    continue;
                }
                store.insert_task(TaskHandle {
                    task_id: task_id.clone(),
                    task_type,
                    status: TaskStatus::Queued,
                    loaded: 0,
                    total: None,
                });
                store.set_refresh(
                    task_type.affected_keys(),
                    progress_label(TaskStatus::Queued, 0, None),
                );
                effects.push(Effect::ResumeTask {
                    marker: store.marker(),
                    task_type,
                    task_id,
                });
            }
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (store, effects)
}

/// A page-1 fetch that replaces the loaded items, issued for the active
/// collection under the current marker. Not gated by the single-flight
/// check; whichever reset response completes last is the one applied.
/// Marks the reset as in flight so load-more stays refused until a reset
/// completion lands.
fn reset_fetch<T>(store: &mut SessionStore<T>) -> Option<Effect> {
    let project = store.project()?;
    let collection = store.active_collection()?;
    store.begin_reset_fetch();
    Some(Effect::FetchPage {
        marker: store.marker(),
        project,
        collection,
        page: 1,
        reset: true,
        search: store.search().to_string(),
        shape: QueryShape::for_collection(collection, store.filters()),
    })
}

/// Statistics fetch for the active collection. Automation-group collections
/// are statistics-less and resolve to `None` without a network call; a
/// custom period with an incomplete range never fires.
fn stats_fetch<T>(store: &mut SessionStore<T>) -> Option<Effect> {
    let project = store.project()?;
    let collection = store.active_collection()?;
    if collection.group() == Group::Automation {
        store.set_stats(None);
        return None;
    }
    if !store.stats_query().is_ready() {
        return None;
    }
    Some(Effect::FetchStats {
        marker: store.marker(),
        project,
        collection,
        query: store.stats_query().clone(),
    })
}

fn start_task_effects<T>(
    store: &mut SessionStore<T>,
    collection: crate::collections::CollectionId,
    params: TaskParams,
) -> Vec<Effect> {
    let Some(project) = store.project() else {
        return Vec::new();
    };
    let task_type = collection.refresh_task();
    if store.has_task(task_type) {
        // Already running; the poller is driving the labels.
        return Vec::new();
    }
    store.set_refresh(
        task_type.affected_keys(),
        progress_label(TaskStatus::Queued, 0, None),
    );
    vec![Effect::StartTask {
        marker: store.marker(),
        project,
        task_type,
        params,
    }]
}
