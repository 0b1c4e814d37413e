use std::sync::Once;

use cohort_core::{
    update, CollectionId, Effect, FilterUpdate, Group, Msg, QualityFilter, SessionStore,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(cohort_logging::initialize_for_tests);
}

type Store = SessionStore<&'static str>;

fn boot(collection: CollectionId) -> Store {
    let (store, _) = update(
        Store::new(),
        Msg::SessionRestored {
            collection: Some(collection),
        },
    );
    let (store, _) = update(store, Msg::ProjectSelected(7));
    store
}

fn deliver_reset_page(store: Store, rows: usize) -> Store {
    let marker = store.marker();
    let collection = store.active_collection().expect("active collection");
    let (store, _) = update(
        store,
        Msg::PageLoaded {
            marker,
            collection,
            page: 1,
            reset: true,
            items: vec!["row"; rows],
            total_count: rows as u64,
        },
    );
    store
}

#[test]
fn restored_collection_overrides_default_group() {
    init_logging();
    let (store, effects) = update(
        Store::new(),
        Msg::SessionRestored {
            collection: Some(CollectionId::Posts),
        },
    );

    let view = store.view();
    assert_eq!(view.active_collection, Some(CollectionId::Posts));
    assert_eq!(view.active_group, Group::Activity);
    assert!(effects.is_empty());
}

#[test]
fn project_selection_fetches_for_restored_collection() {
    init_logging();
    let store = boot(CollectionId::Members);
    let view = store.view();

    assert_eq!(view.project, Some(7));
    assert_eq!(view.active_collection, Some(CollectionId::Members));
    assert_eq!(view.active_group, Group::Membership);
}

#[test]
fn project_selection_emits_reconciliation_and_fetches() {
    init_logging();
    let (store, _) = update(
        Store::new(),
        Msg::SessionRestored {
            collection: Some(CollectionId::Members),
        },
    );
    let (store, effects) = update(store, Msg::ProjectSelected(7));
    let marker = store.marker();

    assert!(effects.contains(&Effect::ListActiveTasks { marker, project: 7 }));
    assert!(effects.contains(&Effect::FetchProjectMeta { marker, project: 7 }));
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::FetchPage {
            collection: CollectionId::Members,
            page: 1,
            reset: true,
            ..
        }
    )));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::FetchStats { .. })));
}

#[test]
fn reselecting_same_project_is_noop() {
    init_logging();
    let mut store = boot(CollectionId::Members);
    assert!(store.consume_dirty());

    let (mut next, effects) = update(store, Msg::ProjectSelected(7));
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}

#[test]
fn group_change_clears_mismatched_collection() {
    init_logging();
    let store = boot(CollectionId::Members);

    let (store, effects) = update(store, Msg::GroupSelected(Group::Activity));

    let view = store.view();
    assert_eq!(view.active_group, Group::Activity);
    assert_eq!(view.active_collection, None);
    assert!(view.items.is_empty());
    assert_eq!(effects, vec![Effect::PersistSelection { collection: None }]);
}

#[test]
fn collection_selection_forces_group_and_persists() {
    init_logging();
    let store = boot(CollectionId::Members);

    let (store, effects) = update(store, Msg::CollectionSelected(CollectionId::Likes));

    let view = store.view();
    assert_eq!(view.active_collection, Some(CollectionId::Likes));
    assert_eq!(view.active_group, Group::Activity);
    assert!(effects.contains(&Effect::PersistSelection {
        collection: Some(CollectionId::Likes),
    }));
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::FetchPage {
            collection: CollectionId::Likes,
            reset: true,
            ..
        }
    )));
}

#[test]
fn group_consistency_holds_in_every_reached_state() {
    init_logging();
    let mut store = boot(CollectionId::Members);
    let steps: Vec<Msg<&'static str>> = vec![
        Msg::CollectionSelected(CollectionId::Posts),
        Msg::GroupSelected(Group::Membership),
        Msg::CollectionSelected(CollectionId::ContestWinners),
        Msg::ProjectSelected(9),
        Msg::GroupSelected(Group::Other),
    ];

    for msg in steps {
        let (next, _) = update(store, msg);
        store = next;
        if let Some(collection) = store.active_collection() {
            assert_eq!(collection.group(), store.active_group());
        }
    }
}

#[test]
fn project_switch_resets_state_atomically() {
    init_logging();
    let store = boot(CollectionId::Members);
    let (store, _) = update(
        store,
        Msg::FilterChanged(FilterUpdate::Quality(QualityFilter::Banned)),
    );
    let (store, _) = update(store, Msg::SearchChanged("alice".to_string()));
    let store = deliver_reset_page(store, 50);
    assert_eq!(store.view().items.len(), 50);

    let (store, effects) = update(store, Msg::ProjectSelected(8));

    let view = store.view();
    assert_eq!(view.project, Some(8));
    assert!(view.search.is_empty());
    assert_eq!(view.filters.quality, QualityFilter::Any);
    assert!(view.items.is_empty());
    assert_eq!(view.page, 1);
    assert!(!view.initial_loaded);
    assert!(view.refresh.is_empty());
    // The persisted selection survives the switch, re-validated by group.
    assert_eq!(view.active_collection, Some(CollectionId::Members));
    assert_eq!(view.active_group, Group::Membership);
    assert!(effects.iter().any(|effect| matches!(
        effect,
        Effect::ListActiveTasks { project: 8, .. }
    )));
}

#[test]
fn stale_response_after_project_switch_is_discarded() {
    init_logging();
    let store = boot(CollectionId::Members);
    let old_marker = store.marker();

    // Project changes while the old fetch is still in flight.
    let (store, _) = update(store, Msg::ProjectSelected(8));
    let (store, effects) = update(
        store,
        Msg::PageLoaded {
            marker: old_marker,
            collection: CollectionId::Members,
            page: 1,
            reset: true,
            items: vec!["stale"; 50],
            total_count: 50,
        },
    );

    assert!(store.view().items.is_empty());
    assert!(!store.view().initial_loaded);
    assert!(effects.is_empty());
}

#[test]
fn fetch_failure_preserves_loaded_items() {
    init_logging();
    let store = boot(CollectionId::Members);
    let store = deliver_reset_page(store, 50);
    let marker = store.marker();

    let (store, effects) = update(
        store,
        Msg::PageFailed {
            marker,
            collection: CollectionId::Members,
            reset: false,
            error: "server unavailable".to_string(),
        },
    );

    let view = store.view();
    assert_eq!(view.items.len(), 50);
    assert_eq!(view.last_error.as_deref(), Some("server unavailable"));
    assert!(!view.loading_more);
    assert!(effects.is_empty());
}
