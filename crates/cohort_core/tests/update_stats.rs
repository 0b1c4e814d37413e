use std::sync::Once;

use cohort_core::{
    update, CanMessage, CollectionId, Effect, FilterUpdate, Msg, SessionStore, StatsGroupBy,
    StatsPeriod, StatsQuery,
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

fn stats_effect(effects: &[Effect]) -> Option<&StatsQuery> {
    effects.iter().find_map(|effect| match effect {
        Effect::FetchStats { query, .. } => Some(query),
        _ => None,
    })
}

#[test]
fn period_change_remaps_invalid_grouping() {
    init_logging();
    let store = boot(CollectionId::Members);

    // Month admits week grouping.
    let (store, _) = update(store, Msg::StatsGroupByChanged(StatsGroupBy::Week));
    assert_eq!(store.view().stats_query.group_by, StatsGroupBy::Week);

    // Week does not; the grouping falls back to day.
    let (store, effects) = update(store, Msg::StatsPeriodChanged(StatsPeriod::Week));
    assert_eq!(store.view().stats_query.group_by, StatsGroupBy::Day);
    assert_eq!(
        stats_effect(&effects).expect("stats fetch").group_by,
        StatsGroupBy::Day
    );

    // Year does not admit day; month is the deterministic fallback.
    let (store, _) = update(store, Msg::StatsPeriodChanged(StatsPeriod::Year));
    assert_eq!(store.view().stats_query.group_by, StatsGroupBy::Month);
}

#[test]
fn group_by_stays_in_allowed_set_for_every_period_change() {
    init_logging();
    let periods = [
        StatsPeriod::Week,
        StatsPeriod::Month,
        StatsPeriod::Quarter,
        StatsPeriod::Year,
        StatsPeriod::All,
        StatsPeriod::Custom,
    ];
    let group_bys = [
        StatsGroupBy::Day,
        StatsGroupBy::Week,
        StatsGroupBy::Month,
        StatsGroupBy::Quarter,
        StatsGroupBy::Year,
    ];

    for start in group_bys {
        for period in periods {
            let mut query = StatsQuery {
                group_by: start,
                ..StatsQuery::default()
            };
            query.set_period(period);
            assert!(
                period.allowed_group_bys().contains(&query.group_by),
                "period {period:?} left invalid grouping {:?}",
                query.group_by
            );
        }
    }
}

#[test]
fn invalid_group_by_change_is_ignored() {
    init_logging();
    let store = boot(CollectionId::Members);
    let (store, _) = update(store, Msg::StatsPeriodChanged(StatsPeriod::Week));

    let (store, _) = update(store, Msg::StatsGroupByChanged(StatsGroupBy::Month));
    assert_eq!(store.view().stats_query.group_by, StatsGroupBy::Day);
}

#[test]
fn custom_period_waits_for_both_bounds() {
    init_logging();
    let store = boot(CollectionId::Members);

    let (store, effects) = update(store, Msg::StatsPeriodChanged(StatsPeriod::Custom));
    assert!(stats_effect(&effects).is_none());

    let (store, effects) = update(
        store,
        Msg::StatsBoundsChanged {
            date_from: Some("2026-01-01".to_string()),
            date_to: None,
        },
    );
    assert!(stats_effect(&effects).is_none());

    let (_store, effects) = update(
        store,
        Msg::StatsBoundsChanged {
            date_from: Some("2026-01-01".to_string()),
            date_to: Some("2026-02-01".to_string()),
        },
    );
    let query = stats_effect(&effects).expect("stats fetch");
    assert_eq!(query.date_from.as_deref(), Some("2026-01-01"));
    assert_eq!(query.date_to.as_deref(), Some("2026-02-01"));
}

#[test]
fn automation_collections_are_statistics_less() {
    init_logging();
    let store = boot(CollectionId::Members);

    let (store, effects) = update(store, Msg::CollectionSelected(CollectionId::MailingTargets));

    assert!(stats_effect(&effects).is_none());
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::FetchPage { .. })));
    assert_eq!(store.view().stats, None);
}

#[test]
fn can_message_filter_refetches_both_page_and_stats() {
    init_logging();
    let store = boot(CollectionId::Members);

    let (_store, effects) = update(
        store,
        Msg::FilterChanged(FilterUpdate::CanMessage(CanMessage::Yes)),
    );

    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::FetchPage { reset: true, .. })));
    let query = stats_effect(&effects).expect("stats fetch");
    assert_eq!(query.can_write, Some(true));
}
