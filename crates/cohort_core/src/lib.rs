//! Cohort core: pure session state machine and view-model helpers.
mod collections;
mod effect;
mod msg;
mod query;
mod store;
mod tasks;
mod update;
mod view_model;

pub use collections::{CollectionId, CollectionKind, Group};
pub use effect::{Effect, TaskParams};
pub use msg::Msg;
pub use query::{
    AgeBracket, CanMessage, FilterUpdate, Filters, IsoDate, OnlineRecency, PlatformFilter,
    QualityFilter, QueryShape, SexFilter, StatsBucket, StatsGroupBy, StatsPeriod, StatsQuery,
    StatsSnapshot, PAGE_SIZE,
};
pub use store::{Marker, ProjectId, ProjectMeta, SessionStore};
pub use tasks::{
    progress_label, RefreshKey, RefreshStatusEntry, TaskHandle, TaskId, TaskStatus, TaskType,
};
pub use update::update;
pub use view_model::{RefreshRowView, SessionViewModel};
