//! Cohort engine: remote platform IO and task observation.
mod api;
mod engine;
mod http;

pub use api::{
    ApiError, ApiSettings, MetaData, PageData, PageQuery, PlatformApi, Record, StatsBucketData,
    StatsData, StatsParams, TaskRequest, TaskState, TaskTick,
};
pub use engine::{EngineCommand, EngineEvent, EngineHandle};
pub use http::HttpApi;
