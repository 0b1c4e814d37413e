mod app;
mod effects;
mod logging;
mod persistence;

pub use app::run_app;
