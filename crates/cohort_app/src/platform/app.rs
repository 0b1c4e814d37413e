use std::path::PathBuf;
use std::sync::mpsc;

use cohort_core::{update, Msg, ProjectId, SessionStore};
use cohort_engine::{ApiSettings, Record};
use cohort_logging::{cohort_debug, cohort_info};

use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::persistence;

/// Runs the session loop for one project: restore the persisted selection,
/// select the project, then dispatch engine completions until the engine
/// side hangs up.
pub fn run_app(project: ProjectId) -> anyhow::Result<()> {
    logging::initialize(LogDestination::File);

    let state_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let settings = settings_from_env();
    let (msg_tx, msg_rx) = mpsc::channel::<Msg<Record>>();
    let runner = EffectRunner::new(msg_tx, settings, state_dir.clone())?;

    let mut shell = Shell::new(runner);
    shell.dispatch(Msg::SessionRestored {
        collection: persistence::load_selection(&state_dir),
    });
    shell.dispatch(Msg::ProjectSelected(project));
    cohort_info!("session started for project {}", project);

    loop {
        let msg = msg_rx.recv()?;
        shell.dispatch(msg);
    }
}

fn settings_from_env() -> ApiSettings {
    let mut settings = match std::env::var("COHORT_API_URL") {
        Ok(base_url) => ApiSettings::new(base_url),
        Err(_) => ApiSettings::default(),
    };
    settings.access_token = std::env::var("COHORT_API_TOKEN").ok();
    settings
}

/// Owns the session store and threads every message through the pure
/// update function, running the effects it returns.
struct Shell {
    store: SessionStore<Record>,
    runner: EffectRunner,
    dispatch_seq: u64,
}

impl Shell {
    fn new(runner: EffectRunner) -> Self {
        Self {
            store: SessionStore::default(),
            runner,
            dispatch_seq: 0,
        }
    }

    fn dispatch(&mut self, msg: Msg<Record>) {
        self.dispatch_seq += 1;
        cohort_logging::set_dispatch_seq(self.dispatch_seq);

        let store = std::mem::take(&mut self.store);
        let (mut store, effects) = update(store, msg);
        let changed = store.consume_dirty();
        self.store = store;

        self.runner.run(effects);

        if changed {
            // Rendering hook: a frontend reads the view model here.
            let view = self.store.view();
            cohort_debug!(
                "view updated: {} items, {} running tasks",
                view.items.len(),
                view.task_count
            );
        }
    }
}
