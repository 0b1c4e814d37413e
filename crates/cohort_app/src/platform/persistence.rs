use std::fs;
use std::io::Write;
use std::path::Path;

use cohort_core::CollectionId;
use cohort_logging::{cohort_error, cohort_info, cohort_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = ".cohort_session.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSession {
    last_collection: Option<String>,
}

/// Reads the last-active collection back from disk. A missing file is a
/// fresh session; a corrupt file is logged and treated the same.
pub(crate) fn load_selection(state_dir: &Path) -> Option<CollectionId> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return None;
        }
        Err(err) => {
            cohort_warn!("Failed to read persisted session from {:?}: {}", path, err);
            return None;
        }
    };

    let session: PersistedSession = match ron::from_str(&content) {
        Ok(session) => session,
        Err(err) => {
            cohort_warn!("Failed to parse persisted session from {:?}: {}", path, err);
            return None;
        }
    };

    let collection = session
        .last_collection
        .as_deref()
        .and_then(CollectionId::from_slug);
    cohort_info!("Loaded persisted session from {:?}", path);
    collection
}

pub(crate) fn save_selection(state_dir: &Path, collection: Option<CollectionId>) {
    let session = PersistedSession {
        last_collection: collection.map(|id| id.api_slug().to_string()),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&session, pretty) {
        Ok(text) => text,
        Err(err) => {
            cohort_error!("Failed to serialize persisted session: {}", err);
            return;
        }
    };

    if let Err(err) = write_atomic(state_dir, STATE_FILENAME, &content) {
        cohort_error!(
            "Failed to write persisted session to {:?}: {}",
            state_dir,
            err
        );
    }
}

/// Writes via a temp file in the same directory and renames it into place,
/// so a crash mid-write never leaves a truncated state file.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> std::io::Result<()> {
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.persist(dir.join(filename))?;
    Ok(())
}
