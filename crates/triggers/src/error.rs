use std::path::PathBuf;

/// Errors from trigger registration and persistence.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// A daily schedule carried a time that is not `HH:MM`.
    #[error("invalid daily time '{0}', expected HH:MM")]
    InvalidDailyTime(String),

    /// A trigger id was registered twice.
    #[error("trigger id already registered: '{0}'")]
    DuplicateTrigger(String),

    /// An operation referenced an id that is not registered.
    #[error("no such trigger: '{0}'")]
    UnknownTrigger(String),

    /// The trigger record file could not be read or written.
    #[error("failed to persist trigger records to {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The trigger record file holds unparseable content.
    #[error("failed to parse trigger records in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
