//! Persisted trigger records.
//!
//! Trigger configuration is written as a flat list of records on every
//! mutation of the trigger table so that restarts can rehydrate triggers. The
//! persisted shape carries no kind tag; the variant is inferred from field
//! presence, so deserialization is untagged with the more specific schedule
//! record tried first.

use serde::{Deserialize, Serialize};

/// Firing mode of a schedule trigger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    /// Fire whenever the configured number of seconds elapsed since the last fire.
    Interval,
    /// Fire once per calendar day at the configured wall-clock time.
    Daily,
}

/// Configuration of a timer-driven trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleTriggerConfig {
    /// Unique key in the trigger table.
    pub trigger_id: String,
    /// Flow document invoked on fire.
    pub flow_path: String,
    /// Interval or daily mode.
    pub schedule_type: ScheduleKind,
    /// Interval mode: seconds between fires.
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Daily mode: `HH:MM` wall-clock time.
    #[serde(default = "default_daily_time")]
    pub daily_time: String,
}

fn default_interval_seconds() -> u64 {
    3600
}

fn default_daily_time() -> String {
    "09:00".into()
}

/// Configuration of a new-file-detection trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolderWatchTriggerConfig {
    /// Unique key in the trigger table.
    pub trigger_id: String,
    /// Flow document invoked on fire.
    pub flow_path: String,
    /// Directory whose contents are polled.
    pub watch_folder: String,
    /// Glob pattern matched against file names in the watched folder.
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
}

fn default_file_pattern() -> String {
    "*".into()
}

/// A persisted trigger record, polymorphic over the two trigger kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TriggerConfig {
    /// Timer-driven trigger.
    Schedule(ScheduleTriggerConfig),
    /// New-file-detection trigger.
    FolderWatch(FolderWatchTriggerConfig),
}

impl TriggerConfig {
    /// Unique key in the trigger table.
    pub fn trigger_id(&self) -> &str {
        match self {
            TriggerConfig::Schedule(c) => &c.trigger_id,
            TriggerConfig::FolderWatch(c) => &c.trigger_id,
        }
    }

    /// Flow document invoked on fire.
    pub fn flow_path(&self) -> &str {
        match self {
            TriggerConfig::Schedule(c) => &c.flow_path,
            TriggerConfig::FolderWatch(c) => &c.flow_path,
        }
    }
}
