//! Trigger table, polling threads, and persistence.
//!
//! Each running trigger owns one background thread that alternates a firing
//! check with a cancellable wait on an `mpsc` stop channel; a closed channel
//! also ends the loop, so a dropped manager can never leave orphan loops
//! spinning forever. The trigger table is persisted to `triggers.json` in the
//! data directory on every mutation.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;

use chrono::Local;
use flowdeck_types::{FolderWatchTriggerConfig, ScheduleKind, ScheduleTriggerConfig, TriggerConfig};
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::error::TriggerError;
use crate::schedule::{SCHEDULE_POLL, ScheduleState};
use crate::watcher::{FolderWatchState, WATCH_POLL};

/// One trigger firing, handed to the manager's callback.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerFire {
    /// A schedule trigger became due.
    Schedule {
        trigger_id: String,
        flow_path: String,
    },
    /// A watched folder gained a new matching file.
    FolderWatch {
        trigger_id: String,
        flow_path: String,
        new_file: PathBuf,
    },
}

impl TriggerFire {
    /// Flow document the firing asks to run.
    pub fn flow_path(&self) -> &str {
        match self {
            TriggerFire::Schedule { flow_path, .. } => flow_path,
            TriggerFire::FolderWatch { flow_path, .. } => flow_path,
        }
    }
}

/// Callback invoked on the trigger's own thread for every firing.
pub type TriggerCallback = Arc<dyn Fn(TriggerFire) + Send + Sync>;

struct RunningTrigger {
    config: TriggerConfig,
    worker: Option<Worker>,
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Table of registered triggers with lifecycle control.
pub struct TriggerManager {
    records_path: PathBuf,
    triggers: IndexMap<String, RunningTrigger>,
    callback: TriggerCallback,
}

impl TriggerManager {
    /// Creates a manager persisting its records under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, callback: TriggerCallback) -> Self {
        Self {
            records_path: data_dir.into().join("triggers.json"),
            triggers: IndexMap::new(),
            callback,
        }
    }

    /// Registers a schedule trigger. Daily schedules must carry a valid
    /// `HH:MM` time.
    pub fn add_schedule(&mut self, config: ScheduleTriggerConfig) -> Result<(), TriggerError> {
        if config.schedule_type == ScheduleKind::Daily && ScheduleState::parse_daily_time(&config.daily_time).is_none() {
            return Err(TriggerError::InvalidDailyTime(config.daily_time));
        }
        self.insert(TriggerConfig::Schedule(config))
    }

    /// Registers a folder-watch trigger.
    pub fn add_folder_watch(&mut self, config: FolderWatchTriggerConfig) -> Result<(), TriggerError> {
        self.insert(TriggerConfig::FolderWatch(config))
    }

    fn insert(&mut self, config: TriggerConfig) -> Result<(), TriggerError> {
        let trigger_id = config.trigger_id().to_string();
        if self.triggers.contains_key(&trigger_id) {
            return Err(TriggerError::DuplicateTrigger(trigger_id));
        }
        info!(trigger = %trigger_id, "trigger registered");
        self.triggers.insert(trigger_id, RunningTrigger { config, worker: None });
        self.persist()
    }

    /// Stops and removes a trigger.
    pub fn remove(&mut self, trigger_id: &str) -> Result<(), TriggerError> {
        let Some(mut trigger) = self.triggers.shift_remove(trigger_id) else {
            return Err(TriggerError::UnknownTrigger(trigger_id.to_string()));
        };
        stop_worker(&mut trigger.worker);
        info!(trigger = %trigger_id, "trigger removed");
        self.persist()
    }

    /// Starts a polling thread for every trigger not already running.
    pub fn start_all(&mut self) {
        for trigger in self.triggers.values_mut() {
            if trigger.worker.is_some() {
                continue;
            }
            trigger.worker = Some(spawn_worker(&trigger.config, self.callback.clone()));
        }
    }

    /// Stops every running trigger and waits for its thread to exit.
    pub fn stop_all(&mut self) {
        for trigger in self.triggers.values_mut() {
            stop_worker(&mut trigger.worker);
        }
    }

    /// Snapshot of all registered trigger records, in registration order.
    pub fn records(&self) -> Vec<TriggerConfig> {
        self.triggers.values().map(|trigger| trigger.config.clone()).collect()
    }

    /// Rehydrates the trigger table from the persisted record file. Missing
    /// file means an empty table; triggers are registered stopped.
    pub fn load(&mut self) -> Result<(), TriggerError> {
        let text = match fs::read_to_string(&self.records_path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(TriggerError::Persist {
                    path: self.records_path.clone(),
                    source,
                });
            }
        };
        let records: Vec<TriggerConfig> = serde_json::from_str(&text).map_err(|source| TriggerError::Parse {
            path: self.records_path.clone(),
            source,
        })?;
        for record in records {
            let trigger_id = record.trigger_id().to_string();
            if self.triggers.contains_key(&trigger_id) {
                warn!(trigger = %trigger_id, "skipping duplicate persisted trigger record");
                continue;
            }
            self.triggers.insert(trigger_id, RunningTrigger { config: record, worker: None });
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), TriggerError> {
        let records = self.records();
        let rendered = serde_json::to_string_pretty(&records).map_err(|source| TriggerError::Parse {
            path: self.records_path.clone(),
            source,
        })?;
        fs::write(&self.records_path, rendered).map_err(|source| TriggerError::Persist {
            path: self.records_path.clone(),
            source,
        })
    }
}

impl Drop for TriggerManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn stop_worker(worker: &mut Option<Worker>) {
    if let Some(worker) = worker.take() {
        let _ = worker.stop.send(());
        let _ = worker.handle.join();
    }
}

fn spawn_worker(config: &TriggerConfig, callback: TriggerCallback) -> Worker {
    let (stop, stop_rx) = mpsc::channel::<()>();
    let handle = match config {
        TriggerConfig::Schedule(config) => {
            let mut state = ScheduleState::new(config.clone());
            std::thread::spawn(move || {
                loop {
                    let now = Local::now();
                    if state.due(now) {
                        state.mark_fired(now);
                        let config = state.config();
                        info!(trigger = %config.trigger_id, flow = %config.flow_path, "schedule trigger fired");
                        callback(TriggerFire::Schedule {
                            trigger_id: config.trigger_id.clone(),
                            flow_path: config.flow_path.clone(),
                        });
                    }
                    match stop_rx.recv_timeout(SCHEDULE_POLL) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
            })
        }
        TriggerConfig::FolderWatch(config) => {
            let mut state = FolderWatchState::new(config.clone());
            std::thread::spawn(move || {
                state.snapshot();
                loop {
                    match stop_rx.recv_timeout(WATCH_POLL) {
                        Err(RecvTimeoutError::Timeout) => {}
                        _ => break,
                    }
                    for new_file in state.poll() {
                        let config = state.config();
                        info!(trigger = %config.trigger_id, file = %new_file.display(), "folder watch trigger fired");
                        callback(TriggerFire::FolderWatch {
                            trigger_id: config.trigger_id.clone(),
                            flow_path: config.flow_path.clone(),
                            new_file,
                        });
                    }
                }
            })
        }
    };
    Worker { stop, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn null_callback() -> TriggerCallback {
        Arc::new(|_| {})
    }

    fn schedule(id: &str, kind: ScheduleKind, interval: u64, daily: &str) -> ScheduleTriggerConfig {
        ScheduleTriggerConfig {
            trigger_id: id.into(),
            flow_path: "flows/demo.yaml".into(),
            schedule_type: kind,
            interval_seconds: interval,
            daily_time: daily.into(),
        }
    }

    #[test]
    fn records_persist_and_reload_across_managers() {
        let dir = tempfile::tempdir().expect("tempdir");

        let mut manager = TriggerManager::new(dir.path(), null_callback());
        manager
            .add_schedule(schedule("nightly", ScheduleKind::Daily, 3600, "02:30"))
            .expect("add schedule");
        manager
            .add_folder_watch(FolderWatchTriggerConfig {
                trigger_id: "inbox".into(),
                flow_path: "flows/import.yaml".into(),
                watch_folder: "/data/inbox".into(),
                file_pattern: "*.csv".into(),
            })
            .expect("add watch");
        drop(manager);

        let mut restored = TriggerManager::new(dir.path(), null_callback());
        restored.load().expect("load records");
        let records = restored.records();
        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], TriggerConfig::Schedule(c) if c.trigger_id == "nightly"));
        assert!(matches!(&records[1], TriggerConfig::FolderWatch(c) if c.file_pattern == "*.csv"));
    }

    #[test]
    fn duplicate_ids_and_unknown_removals_are_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manager = TriggerManager::new(dir.path(), null_callback());
        manager
            .add_schedule(schedule("t", ScheduleKind::Interval, 60, "09:00"))
            .expect("first add");

        let duplicate = manager.add_schedule(schedule("t", ScheduleKind::Interval, 60, "09:00"));
        assert!(matches!(duplicate, Err(TriggerError::DuplicateTrigger(_))));

        let unknown = manager.remove("nope");
        assert!(matches!(unknown, Err(TriggerError::UnknownTrigger(_))));

        manager.remove("t").expect("remove registered trigger");
        assert!(manager.records().is_empty());
    }

    #[test]
    fn invalid_daily_time_is_rejected_at_registration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut manager = TriggerManager::new(dir.path(), null_callback());
        let result = manager.add_schedule(schedule("bad", ScheduleKind::Daily, 3600, "25:99"));
        assert!(matches!(result, Err(TriggerError::InvalidDailyTime(_))));
        assert!(manager.records().is_empty());
    }

    #[test]
    fn interval_trigger_fires_immediately_after_start() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fired: Arc<Mutex<Vec<TriggerFire>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        let callback: TriggerCallback = Arc::new(move |fire| sink.lock().expect("lock").push(fire));

        let mut manager = TriggerManager::new(dir.path(), callback);
        manager
            .add_schedule(schedule("fast", ScheduleKind::Interval, 3600, "09:00"))
            .expect("add");
        manager.start_all();

        // first due-check happens before the first poll sleep
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        loop {
            if !fired.lock().expect("lock").is_empty() {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "trigger never fired");
            std::thread::sleep(Duration::from_millis(20));
        }
        manager.stop_all();

        let fired = fired.lock().expect("lock");
        assert_eq!(
            fired[0],
            TriggerFire::Schedule {
                trigger_id: "fast".into(),
                flow_path: "flows/demo.yaml".into(),
            }
        );
    }
}
