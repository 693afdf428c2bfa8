//! Schedule trigger firing decisions.
//!
//! Pure state: [`ScheduleState::due`] takes the current time as an argument,
//! so firing behavior is testable without threads or a real clock.

use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use flowdeck_types::{ScheduleKind, ScheduleTriggerConfig};

/// Poll period of the schedule trigger loop.
pub const SCHEDULE_POLL: Duration = Duration::from_secs(10);

/// Firing state of one schedule trigger.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    config: ScheduleTriggerConfig,
    last_fired: Option<DateTime<Local>>,
}

impl ScheduleState {
    pub fn new(config: ScheduleTriggerConfig) -> Self {
        Self { config, last_fired: None }
    }

    pub fn config(&self) -> &ScheduleTriggerConfig {
        &self.config
    }

    /// Parses an `HH:MM` daily time.
    pub fn parse_daily_time(text: &str) -> Option<(u32, u32)> {
        let (hour, minute) = text.split_once(':')?;
        let hour: u32 = hour.trim().parse().ok()?;
        let minute: u32 = minute.trim().parse().ok()?;
        (hour < 24 && minute < 60).then_some((hour, minute))
    }

    /// Whether the trigger should fire at `now`.
    ///
    /// Interval mode fires immediately on the first check and then whenever
    /// the configured period elapsed since the last fire. Daily mode fires
    /// during the configured minute, at most once per calendar day.
    pub fn due(&self, now: DateTime<Local>) -> bool {
        match self.config.schedule_type {
            ScheduleKind::Interval => match self.last_fired {
                None => true,
                Some(last) => {
                    let elapsed = now.signed_duration_since(last);
                    elapsed.num_seconds() >= self.config.interval_seconds as i64
                }
            },
            ScheduleKind::Daily => {
                let Some((hour, minute)) = Self::parse_daily_time(&self.config.daily_time) else {
                    return false;
                };
                if now.hour() != hour || now.minute() != minute {
                    return false;
                }
                match self.last_fired {
                    None => true,
                    Some(last) => last.date_naive() < now.date_naive(),
                }
            }
        }
    }

    /// Records a fire at `now`.
    pub fn mark_fired(&mut self, now: DateTime<Local>) {
        self.last_fired = Some(now);
    }
}
