// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cadence state machine.
//!
//! `active hours x recent activity x over budget -> {tight, normal, wide}`,
//! recomputed on every tick. No mode is persisted beyond the last computed
//! interval value on the checkpoint.

use chrono::{DateTime, Timelike, Utc};
use vigil_config::model::SchedulerConfig;

/// Scan cadence for one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Active hours with recent activity.
    Tight,
    /// Outside active hours with recent activity.
    Normal,
    /// Inactive conversation or throttled subject.
    Wide,
}

/// Whether `now` falls within configured active hours (UTC).
///
/// Handles overnight ranges: start 22, end 6 means 22:00-06:00.
pub fn in_active_hours(now: DateTime<Utc>, config: &SchedulerConfig) -> bool {
    let hour = now.hour() as u8;
    if config.active_hours_start <= config.active_hours_end {
        hour >= config.active_hours_start && hour < config.active_hours_end
    } else {
        hour >= config.active_hours_start || hour < config.active_hours_end
    }
}

/// Compute the cadence for one conversation.
///
/// Order matters: budget throttling forces `Wide` unconditionally, and a
/// conversation inactive beyond the threshold is `Wide` regardless of active
/// hours.
pub fn cadence(
    now: DateTime<Utc>,
    last_activity_at: Option<DateTime<Utc>>,
    over_soft_limit: bool,
    config: &SchedulerConfig,
) -> Cadence {
    if over_soft_limit {
        return Cadence::Wide;
    }

    let inactive = match last_activity_at {
        Some(at) => (now - at).num_minutes() >= config.inactivity_threshold_mins as i64,
        None => true,
    };
    if inactive {
        return Cadence::Wide;
    }

    if in_active_hours(now, config) {
        Cadence::Tight
    } else {
        Cadence::Normal
    }
}

/// Minutes between Tier-1 passes for a cadence.
pub fn interval_mins(cadence: Cadence, config: &SchedulerConfig) -> u32 {
    match cadence {
        Cadence::Tight => config.tight_interval_mins,
        Cadence::Normal => config.normal_interval_mins,
        Cadence::Wide => config.wide_interval_mins,
    }
}

/// The optimal Tier-1 interval for one conversation, in minutes.
pub fn optimal_interval(
    now: DateTime<Utc>,
    last_activity_at: Option<DateTime<Utc>>,
    over_soft_limit: bool,
    config: &SchedulerConfig,
) -> u32 {
    interval_mins(cadence(now, last_activity_at, over_soft_limit, config), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> SchedulerConfig {
        // Defaults: active hours 8-22, inactivity threshold 30,
        // tight/normal/wide = 5/15/60.
        SchedulerConfig::default()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn active_hours_recent_activity_is_tight() {
        let now = at(14, 0);
        let activity = Some(at(13, 50));
        assert_eq!(cadence(now, activity, false, &config()), Cadence::Tight);
        assert_eq!(optimal_interval(now, activity, false, &config()), 5);
    }

    #[test]
    fn off_hours_recent_activity_is_normal() {
        let now = at(23, 30);
        let activity = Some(at(23, 20));
        assert_eq!(cadence(now, activity, false, &config()), Cadence::Normal);
        assert_eq!(optimal_interval(now, activity, false, &config()), 15);
    }

    #[test]
    fn inactivity_forces_wide_regardless_of_active_hours() {
        // 45 minutes of silence, outside active hours: wide wins over the
        // active-hours branch.
        let now = at(23, 0);
        let activity = Some(at(22, 15));
        assert_eq!(cadence(now, activity, false, &config()), Cadence::Wide);

        // Same silence during active hours: still wide.
        let now = at(14, 0);
        let activity = Some(at(13, 15));
        assert_eq!(cadence(now, activity, false, &config()), Cadence::Wide);
        assert_eq!(optimal_interval(now, activity, false, &config()), 60);
    }

    #[test]
    fn over_budget_forces_wide_unconditionally() {
        // Active hours, activity seconds ago: budget throttling still wins.
        let now = at(14, 0);
        let activity = Some(at(13, 59));
        assert_eq!(cadence(now, activity, true, &config()), Cadence::Wide);
    }

    #[test]
    fn never_active_conversation_is_wide() {
        assert_eq!(cadence(at(14, 0), None, false, &config()), Cadence::Wide);
    }

    #[test]
    fn threshold_boundary() {
        let now = at(14, 30);
        // 29 minutes ago: still recent.
        assert_eq!(
            cadence(now, Some(at(14, 1)), false, &config()),
            Cadence::Tight
        );
        // Exactly 30 minutes ago: inactive.
        assert_eq!(
            cadence(now, Some(at(14, 0)), false, &config()),
            Cadence::Wide
        );
    }

    #[test]
    fn active_hours_boundaries() {
        let cfg = config();
        assert!(in_active_hours(at(8, 0), &cfg), "start is inclusive");
        assert!(in_active_hours(at(21, 59), &cfg));
        assert!(!in_active_hours(at(22, 0), &cfg), "end is exclusive");
        assert!(!in_active_hours(at(7, 59), &cfg));
    }

    #[test]
    fn overnight_active_hours_wrap() {
        let mut cfg = config();
        cfg.active_hours_start = 22;
        cfg.active_hours_end = 6;
        assert!(in_active_hours(at(23, 0), &cfg));
        assert!(in_active_hours(at(3, 0), &cfg));
        assert!(!in_active_hours(at(12, 0), &cfg));
    }
}
