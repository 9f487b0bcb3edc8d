//! Deterministic weekly study planner.
//!
//! Produces `sessions_per_week` sessions starting on the anchor date at
//! 19:00 local time, spaced `floor(7 / sessions_per_week)` days apart. For
//! counts that do not divide 7 the sessions bunch toward the start of the
//! week (3 per week lands on days 0, 2, 4); that spacing is kept as is.
//!
//! Start and end are floating local times (`YYYYMMDDTHHMMSS`). The
//! timezone is only a label carried into the description and calendar
//! metadata; no conversion happens.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::config::Config;
use crate::detect::detect;
use crate::ics::export_calendar;
use crate::ids::{IdGenerator, RandomIds};
use crate::models::{StudySession, WeeklyPlan};

/// Goals are cut to this many characters before being embedded.
pub const MAX_GOAL_CHARS: usize = 240;

/// Hour of day every session starts.
pub const SESSION_START_HOUR: u32 = 19;

const FLOATING_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Everything needed to build a [`WeeklyPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub goals: String,
    pub start_date_iso: String,
    pub timezone: String,
    pub session_minutes: u32,
    pub sessions_per_week: u32,
}

/// Request-shape limits applied at the edges (HTTP and CLI).
pub fn validate_plan_request(req: &PlanRequest) -> Result<()> {
    let goals_len = req.goals.chars().count();
    if !(3..=MAX_GOAL_CHARS).contains(&goals_len) {
        bail!("goals must be 3..={} characters", MAX_GOAL_CHARS);
    }
    let tz_len = req.timezone.chars().count();
    if !(3..=80).contains(&tz_len) {
        bail!("timezone must be 3..=80 characters");
    }
    if !(15..=180).contains(&req.session_minutes) {
        bail!("sessionMinutes must be in [15, 180]");
    }
    if !(1..=7).contains(&req.sessions_per_week) {
        bail!("sessionsPerWeek must be in [1, 7]");
    }
    parse_anchor_date(&req.start_date_iso)?;
    Ok(())
}

/// Calendar date of an ISO-8601 start value.
///
/// Accepts an RFC 3339 date-time (the date is taken as written, ignoring the
/// offset), a date-time without offset, or a bare `YYYY-MM-DD` date.
pub fn parse_anchor_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("startDateISO is not an ISO-8601 date or date-time: {:?}", value))
}

/// Days between consecutive sessions.
pub fn session_spacing_days(sessions_per_week: u32) -> u32 {
    7 / sessions_per_week.max(1)
}

fn truncate_goals(goals: &str) -> String {
    goals.trim().chars().take(MAX_GOAL_CHARS).collect()
}

/// Build the week of sessions described by `req`.
pub fn build_weekly_plan(req: &PlanRequest, ids: &dyn IdGenerator) -> Result<WeeklyPlan> {
    if req.session_minutes == 0 {
        bail!("sessionMinutes must be > 0");
    }

    let anchor = parse_anchor_date(&req.start_date_iso)?
        .and_hms_opt(SESSION_START_HOUR, 0, 0)
        .context("invalid session start time")?;
    let goals = truncate_goals(&req.goals);
    let spacing = session_spacing_days(req.sessions_per_week);

    let mut events = Vec::with_capacity(req.sessions_per_week as usize);
    for i in 0..req.sessions_per_week {
        let offset_days = i64::from(i * spacing);
        let start = anchor
            .checked_add_signed(Duration::days(offset_days))
            .context("session date out of range")?;
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(req.session_minutes)))
            .context("session end out of range")?;

        events.push(StudySession {
            id: ids.next_id(),
            title: format!("Study: {}", goals),
            description: format!(
                "Focus goal: {}\nPlan: 10m review → 35m deep work → 10m recap → 5m next steps.\nTimezone label: {}",
                goals, req.timezone
            ),
            start_local: start.format(FLOATING_FORMAT).to_string(),
            end_local: end.format(FLOATING_FORMAT).to_string(),
        });
    }

    Ok(WeeklyPlan {
        timezone: req.timezone.clone(),
        events,
    })
}

/// Arguments of the `study plan` command.
#[derive(Debug, Clone)]
pub struct PlanArgs {
    pub goals: String,
    pub start: String,
    pub timezone: Option<String>,
    pub minutes: Option<u32>,
    pub sessions: Option<u32>,
    pub output: Option<PathBuf>,
}

/// CLI entry point: build a plan and write the gated calendar.
pub fn run_plan(config: &Config, args: PlanArgs) -> Result<()> {
    let req = PlanRequest {
        goals: args.goals,
        start_date_iso: args.start,
        timezone: args
            .timezone
            .unwrap_or_else(|| config.planner.default_timezone.clone()),
        session_minutes: args
            .minutes
            .unwrap_or(config.planner.default_session_minutes),
        sessions_per_week: args
            .sessions
            .unwrap_or(config.planner.default_sessions_per_week),
    };
    validate_plan_request(&req)?;

    let goals_risk = detect(&req.goals);
    if goals_risk.blocked {
        bail!(
            "goals blocked for safety (matched {})",
            goals_risk.matched.join(", ")
        );
    }

    let plan = build_weekly_plan(&req, &RandomIds)?;
    let ics = export_calendar(config, &plan, &RandomIds)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &ics)
                .with_context(|| format!("Failed to write calendar: {}", path.display()))?;
            println!(
                "Wrote {} sessions to {}",
                plan.events.len(),
                path.display()
            );
        }
        None => print!("{}", ics),
    }
    Ok(())
}
