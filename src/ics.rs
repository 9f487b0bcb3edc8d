//! iCalendar (RFC 5545) encoder for study plans.
//!
//! Produces one `VCALENDAR` with one `VEVENT` per session:
//!
//! ```text
//! BEGIN:VCALENDAR
//! VERSION:2.0
//! PRODID:-//AI Study Agent//EN
//! X-WR-CALNAME:<name>
//! X-WR-TIMEZONE:<label>
//! BEGIN:VEVENT
//! UID:<id>@ai-study-agent.local
//! DTSTAMP:<utc now>
//! DTSTART:<floating local>
//! DTEND:<floating local>
//! SUMMARY:<title>
//! DESCRIPTION:<description>
//! END:VEVENT
//! END:VCALENDAR
//! ```
//!
//! Text values are escaped before folding. Lines are CRLF-terminated and
//! folded at 75 characters; folding runs per property and once more over
//! the joined document, which is a no-op when every line already fits.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::detect::{check_outbound, GateError};
use crate::ids::IdGenerator;
use crate::models::{StudySession, WeeklyPlan};

pub const PRODUCT_ID: &str = "-//AI Study Agent//EN";
pub const UID_DOMAIN: &str = "ai-study-agent.local";
pub const CONTENT_TYPE: &str = "text/calendar; charset=utf-8";
pub const FILENAME: &str = "study-plan.ics";

/// Maximum characters on one physical line.
pub const FOLD_WIDTH: usize = 75;

const CRLF: &str = "\r\n";

/// Escape a TEXT value: `\` `;` `,` get a backslash, newlines become `\n`.
///
/// `\r\n` and a lone `\r` both count as one newline.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            _ => out.push(c),
        }
    }
    out
}

fn fold_physical(line: &str, out: &mut String) {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= FOLD_WIDTH {
        out.push_str(line);
        return;
    }
    out.extend(&chars[..FOLD_WIDTH]);
    // The leading space counts toward the width of a continuation line.
    for segment in chars[FOLD_WIDTH..].chunks(FOLD_WIDTH - 1) {
        out.push_str(CRLF);
        out.push(' ');
        out.extend(segment);
    }
}

/// Fold every CRLF-separated line of `text` longer than [`FOLD_WIDTH`].
///
/// Already-folded input passes through unchanged.
pub fn fold_line(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / FOLD_WIDTH * 3);
    for (i, line) in text.split(CRLF).enumerate() {
        if i > 0 {
            out.push_str(CRLF);
        }
        fold_physical(line, &mut out);
    }
    out
}

fn text_property(name: &str, value: &str) -> String {
    fold_line(&format!("{}:{}", name, escape_text(value)))
}

fn raw_property(name: &str, value: &str) -> String {
    fold_line(&format!("{}:{}", name, value))
}

/// Encode `events` with the current time as `DTSTAMP`.
pub fn build_calendar(
    calendar_name: &str,
    timezone: &str,
    events: &[StudySession],
    ids: &dyn IdGenerator,
) -> String {
    build_calendar_at(calendar_name, timezone, events, ids, Utc::now())
}

/// Encode `events` with an explicit generation timestamp.
///
/// Everything except the `DTSTAMP` lines is a pure function of the inputs.
/// Events with an empty id get one from `ids`.
pub fn build_calendar_at(
    calendar_name: &str,
    timezone: &str,
    events: &[StudySession],
    ids: &dyn IdGenerator,
    generated_at: DateTime<Utc>,
) -> String {
    let dtstamp = generated_at.format("%Y%m%dT%H%M%SZ").to_string();

    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODUCT_ID),
        text_property("X-WR-CALNAME", calendar_name),
        text_property("X-WR-TIMEZONE", timezone),
    ];

    for ev in events {
        let id = if ev.id.is_empty() {
            ids.next_id()
        } else {
            ev.id.clone()
        };

        lines.push("BEGIN:VEVENT".to_string());
        lines.push(raw_property("UID", &format!("{}@{}", id, UID_DOMAIN)));
        lines.push(format!("DTSTAMP:{}", dtstamp));
        lines.push(raw_property("DTSTART", &ev.start_local));
        lines.push(raw_property("DTEND", &ev.end_local));
        lines.push(text_property("SUMMARY", &ev.title));
        lines.push(text_property("DESCRIPTION", &ev.description));
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());

    let mut doc = fold_line(&lines.join(CRLF));
    doc.push_str(CRLF);
    doc
}

/// Encode a plan and run the result through the outbound gate.
pub fn export_calendar(
    config: &Config,
    plan: &WeeklyPlan,
    ids: &dyn IdGenerator,
) -> Result<String, GateError> {
    let ics = build_calendar(
        &config.planner.calendar_name,
        &plan.timezone,
        &plan.events,
        ids,
    );
    if let Err(e) = check_outbound(&ics, config.output.max_calendar_chars) {
        tracing::warn!(error = %e, "generated calendar rejected");
        return Err(e);
    }
    Ok(ics)
}
