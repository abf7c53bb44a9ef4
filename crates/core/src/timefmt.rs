//! Time rendering — the two timestamp conventions history lines use.
//!
//! Reconstructed history must keep the same time style the flattened
//! prompt used, or the model sees two conventions mixed in one request.
//! Assembly picks the mode by scanning the prompt; this module renders it.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp rendering convention of a flattened prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// "3 minutes ago" style
    Relative,
    /// "14:05:33" today, "06-12 14:05:33" otherwise; never a year
    AbsoluteNoYear,
}

/// Renders unix timestamps for history lines.
pub trait TimeRenderer: Send + Sync {
    fn render(&self, timestamp: f64, mode: TimeMode) -> String;
}

/// Current unix time in seconds.
pub fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Renderer backed by the system clock and local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl TimeRenderer for LocalClock {
    fn render(&self, timestamp: f64, mode: TimeMode) -> String {
        match mode {
            TimeMode::Relative => render_relative(timestamp, unix_now()),
            TimeMode::AbsoluteNoYear => render_absolute(timestamp, Local::now()),
        }
    }
}

/// Relative rendering against `now`. Future timestamps clamp to "just now".
fn render_relative(timestamp: f64, now: f64) -> String {
    let elapsed = (now - timestamp).max(0.0) as u64;
    if elapsed < 10 {
        return "just now".into();
    }

    let (count, unit) = if elapsed < 60 {
        (elapsed, "second")
    } else if elapsed < 3600 {
        (elapsed / 60, "minute")
    } else if elapsed < 86_400 {
        (elapsed / 3600, "hour")
    } else {
        (elapsed / 86_400, "day")
    };

    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

fn render_absolute(timestamp: f64, now: DateTime<Local>) -> String {
    let ts = Local
        .timestamp_opt(timestamp as i64, 0)
        .single()
        .unwrap_or(now);

    if ts.date_naive() == now.date_naive() {
        ts.format("%H:%M:%S").to_string()
    } else {
        ts.format("%m-%d %H:%M:%S").to_string()
    }
}
