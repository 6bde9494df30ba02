//! Japan Standard Time as a plain UTC+9 offset.
//!
//! Japan observes no daylight saving, so a [`FixedOffset`] is enough and no
//! timezone database is needed.

use chrono::{DateTime, FixedOffset, Utc};

/// UTC+9 in seconds.
pub const JST_OFFSET_SECS: i32 = 9 * 3600;

pub const ZONE_LABEL: &str = "JST";

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("UTC+9 is a valid offset")
}

pub fn now_jst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// Render an instant as `YYYY-MM-DD HH:MM:SS JST`.
///
/// The instant is shifted to UTC+9 first, whatever offset it carries. `None`
/// renders the current time.
pub fn format_jst(instant: Option<DateTime<FixedOffset>>) -> String {
    let instant = instant.unwrap_or_else(now_jst).with_timezone(&jst());
    format!("{} {ZONE_LABEL}", instant.format("%Y-%m-%d %H:%M:%S"))
}
