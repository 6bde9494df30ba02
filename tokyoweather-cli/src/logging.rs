use std::fmt;

use tokyoweather_core::clock;
use tracing_subscriber::{
    EnvFilter,
    fmt::{format::Writer, time::FormatTime},
};

/// Log timestamps in JST, millisecond precision, e.g. `2025-11-19T15:42:07.123+09:00`.
struct JstTime;

impl FormatTime for JstTime {
    fn format_time(&self, w: &mut Writer<'_>) -> Result<(), fmt::Error> {
        write!(w, "{}", clock::now_jst().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `-v` flags.
///
/// Logs go to stderr so they never mix with the report on stdout.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(JstTime)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
