//! Console logging for the bridge
//!
//! Lines go to stdout as `2024-05-01 12:00:00,123 [JVM: INFO] message`.
//! The default level is `INFO`; [`set_level`] changes it at any time.

use std::io::Write;

use chrono::Local;
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};

/// Install the bridge logger at `INFO`. Calling it again only resets the level.
pub fn init() {
    init_with_level(LevelFilter::Info);
}

/// Install the bridge logger at `level`.
///
/// If another logger is already installed it is kept and only the maximum
/// level is updated.
pub fn init_with_level(level: LevelFilter) {
    let installed = Builder::new()
        .filter_level(LevelFilter::Trace)
        .target(Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(&Local::now(), record.level(), &record.args().to_string())
            )
        })
        .try_init();
    if installed.is_err() {
        log::debug!("Logger already installed, adjusting level only");
    }
    set_level(level);
}

/// Change the maximum level logged.
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

/// Render one log line.
pub fn format_line<Tz>(at: &chrono::DateTime<Tz>, level: Level, message: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} [JVM: {}] {}",
        at.format("%Y-%m-%d %H:%M:%S,%3f"),
        level,
        message
    )
}
