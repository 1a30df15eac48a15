use std::{env, str::FromStr, time::SystemTime};

use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter};

const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

pub fn setup_logger() -> Result<(), fern::InitError> {
    let level = env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|raw| LevelFilter::from_str(raw.trim()).ok())
        .unwrap_or(LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                colored_level(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        // Connection-level chatter from the HTTP stack
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(std::io::stdout())
        .apply()?;

    Ok(())
}

fn colored_level(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".normal(),
    }
}
