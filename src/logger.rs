//! Logger writing to stderr.
//!
//! Implements the `log::Log` trait so library code can use the `log` macros.
//! Info lines are printed bare; other levels get a `level:` prefix.

use std::io::Write;

use log::{Level, LevelFilter, Metadata, Record};

/// Global logger instance
static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible to do if stderr is gone.
        let _ = match record.level() {
            Level::Info => writeln!(stderr, "{}", record.args()),
            level => writeln!(stderr, "{}: {}", level.as_str().to_lowercase(), record.args()),
        };
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the logger with the given maximum level.
///
/// Calling this more than once only updates the level.
pub fn init(max_level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(max_level);
}

/// Raise `base` by one level per `-v`.
pub fn level_for_verbosity(base: LevelFilter, verbose: u8) -> LevelFilter {
    let levels = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let start = levels.iter().position(|l| *l == base).unwrap_or(3);
    levels[(start + verbose as usize).min(levels.len() - 1)]
}
