use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Metadata, Record};

/// Prints timestamped log lines to stdout.
///
/// Debug and trace output is limited to this workspace's own crates so the
/// HTTP stack stays quiet under `--verbose`.
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

fn format_line(timestamp: DateTime<Local>, level: Level, target: &str, message: &str) -> String {
    format!(
        "{} {:<5} [{}] {}",
        timestamp.format("%H:%M:%S"),
        level,
        target,
        message
    )
}

fn is_own_target(target: &str) -> bool {
    target.starts_with("proxy")
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && (metadata.level() <= Level::Info || is_own_target(metadata.target()))
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!(
                "{}",
                format_line(
                    Local::now(),
                    record.level(),
                    record.target(),
                    &record.args().to_string()
                )
            );
        }
    }

    fn flush(&self) {}
}
