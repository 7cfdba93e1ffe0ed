//! Logger utility for application-wide logging
//!
//! `Logger` implements `log::Log` and writes every record to a log file as
//! well as to stderr. When no log file is configured `env_logger` is
//! installed instead. Commands also hold a `Logger` to append run
//! summaries to the log file; without a file those lines are dropped.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    level: LevelFilter,
}

impl Logger {
    /// Creates a logger writing to `log_file`, truncating it
    pub fn new(log_file: &Path, level: LevelFilter) -> io::Result<Self> {
        let file = File::create(log_file)?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            level,
        })
    }

    /// A logger that writes nowhere
    pub fn disabled() -> Self {
        Logger {
            file: Mutex::new(None),
            level: LevelFilter::Off,
        }
    }

    /// Appends one line to the log file
    pub fn log(&self, message: &str) -> io::Result<()> {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                writeln!(file, "{}", message)?;
                file.flush()?;
            }
        }
        Ok(())
    }

    /// Installs a file-backed logger as the global `log` sink
    pub fn init_global_logger(log_file: &Path, level: LevelFilter) -> io::Result<()> {
        let global_logger = Logger::new(log_file, level)?;

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level);
        Ok(())
    }

    /// Installs the global sink: the file logger when `log_file` is set,
    /// otherwise `env_logger` at `level` (overridable through `RUST_LOG`)
    pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> io::Result<()> {
        match log_file {
            Some(path) => Self::init_global_logger(path, level),
            None => {
                let _ = env_logger::Builder::new()
                    .filter_level(level)
                    .parse_default_env()
                    .format_timestamp(None)
                    .try_init();
                Ok(())
            }
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = Logger::log(self, &message);

            eprintln!("{}", message);
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_reach_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let logger = Logger::new(&path, LevelFilter::Info).unwrap();
        logger.log("Cube_01: saved 3 patches").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Cube_01: saved 3 patches\n");
        assert!(Logger::disabled().log("dropped").is_ok());
    }
}
