//! Process-wide logger feeding the interactive view.
//!
//! Records are kept in a bounded buffer the UI renders; set
//! `HXPLAY_LOG_STDERR=1` to echo them to stderr as well.

use log::{LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

const LOG_CAPACITY: usize = 500;

pub type LogLines = Arc<Mutex<VecDeque<String>>>;

struct SharedLogger {
    level: LevelFilter,
    buffer: LogLines,
    echo_stderr: bool,
}

impl Log for SharedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!("[{}] {}", record.level(), record.args());
        if self.echo_stderr {
            eprintln!("{}", line);
        }

        let mut buffer = lock(&self.buffer);
        if buffer.len() >= LOG_CAPACITY {
            buffer.pop_front();
        }
        buffer.push_back(line);
    }

    fn flush(&self) {}
}

static LOG_BUFFER: OnceLock<LogLines> = OnceLock::new();
static LOGGER: OnceLock<SharedLogger> = OnceLock::new();

fn lock(buffer: &LogLines) -> MutexGuard<'_, VecDeque<String>> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn parse_level(value: Option<&str>) -> LevelFilter {
    match value.map(str::to_lowercase).as_deref() {
        Some("off") => LevelFilter::Off,
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Install the logger. Level comes from `RUST_LOG`, defaulting to info.
pub fn init() -> LogLines {
    let buffer = LOG_BUFFER
        .get_or_init(|| Arc::new(Mutex::new(VecDeque::with_capacity(LOG_CAPACITY))))
        .clone();

    let level = parse_level(std::env::var("RUST_LOG").ok().as_deref());
    let echo_stderr = std::env::var("HXPLAY_LOG_STDERR")
        .map(|value| value != "0")
        .unwrap_or(false);

    let logger = SharedLogger {
        level,
        buffer: buffer.clone(),
        echo_stderr,
    };

    let logger_ref = LOGGER.get_or_init(|| logger);
    if log::set_logger(logger_ref).is_ok() {
        log::set_max_level(level);
    }

    buffer
}

pub fn snapshot(buffer: &LogLines) -> Vec<String> {
    lock(buffer).iter().cloned().collect()
}
