//! Global log buffer feeding the Debug pane.
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;

const MAX_LOG_LINES: usize = 200;

/// Recent log lines, oldest first.
pub static LOG_BUFFER: Lazy<Mutex<VecDeque<String>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));

struct BufferLogger {
    level: LevelFilter,
}

impl Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        push_line(format!("[{}] {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

pub fn push_line(line: String) {
    if let Ok(mut buf) = LOG_BUFFER.lock() {
        if buf.len() >= MAX_LOG_LINES {
            buf.pop_front();
        }
        buf.push_back(line);
    }
}

/// Last `n` lines, oldest first.
pub fn tail(n: usize) -> Vec<String> {
    match LOG_BUFFER.lock() {
        Ok(buf) => {
            let start = buf.len().saturating_sub(n);
            buf.iter().skip(start).cloned().collect()
        }
        Err(_) => Vec::new(),
    }
}

pub fn level_from_env() -> LevelFilter {
    std::env::var("FRAG_TUI_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the buffer logger. A second call keeps the first logger.
pub fn init(level: LevelFilter) {
    if log::set_boxed_logger(Box::new(BufferLogger { level })).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_bounded_and_keeps_recent_lines_in_order() {
        for i in 0..(MAX_LOG_LINES + 10) {
            push_line(format!("bound {i}"));
        }
        push_line("tail-test one".into());
        push_line("tail-test two".into());
        assert!(LOG_BUFFER.lock().unwrap().len() <= MAX_LOG_LINES);
        let lines = tail(2);
        assert_eq!(lines, vec!["tail-test one".to_string(), "tail-test two".to_string()]);
    }
}
