//! Daily log file behind the `log` facade.
//!
//! `env_logger` formats each record as `[HH:MM:SS] message` (warnings and
//! errors carry their level) and pipes it into [`DailyLogSink`], which
//! appends to `~/Desktop/Screenshots/logs/<YYYY-MM-DD>.log`. The file is
//! opened and closed around every line. Records are echoed to stderr as
//! well. `RUST_LOG` overrides [`DEFAULT_FILTER`]; dependencies stay at
//! warnings.

use chrono::{Local, NaiveDate, NaiveTime};
use log::Level;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Desktop")
        .join("Screenshots")
        .join("logs")
}

pub fn log_file_for(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.log", date.format("%Y-%m-%d")))
}

pub fn format_line(time: NaiveTime, level: Level, message: &str) -> String {
    match level {
        Level::Error | Level::Warn => format!("[{}] {} {}", time.format("%H:%M:%S"), level, message),
        _ => format!("[{}] {}", time.format("%H:%M:%S"), message),
    }
}

/// Logs a failure with the operation it interrupted, e.g. `[capture] ...`.
pub fn log_error(context: &str, err: &dyn Display) {
    log::error!("[{}]: {}", context, err);
}

/// Append-only writer that picks the file by the current local date.
pub struct DailyLogSink {
    dir: PathBuf,
    echo: bool,
    warned: bool,
}

impl DailyLogSink {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            echo: true,
            warned: false,
        }
    }

    /// Sink that only writes the file; used by tests.
    pub fn quiet(dir: PathBuf) -> Self {
        Self {
            echo: false,
            ..Self::new(dir)
        }
    }

    pub fn append(&self, date: NaiveDate, buf: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file_for(&self.dir, date))?;
        file.write_all(buf)
    }
}

impl Write for DailyLogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.echo {
            let _ = io::stderr().write_all(buf);
        }
        if let Err(e) = self.append(Local::now().date_naive(), buf) {
            // Logging must never take the app down; complain once.
            if !self.warned {
                self.warned = true;
                eprintln!("log file unavailable in {}: {}", self.dir.display(), e);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub const DEFAULT_FILTER: &str = "warn,snipping_tool_lib=info";

/// Installs the global logger. Safe to call more than once.
pub fn init() {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_FILTER))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_line(Local::now().time(), record.level(), &record.args().to_string())
            )
        })
        .target(env_logger::Target::Pipe(Box::new(DailyLogSink::new(log_dir()))))
        .try_init();

    if let Err(e) = result {
        eprintln!("logger already initialised: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn info_lines_are_time_and_message() {
        let t = NaiveTime::from_hms_opt(9, 5, 3).unwrap();
        assert_eq!(format_line(t, Level::Info, "Saved screenshot: 1.png"), "[09:05:03] Saved screenshot: 1.png");
    }

    #[test]
    fn error_lines_carry_level() {
        let t = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        assert_eq!(
            format_line(t, Level::Error, "[capture]: boom"),
            "[23:59:59] ERROR [capture]: boom"
        );
    }

    #[test]
    fn log_file_is_named_by_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(log_file_for(Path::new("logs"), date), Path::new("logs").join("2025-01-02.log"));
    }

    #[test]
    fn sink_creates_directory_and_appends() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("logs");
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let sink = DailyLogSink::quiet(dir.clone());

        sink.append(date, b"[00:00:01] one\n").unwrap();
        sink.append(date, b"[00:00:02] two\n").unwrap();

        let text = fs::read_to_string(log_file_for(&dir, date)).unwrap();
        assert_eq!(text, "[00:00:01] one\n[00:00:02] two\n");
    }

    #[test]
    fn sink_swallows_write_failures() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let mut sink = DailyLogSink::quiet(blocker);
        assert_eq!(sink.write(b"lost\n").unwrap(), 5);
    }

    #[test]
    fn default_filter_keeps_dependencies_quiet() {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(DEFAULT_FILTER);
        let logger = builder.build();

        let own = log::Metadata::builder()
            .level(log::Level::Info)
            .target("snipping_tool_lib::orchestrator")
            .build();
        let webview = log::Metadata::builder()
            .level(log::Level::Info)
            .target("tao::platform_impl")
            .build();
        let webview_warning = log::Metadata::builder()
            .level(log::Level::Warn)
            .target("tao::platform_impl")
            .build();

        assert!(log::Log::enabled(&logger, &own));
        assert!(!log::Log::enabled(&logger, &webview));
        assert!(log::Log::enabled(&logger, &webview_warning));
    }
}
