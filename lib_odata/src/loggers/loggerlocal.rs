use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use colored::*;
use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::logrecord::{Logrecord, PROCESSINFO};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
/// # Logger Local Options
///
/// Configuration options for the `LoggerLocal` instance, controlling where
/// and how log messages are output. A level appears in the output channel
/// only when its list contains that level; the derived default disables
/// every channel, which is what the test suites want.
pub struct LoggerLocalOptions {
    /// A list of log levels that should be printed to the TTY (console).
    pub use_tty: Option<Vec<i64>>,
    /// A list of log levels that should be written to a log file.
    pub use_file: Option<Vec<i64>>,
    /// The directory where log files should be stored. If `None`, defaults to the executable's directory.
    pub log_dir: Option<PathBuf>,
}

/// # Local Logger
///
/// Writes leveled, timestamped log lines to the console (colored by level)
/// and/or a per-run log file. Old log files for the same application are
/// rotated away on startup, keeping only the newest.
pub struct LoggerLocal {
    /// The name of the application associated with this logger instance.
    app_name: String,
    /// Configuration options determining logging behavior.
    options: LoggerLocalOptions,
    /// The path to the currently active log file, if file logging is enabled.
    current_log_file: Option<PathBuf>,
}

impl LoggerLocal {
    /// Rotates log files for a given application and log directory.
    ///
    /// Keeps only the most recent log file (based on the timestamp in the
    /// filename) and deletes older log files for the application.
    fn rotate_logs(app_name: &str, log_dir: &Path) {
        let pattern = format!("{}/{}-*.log", log_dir.display(), app_name);
        let mut log_files: Vec<PathBuf> = Vec::new();

        if let Ok(entries) = glob(&pattern) {
            for entry in entries.flatten() {
                log_files.push(entry);
            }
        }

        // Newest first, by the timestamp embedded in the filename.
        log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

        if log_files.len() > 1 {
            for old_file in log_files.iter().skip(1) {
                if let Err(e) = std::fs::remove_file(old_file) {
                    eprintln!("Error deleting old log file {}: {}", old_file.display(), e);
                }
            }
        }
    }

    /// Creates a new `LoggerLocal` instance.
    ///
    /// If file logging is enabled this ensures the log directory exists,
    /// rotates old logs, and opens a fresh timestamped log file path.
    ///
    /// # Arguments
    /// * `app_name` - The name of the application using this logger.
    /// * `options` - Optional `LoggerLocalOptions` to customize logging
    ///   behavior. If `None`, all levels go to both the TTY and a file.
    pub fn new(app_name: String, options: Option<LoggerLocalOptions>) -> Self {
        let default_options = LoggerLocalOptions {
            use_tty: Some(vec![6, 5, 4, 3, 2, 1, 0]),
            use_file: Some(vec![6, 5, 4, 3, 2, 1, 0]),
            log_dir: None,
        };
        let opts = options.unwrap_or(default_options);

        let mut logger = Self {
            app_name: app_name.clone(),
            options: opts,
            current_log_file: None,
        };

        if logger.options.use_file.is_some() {
            let log_base_dir = logger.options.log_dir.clone().unwrap_or_else(|| {
                PROCESSINFO
                    .as_ref()
                    .ok()
                    .map(|info| PathBuf::from(&info.process_location))
                    .unwrap_or_else(|| PathBuf::from("."))
            });

            if let Err(e) = std::fs::create_dir_all(&log_base_dir) {
                eprintln!("Error creating log directory {}: {}", log_base_dir.display(), e);
            }

            LoggerLocal::rotate_logs(&app_name, &log_base_dir);

            let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
            let current_log_filename = format!("{}-{}.log", app_name, timestamp);
            logger.current_log_file = Some(log_base_dir.join(current_log_filename));
        }

        logger
    }

    /// Logs a message with a specified level, handling TTY output and file
    /// writing based on the logger's configuration.
    ///
    /// # Arguments
    /// * `log_level` - The numeric log level (0 Silly .. 6 Fatal).
    /// * `log_message` - The main message string to be logged.
    /// * `log_extras` - Additional structured data to include in the log.
    pub async fn log(&self, log_level: i64, log_message: &str, log_extras: Option<Value>) {
        let mut record = Logrecord::default();
        record.app.name = self.app_name.clone();
        record.loglevel = log_level;
        record.message.text = log_message.to_string();
        if let Some(extras) = log_extras {
            record.tags = extras;
        }

        let ts = record.rfc9557.as_str().truecolor(128, 128, 128);
        let app_name_colored = format!("[{}]", self.app_name).truecolor(128, 128, 128);

        if let Some(tty_levels) = &self.options.use_tty {
            if tty_levels.contains(&log_level) {
                // Color the message by level for readability in the console.
                let colored_message = match log_level {
                    6 => log_message.bright_white().on_bright_red(), // Fatal
                    5 => log_message.bright_red(),                   // Error
                    4 => log_message.bright_yellow(),                // Warn
                    3 => log_message.bright_green(),                 // Info
                    2 => log_message.bright_white(),                 // Debug
                    1 => log_message.bright_cyan(),                  // Trace
                    _ => log_message.blue(),                         // Silly
                };

                println!("{}{} {}", ts, app_name_colored, colored_message);
                if record.tags != serde_json::json!([]) {
                    if let Ok(tags_str) = serde_json::to_string(&record.tags) {
                        println!("{}{} {}", ts, app_name_colored, tags_str.truecolor(128, 128, 128));
                    }
                }
            }
        }

        if let Some(file_levels) = &self.options.use_file {
            if file_levels.contains(&log_level) {
                if let Some(log_file_path) = &self.current_log_file {
                    let mut formatted_message =
                        format!("{} [{}] {}\n", record.rfc9557, self.app_name, log_message);
                    if record.tags != serde_json::json!([]) {
                        if let Ok(tags_str) = serde_json::to_string(&record.tags) {
                            formatted_message.push_str(&tags_str);
                            formatted_message.push('\n');
                        }
                    }
                    let _ = OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(log_file_path)
                        .and_then(|mut file| write!(file, "{}", formatted_message));
                }
            }
        }
    }

    /// Logs a message at the "Silly" (level 0) log level.
    pub async fn silly(&self, log_message: &str, log_extras: Option<Value>) {
        self.log(0, log_message, log_extras).await;
    }

    /// Logs a message at the "Trace" (level 1) log level.
    pub async fn trace(&self, log_message: &str, log_extras: Option<Value>) {
        self.log(1, log_message, log_extras).await;
    }

    /// Logs a message at the "Debug" (level 2) log level.
    pub async fn debug(&self, log_message: &str, log_extras: Option<Value>) {
        self.log(2, log_message, log_extras).await;
    }

    /// Logs a message at the "Info" (level 3) log level.
    pub async fn info(&self, log_message: &str, log_extras: Option<Value>) {
        self.log(3, log_message, log_extras).await;
    }

    /// Logs a message at the "Warn" (level 4) log level.
    pub async fn warn(&self, log_message: &str, log_extras: Option<Value>) {
        self.log(4, log_message, log_extras).await;
    }

    /// Logs a message at the "Error" (level 5) log level.
    pub async fn error(&self, log_message: &str, log_extras: Option<Value>) {
        self.log(5, log_message, log_extras).await;
    }

    /// Logs a message at the "Fatal" (level 6) log level.
    pub async fn fatal(&self, log_message: &str, log_extras: Option<Value>) {
        self.log(6, log_message, log_extras).await;
    }
}
