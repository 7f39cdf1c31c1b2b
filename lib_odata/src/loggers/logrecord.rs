use chrono::{DateTime, Utc};
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;
use static_init::dynamic;

use crate::utils::misc::current_datetime_rfc9557;
use crate::utils::sys_info::{get_process_info, ProcessInfo, ProcessInfoError};

#[dynamic]
/// Statically initialized `ProcessInfo` instance, providing details about the current process.
pub static PROCESSINFO: Result<ProcessInfo, ProcessInfoError> = get_process_info();

/// # Logrecord
///
/// Represents one structured log entry emitted by the extraction tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logrecord {
    /// Unique identifier for the log record, when one is assigned downstream.
    pub id: Option<i64>,
    /// Timestamp (UTC) when the log record was created.
    pub ts: Option<DateTime<Utc>>,
    /// The severity level of the log (0 Silly .. 6 Fatal).
    pub loglevel: i64,
    /// Details about the message content.
    pub message: Message,
    /// Information about the application generating the log.
    pub app: App,
    /// Flexible JSON value for arbitrary tags or additional metadata.
    pub tags: Value,
    /// RFC 9557 formatted timestamp string.
    pub rfc9557: String,
}

impl Default for Logrecord {
    /// Creates a default `Logrecord`, stamping `rfc9557` with the current
    /// UTC datetime.
    fn default() -> Self {
        Self {
            id: None,
            ts: None,
            loglevel: 0,
            message: Message::default(),
            app: App::default(),
            tags: serde_json::json!([]),
            rfc9557: current_datetime_rfc9557(),
        }
    }
}

/// # Message
///
/// Represents the textual content of a log entry, including its language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The language of the message (e.g., "en" for English).
    pub lang: String,
    /// The actual text content of the message.
    pub text: String,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            text: "".to_string(),
            lang: "en".to_string(),
        }
    }
}

/// # App
///
/// Contains information about the application that generated the log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    /// The process ID (PID) of the application.
    pub pid: i64,
    /// The name of the application.
    pub name: String,
}

impl Default for App {
    /// Populates the app block from the statically collected process
    /// information, falling back to empty values when it is unavailable.
    fn default() -> Self {
        match PROCESSINFO.as_ref() {
            Ok(info) => Self {
                pid: info.process_pid,
                name: info.process_basename.clone(),
            },
            Err(_) => Self {
                pid: 0,
                name: "".to_string(),
            },
        }
    }
}
