use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
/// # Process Info Error
///
/// Errors that can occur while collecting process information.
pub enum ProcessInfoError {
    /// An I/O error occurred while resolving the executable path.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// The executable path had no usable file name or parent directory.
    #[error("Malformed executable path: {0}")]
    MalformedPath(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// # Process Information
///
/// Holds information about the current running process.
pub struct ProcessInfo {
    /// The full path to the current executable.
    pub process_current_exe: String,
    /// The base name of the executable (filename without extension).
    pub process_basename: String,
    /// The directory where the executable is located.
    pub process_location: String,
    /// The process ID (PID) of the current process.
    pub process_pid: i64,
}

/// Collects information about the current process.
pub fn get_process_info() -> Result<ProcessInfo, ProcessInfoError> {
    let current_exe: PathBuf = env::current_exe()?;

    let basename = current_exe
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| ProcessInfoError::MalformedPath(current_exe.display().to_string()))?;

    let location = current_exe
        .parent()
        .map(|parent| parent.to_string_lossy().to_string())
        .ok_or_else(|| ProcessInfoError::MalformedPath(current_exe.display().to_string()))?;

    Ok(ProcessInfo {
        process_current_exe: current_exe.to_string_lossy().to_string(),
        process_basename: basename,
        process_location: location,
        process_pid: std::process::id() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_info_is_populated() {
        let info = get_process_info().unwrap();
        assert!(!info.process_basename.is_empty());
        assert!(!info.process_location.is_empty());
        assert!(info.process_pid > 0);
    }
}
