//! # Utilities Module
//!
//! General-purpose helpers shared across the extraction tooling.
//!
//! ## Contained Modules:
//!
//! - **`dates`**: Parsers for the date-string formats the campus systems
//!   emit (Anthology OData timestamps, Slate dates, Anthology GET command
//!   timestamps).
//! - **`sys_info`**: Information about the current process, used for log
//!   file placement and log record metadata.
//! - **`misc`**: Small helpers that don't warrant a module of their own.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Date-string parsing for the campus systems' formats.
pub mod dates;
/// Miscellaneous helpers.
pub mod misc;
/// Process and system information retrieval.
pub mod sys_info;
