//! # Configuration Module
//!
//! Loads the system configuration (service credentials, integration URI,
//! cache settings) once per process and hands out copies on demand.

/// System configuration loading from a JSON document and the environment.
pub mod config_sys;
