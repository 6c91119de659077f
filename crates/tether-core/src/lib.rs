//! Tether Core Library
//!
//! This crate provides the error types, configuration and disk driver types
//! shared by the storage layer and the file attachment helper.

pub mod config;
pub mod error;
pub mod storage_types;
pub mod telemetry;

// Re-export commonly used types
pub use config::{DiskConfig, FilesConfig};
pub use error::{ErrorMetadata, FilesError, LogLevel};
pub use storage_types::DiskDriver;
pub use telemetry::init_tracing;
