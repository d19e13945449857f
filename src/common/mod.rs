//! Crate-wide plumbing: logging setup, error types and configuration.

pub mod config;
pub mod exception;
pub mod logger;
