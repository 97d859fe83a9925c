//! # Announcement Linker Common Library
//!
//! Shared code for the announcement linker workspace:
//! - Entity store schema and initialization (SQLite)
//! - Row models for stops, routes and route sections
//! - Configuration file loading and data folder resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
