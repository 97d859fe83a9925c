//! announce-linker library
//!
//! Links bus stops and route-section ends to announcement recordings:
//! name normalization, fuzzy matching against the recording set, an
//! operator fallback for what matching cannot settle, and the importer that
//! fills the entity store from the TfL API.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{LinkerError, LinkerResult};
