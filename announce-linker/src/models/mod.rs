//! Linker data models

pub mod facility;
pub mod transit;

pub use facility::{AudioLink, Confidence, Facility, LinkTarget, SearchRole};
