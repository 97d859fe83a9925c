//! Test Helper Utilities
//!
//! Shared utilities for announce-linker integration tests

#![allow(dead_code)]

pub mod db_utils;
pub mod log_capture;
pub mod memory_repository;

pub use db_utils::{
    create_test_pool, section_links, seed_section, seed_stop, set_stop_link, stop_link, Link,
};
pub use log_capture::{init_test_logging, LogCapture};
pub use memory_repository::MemoryRepository;
