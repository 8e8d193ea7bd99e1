//! Common test utilities for all integration tests.
//!
//! Provides resource builders and a recording patcher whose behaviour can be
//! steered per test.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod patcher;
pub mod resources;

pub use patcher::{is_patched_filter, RecordingPatcher, PATCHED_TYPE_URL, TEST_EXTENSION};
pub use resources::*;
