//! Shared test utilities for thedump integration tests.
//!
//! This module provides:
//! - Fake status services and upload transports with scripted replies
//! - Builders for session items and store setup

pub mod builders;
pub mod fakes;

pub use builders::*;
pub use fakes::*;
