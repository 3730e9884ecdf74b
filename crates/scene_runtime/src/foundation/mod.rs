//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the runtime:
//! - Math types and operations
//! - Bounding volumes
//! - Collections and data structures
//! - Time management
//! - Logging utilities

pub mod bounds;
pub mod collections;
pub mod logging;
pub mod math;
pub mod time;
