//! Check orchestration engine.
//!
//! Provides selection, scheduling, progress reporting and result aggregation.

pub mod context;
pub mod id;
pub mod progress;
pub mod result;
pub mod scheduler;
pub mod selector;
pub mod timing;
