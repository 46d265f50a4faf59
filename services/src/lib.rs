//! The course progression and assessment engine.
//!
//! Pure rules live in [`unlock`], [`grader`] and the planning half of
//! [`reorder`]. Everything else reads and writes through SeaORM and is
//! request scoped: no engine state outlives a call.

pub mod access;
pub mod content;
pub mod course_detail;
pub mod enrollment;
pub mod error;
pub mod grader;
pub mod progress;
pub mod reorder;
pub mod unlock;

#[cfg(test)]
pub(crate) mod fixtures;

pub use access::Viewer;
pub use error::{EngineError, EngineResult};
