//! Core business logic modules.

pub mod analyzer;
pub mod duplicates;
pub mod executor;
pub mod index;
pub mod journal;
pub mod matcher;
pub mod planner;
pub mod reference;
pub mod scanner;
pub mod session;
pub mod sidecar;
pub mod undo;
