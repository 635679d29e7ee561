//! Episode Organizer Library
//!
//! Matches loosely named episode files against a reference episode list,
//! plans their renaming and placement, and executes the plan under a
//! journal that can be undone.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod models;
pub mod utils;

pub use error::{Error, Result};
