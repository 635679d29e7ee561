//! Data models.

pub mod config;
pub mod episode;
pub mod journal;
pub mod media;
pub mod plan;
