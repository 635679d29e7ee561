//! Name generators.

pub mod filename;
pub mod folder;

pub use filename::{sanitize_filename, NamingFormat};
pub use folder::series_folder;
