//! Infrastructure layer for filesystem and environment interactions.

pub mod paths;

pub use paths::{config_file, data_dir, expand_tilde, log_dir, selection_file, uploads_file};
