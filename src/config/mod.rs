// src/config/mod.rs

//! Configuration loading and validation for reloadctl.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_for_project, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{ConfigFile, RuntimeSection, ServerSection, WatchSection};
pub use validate::validate_config;
