//! Shared types, error model, and configuration for deploynote.
//!
//! This crate is the foundation depended on by all other deploynote crates.
//! It provides:
//! - [`DeployNoteError`] — the unified error type
//! - Domain types ([`ChangeContext`], [`RepoTarget`])
//! - Configuration ([`AppConfig`], config loading, credential checks)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GithubConfig, ModelConfig, NotesConfig, config_dir, config_file_path,
    github_token, init_config, load_config, load_config_from, model_api_key,
};
pub use error::{DeployNoteError, ErrorSource, Result};
pub use types::{ChangeContext, RepoTarget};
