use std::path::PathBuf;

use thiserror::Error;

use crate::image_client::ImageError;
use crate::llm_client::LlmError;

/// Failures while loading or validating the layered YAML configuration.
/// All of these are raised before any remote call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Persona configuration file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{env_var} not found in environment or base config")]
    MissingCredential { env_var: &'static str },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing prompt templates in persona 'prompts': {}", .0.join(", "))]
    MissingTemplates(Vec<String>),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Unreplaced placeholders found in template: {template}")]
    Unresolved { template: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error for a pipeline run. One variant per failure kind so the
/// caller can branch on what went wrong.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to parse LLM response: {0}")]
    Parse(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
