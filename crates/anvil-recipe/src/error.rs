use anvil_core::{Categorized, ErrorCategory};

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("recipe '{0}' not found in local recipes/ or registry/")]
    NotFound(String),

    #[error("failed to parse recipe: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown action '{action}' in step {step_index}")]
    UnknownAction { action: String, step_index: usize },

    #[error("action '{action}' missing required param '{param}' in step {step_index}")]
    MissingParam {
        action: String,
        param: String,
        step_index: usize,
    },

    #[error("disallowed URL scheme in step {step_index}: {url}")]
    DisallowedUrlScheme { step_index: usize, url: String },

    #[error("path traversal segment in step {step_index} param '{param}': {value}")]
    PathTraversal {
        step_index: usize,
        param: String,
        value: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Categorized for RecipeError {
    fn category(&self) -> ErrorCategory {
        match self {
            RecipeError::NotFound(_) => ErrorCategory::RecipeNotFound,
            _ => ErrorCategory::InstallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, RecipeError>;
