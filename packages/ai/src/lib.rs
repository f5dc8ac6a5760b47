#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! LLM provider abstraction and the four CrowdWatch prompt flows.
//!
//! Supports Anthropic Claude, `OpenAI` (and any `OpenAI`-compatible server
//! via `AI_BASE_URL`), and AWS Bedrock (feature-gated). Every flow is a
//! single request that asks the model to call one forced output tool whose
//! JSON Schema is the flow's output type; see [`structured`].
//!
//! Flows never retry. Transport failures, provider errors and output that
//! fails validation all surface as [`AiError`].

pub mod data_uri;
pub mod flows;
pub mod prompts;
pub mod providers;
pub mod structured;

use thiserror::Error;

pub use data_uri::{DataUri, DataUriError};

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// The model answered without producing the requested structured
    /// output.
    #[error("Model did not return output for {tool}")]
    MissingOutput {
        /// The output tool that was expected.
        tool: String,
    },

    /// Structured output parsed but violates the schema's constraints.
    #[error("Invalid model output: {message}")]
    Validation {
        /// Which constraint failed.
        message: String,
    },

    /// The image passed to the detection flow is not a usable data URI.
    #[error("Invalid image: {0}")]
    DataUri(#[from] DataUriError),

    /// Input rejected before any request was made.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

impl AiError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
