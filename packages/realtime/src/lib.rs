#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Live crowd density sampling.
//!
//! A [`Sampler`](sampler::Sampler) captures one frame from a
//! [`FrameSource`] on a fixed interval and sends it to the image density
//! flow. At most one analysis is ever outstanding; ticks that fire while
//! one is pending are skipped. Results land in a rolling window of the
//! last [`WINDOW_SIZE`](window::WINDOW_SIZE) points.

pub mod frames;
pub mod sampler;
pub mod window;

use crowdwatch_ai::DataUri;
use thiserror::Error;

pub use frames::DirectoryFrameSource;
pub use sampler::{Sampler, SamplerConfig, SamplerEvent, SamplerHandle};
pub use window::RollingWindow;

/// Shown when a frame cannot be analyzed.
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to analyze the image. Please try again.";

/// Why a frame could not be captured.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Access to the camera (or frame directory) was refused.
    #[error("Camera access denied: {0}")]
    PermissionDenied(String),

    /// The platform has no usable camera.
    #[error("Camera not supported: {0}")]
    Unsupported(String),

    /// The camera exists but produced no frame this time.
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
}

impl CaptureError {
    /// Whether sampling should stop rather than retry on the next tick.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::PermissionDenied(_) | Self::Unsupported(_))
    }
}

/// A camera, or anything that can stand in for one.
#[async_trait::async_trait]
pub trait FrameSource: Send {
    /// Captures one frame as an image data URI.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if no frame can be produced.
    async fn capture(&mut self) -> Result<DataUri, CaptureError>;
}
