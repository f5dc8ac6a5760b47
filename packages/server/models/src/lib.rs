#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the CrowdWatch server.
//!
//! Action responses share one shape: `success`, an optional user-facing
//! `message` on failure, and the action's payload on success. Absent
//! fields are omitted from the JSON.

use crowdwatch_ai_models::ChatTurn;
use crowdwatch_location_models::{DataPoint, DensityLevel, Location};
use serde::{Deserialize, Serialize};

/// `GET /api/health` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Crate version.
    pub version: String,
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

/// Query parameters for the locations list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive name filter.
    pub search: Option<String>,
}

/// A location annotated with its derived crowd level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    /// The stored location.
    #[serde(flatten)]
    pub location: Location,
    /// Qualitative level.
    pub density_level: DensityLevel,
    /// Occupancy as a percentage of capacity.
    pub occupancy_percent: f64,
}

impl From<&Location> for LocationView {
    fn from(location: &Location) -> Self {
        Self {
            location: location.clone(),
            density_level: location.density_level(),
            occupancy_percent: location.occupancy_percent(),
        }
    }
}

/// `GET /api/locations` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsResponse {
    /// Matching locations in registry order.
    pub locations: Vec<LocationView>,
    /// Selected location id, even when filtered out of `locations`.
    pub selected_id: Option<String>,
}

/// `POST /api/locations` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLocationRequest {
    /// Name of the new location.
    pub name: String,
}

/// `POST /api/locations` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLocationResponse {
    /// Whether the location was added.
    pub success: bool,
    /// User-facing error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The stored location, now selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationView>,
}

impl AddLocationResponse {
    /// Successful response.
    #[must_use]
    pub fn ok(location: &Location) -> Self {
        Self {
            success: true,
            message: None,
            location: Some(location.into()),
        }
    }

    /// Failed response carrying `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            location: None,
        }
    }
}

/// `PUT /api/locations/{id}/select` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectResponse {
    /// The newly selected id.
    pub selected_id: String,
}

/// Prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    /// Whether a prediction was produced.
    pub success: bool,
    /// User-facing error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Short summary of the expected change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_text: Option<String>,
    /// Three-hour forecast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_data: Option<Vec<DataPoint>>,
}

impl AlertResponse {
    /// Successful response.
    #[must_use]
    pub const fn ok(prediction_text: String, predicted_data: Vec<DataPoint>) -> Self {
        Self {
            success: true,
            message: None,
            prediction_text: Some(prediction_text),
            predicted_data: Some(predicted_data),
        }
    }

    /// Failed response carrying `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            prediction_text: None,
            predicted_data: None,
        }
    }
}

/// `POST /api/realtime/analyze` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// `data:<mime>;base64,<payload>`.
    pub image_data_uri: String,
}

/// `POST /api/realtime/analyze` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DensityResponse {
    /// Whether the frame was analyzed.
    pub success: bool,
    /// User-facing error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Estimated density, 0 to 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
}

impl DensityResponse {
    /// Successful response.
    #[must_use]
    pub const fn ok(density: f64) -> Self {
        Self {
            success: true,
            message: None,
            density: Some(density),
        }
    }

    /// Failed response carrying `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            density: None,
        }
    }
}

/// `POST /api/chat` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Earlier turns, oldest first.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// Newest user message.
    pub message: String,
}

/// `POST /api/chat` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Whether a reply was produced.
    pub success: bool,
    /// User-facing error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Assistant reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl ChatResponse {
    /// Successful response.
    #[must_use]
    pub const fn ok(reply: String) -> Self {
        Self {
            success: true,
            message: None,
            reply: Some(reply),
        }
    }

    /// Failed response carrying `message`.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            reply: None,
        }
    }
}
