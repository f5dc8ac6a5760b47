#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input and output types for the four CrowdWatch prompts, along with the
//! JSON Schema definitions handed to the LLM as forced output tools.
//!
//! | Prompt            | Input                  | Output                   |
//! |-------------------|------------------------|--------------------------|
//! | crowd alert       | [`CrowdAlertInput`]    | [`CrowdPrediction`]      |
//! | detect crowd      | [`DetectCrowdInput`]   | [`CrowdDensityEstimate`] |
//! | generate location | [`GenerateLocationInput`] | [`GeneratedLocationData`] |
//! | chat              | [`ChatInput`]          | [`ChatOutput`]           |

use crowdwatch_location_models::{ChatRole, DataPoint, Location};
use serde::{Deserialize, Serialize};

/// How many trailing historical densities count as "recent".
pub const RECENT_SAMPLE_COUNT: usize = 5;

/// Number of forecast points a prediction must contain.
pub const PREDICTION_POINT_COUNT: usize = 3;

/// Number of historical points a generated location must contain.
pub const GENERATED_POINT_COUNT: usize = 9;

/// Upper bound of an image density estimate.
pub const MAX_IMAGE_DENSITY: f64 = 100.0;

/// Name of the prediction output tool.
pub const PREDICTION_TOOL: &str = "submit_crowd_prediction";
/// Name of the image density output tool.
pub const CROWD_DENSITY_TOOL: &str = "submit_crowd_density";
/// Name of the generated location output tool.
pub const LOCATION_DATA_TOOL: &str = "submit_location_data";
/// Name of the chat reply output tool.
pub const CHAT_REPLY_TOOL: &str = "submit_chat_reply";

// ---------------------------------------------------------------------------
// Crowd alert / prediction
// ---------------------------------------------------------------------------

/// Input to the crowd density alert prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdAlertInput {
    /// The last few observed densities, oldest first.
    pub recent_crowd_data: Vec<f64>,
    /// Full labelled history for the same location.
    pub historical_crowd_data: Vec<DataPoint>,
    /// Location name.
    pub location: String,
}

/// Output of the crowd density alert prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdPrediction {
    /// Short natural-language summary of the expected change.
    pub prediction_text: String,
    /// Forecast for the next three hours.
    pub predicted_data: Vec<DataPoint>,
}

// ---------------------------------------------------------------------------
// Image density estimate
// ---------------------------------------------------------------------------

/// Input to the image crowd detection prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectCrowdInput {
    /// `data:<mimetype>;base64,<payload>`.
    pub image_data_uri: String,
}

/// Output of the image crowd detection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdDensityEstimate {
    /// Estimated density from 0 (empty) to 100 (extremely crowded).
    pub crowd_density: f64,
}

// ---------------------------------------------------------------------------
// Synthetic location data
// ---------------------------------------------------------------------------

/// Input to the location data generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLocationInput {
    /// Name of the location to simulate.
    pub location_name: String,
}

/// Output of the location data generation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLocationData {
    /// Realistic maximum capacity. Generators sometimes send fractions,
    /// so this is kept as a float until the location is built.
    pub max_capacity: f64,
    /// Should equal the last historical density.
    pub current_density: f64,
    /// Nine hourly observations, 9am to 5pm.
    pub historical_data: Vec<DataPoint>,
}

impl GeneratedLocationData {
    /// Capacity rounded to a whole number of people, saturating at the
    /// `u32` bounds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn rounded_capacity(&self) -> u32 {
        let rounded = self.max_capacity.round();
        if rounded <= 0.0 {
            0
        } else if rounded >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            rounded as u32
        }
    }

    /// Wraps the generated profile into a [`Location`].
    #[must_use]
    pub fn into_location(self, id: String, name: String) -> Location {
        Location {
            id,
            name,
            max_capacity: self.rounded_capacity(),
            current_density: self.current_density,
            historical_data: self.historical_data,
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// One prior turn sent along with a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author of the turn.
    pub role: ChatRole,
    /// Turn text.
    pub content: String,
}

/// Input to the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInput {
    /// Earlier turns, oldest first.
    pub history: Vec<ChatTurn>,
    /// The newest user message.
    pub message: String,
}

/// Output of the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOutput {
    /// The assistant's reply.
    pub reply: String,
}

// ---------------------------------------------------------------------------
// Output tool definitions
// ---------------------------------------------------------------------------

fn data_point_schema(time_description: &str, density_description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "time": { "type": "string", "description": time_description },
            "density": { "type": "number", "description": density_description }
        },
        "required": ["time", "density"]
    })
}

/// Output tool for [`CrowdPrediction`].
#[must_use]
pub fn prediction_tool() -> serde_json::Value {
    serde_json::json!({
        "name": PREDICTION_TOOL,
        "description": "Submit the crowd density prediction for the next three hours.",
        "parameters": {
            "type": "object",
            "properties": {
                "predictionText": {
                    "type": "string",
                    "description": "A concise, informative message predicting changes in crowd density."
                },
                "predictedData": {
                    "type": "array",
                    "description": "Exactly 3 forecast points, one per hour, continuing the historical time labels.",
                    "items": data_point_schema(
                        "Hour label continuing the historical sequence, e.g. '6pm'.",
                        "Predicted crowd density."
                    ),
                    "minItems": PREDICTION_POINT_COUNT,
                    "maxItems": PREDICTION_POINT_COUNT
                }
            },
            "required": ["predictionText", "predictedData"]
        }
    })
}

/// Output tool for [`CrowdDensityEstimate`].
#[must_use]
pub fn crowd_density_tool() -> serde_json::Value {
    serde_json::json!({
        "name": CROWD_DENSITY_TOOL,
        "description": "Submit the estimated crowd density of the image.",
        "parameters": {
            "type": "object",
            "properties": {
                "crowdDensity": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": MAX_IMAGE_DENSITY,
                    "description": "An estimated percentage of crowd density (0-100)."
                }
            },
            "required": ["crowdDensity"]
        }
    })
}

/// Output tool for [`GeneratedLocationData`].
#[must_use]
pub fn location_data_tool() -> serde_json::Value {
    serde_json::json!({
        "name": LOCATION_DATA_TOOL,
        "description": "Submit the generated data profile for the location.",
        "parameters": {
            "type": "object",
            "properties": {
                "maxCapacity": {
                    "type": "integer",
                    "description": "A realistic maximum capacity for the location."
                },
                "currentDensity": {
                    "type": "number",
                    "description": "A realistic current density, which must equal the last historical data point."
                },
                "historicalData": {
                    "type": "array",
                    "description": "9 historical data points representing a typical day from 9am to 5pm.",
                    "items": data_point_schema(
                        "The time of the data point, e.g. '9am', '10am'.",
                        "The crowd density at that time."
                    ),
                    "minItems": GENERATED_POINT_COUNT,
                    "maxItems": GENERATED_POINT_COUNT
                }
            },
            "required": ["maxCapacity", "currentDensity", "historicalData"]
        }
    })
}

/// Output tool for [`ChatOutput`].
#[must_use]
pub fn chat_reply_tool() -> serde_json::Value {
    serde_json::json!({
        "name": CHAT_REPLY_TOOL,
        "description": "Submit the reply to the user's latest message.",
        "parameters": {
            "type": "object",
            "properties": {
                "reply": {
                    "type": "string",
                    "description": "The AI-generated reply to the user message."
                }
            },
            "required": ["reply"]
        }
    })
}

/// All output tools, in prompt order.
#[must_use]
pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![
        prediction_tool(),
        crowd_density_tool(),
        location_data_tool(),
        chat_reply_tool(),
    ]
}
