//! The four user actions.
//!
//! Each action makes one LLM call and never returns an error: failures are
//! logged and turned into a response with `success: false` and a fixed
//! user-facing message.

use std::sync::RwLock;

use crowdwatch_ai::flows;
use crowdwatch_ai::providers::LlmProvider;
use crowdwatch_ai_models::{
    ChatInput, CrowdAlertInput, DetectCrowdInput, GenerateLocationInput, RECENT_SAMPLE_COUNT,
};
use crowdwatch_location::LocationRegistry;
use crowdwatch_location_models::Location;
use crowdwatch_server_models::{AddLocationResponse, AlertResponse, ChatResponse, DensityResponse};

use crate::write_registry;

pub const PREDICTION_FAILED: &str = "Failed to generate prediction. Please try again.";
pub const ADD_LOCATION_FAILED: &str =
    "Failed to generate data for the new location. Please try again.";
pub const EMPTY_LOCATION_NAME: &str = "Please enter a name for the new location.";
pub const ANALYSIS_FAILED: &str = "Failed to analyze the image. Please try again.";
pub const CHAT_FAILED: &str = "Sorry, I couldn't get a reply. Please try again.";

/// Predicts the next three hours for `location` from its last five
/// observations and full history.
pub async fn get_crowd_alert(provider: &dyn LlmProvider, location: &Location) -> AlertResponse {
    let input = CrowdAlertInput {
        recent_crowd_data: location.recent_densities(RECENT_SAMPLE_COUNT),
        historical_crowd_data: location.historical_data.clone(),
        location: location.name.clone(),
    };

    match flows::crowd_density_alert(provider, &input).await {
        Ok(prediction) => {
            AlertResponse::ok(prediction.prediction_text, prediction.predicted_data)
        }
        Err(e) => {
            log::error!("Error getting crowd alert for {}: {e}", location.name);
            AlertResponse::failure(PREDICTION_FAILED)
        }
    }
}

/// Generates a profile for `name`, then appends and selects it.
///
/// The registry is only locked after the LLM call returns, so a failure
/// leaves it untouched.
pub async fn add_new_location(
    provider: &dyn LlmProvider,
    registry: &RwLock<LocationRegistry>,
    name: &str,
) -> AddLocationResponse {
    let name = name.trim();
    if name.is_empty() {
        return AddLocationResponse::failure(EMPTY_LOCATION_NAME);
    }

    let input = GenerateLocationInput {
        location_name: name.to_string(),
    };

    let data = match flows::generate_location_data(provider, &input).await {
        Ok(data) => data,
        Err(e) => {
            log::error!("Error generating location data for {name}: {e}");
            return AddLocationResponse::failure(ADD_LOCATION_FAILED);
        }
    };

    let location = data.into_location(String::new(), name.to_string());

    let mut registry = write_registry(registry);
    match registry.add(location) {
        Ok(added) => {
            log::info!("Added location {} ({})", added.name, added.id);
            AddLocationResponse::ok(added)
        }
        Err(e) => {
            log::error!("Error adding location {name}: {e}");
            AddLocationResponse::failure(ADD_LOCATION_FAILED)
        }
    }
}

/// Estimates the density in one camera frame.
pub async fn get_realtime_crowd_density(
    provider: &dyn LlmProvider,
    image_data_uri: String,
) -> DensityResponse {
    let input = DetectCrowdInput { image_data_uri };

    match flows::detect_crowd_from_image(provider, &input).await {
        Ok(estimate) => DensityResponse::ok(estimate.crowd_density),
        Err(e) => {
            log::error!("Error getting realtime crowd density: {e}");
            DensityResponse::failure(ANALYSIS_FAILED)
        }
    }
}

/// Produces the assistant's next reply.
pub async fn get_chat_reply(provider: &dyn LlmProvider, input: &ChatInput) -> ChatResponse {
    if input.message.trim().is_empty() {
        return ChatResponse::failure(CHAT_FAILED);
    }

    match flows::chat(provider, input).await {
        Ok(output) => ChatResponse::ok(output.reply),
        Err(e) => {
            log::error!("Error getting chat reply: {e}");
            ChatResponse::failure(CHAT_FAILED)
        }
    }
}
