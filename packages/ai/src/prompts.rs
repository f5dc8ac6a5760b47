//! Prompt templates.
//!
//! Each flow has a fixed system prompt and a user message rendered from the
//! flow's input. Rendering is pure so the exact text can be tested.

use std::fmt::Write as _;

use crowdwatch_ai_models::{
    CHAT_REPLY_TOOL, CROWD_DENSITY_TOOL, ChatInput, CrowdAlertInput, GENERATED_POINT_COUNT,
    GenerateLocationInput, LOCATION_DATA_TOOL, PREDICTION_POINT_COUNT, PREDICTION_TOOL,
};
use crowdwatch_location_models::ChatRole;

/// System prompt for density predictions.
#[must_use]
pub fn crowd_alert_system() -> String {
    format!(
        "You are an expert in analyzing crowd density data and predicting changes. \
         Consider trends, daily patterns and anomalies. Keep the prediction message \
         concise and informative. Always answer by calling the `{PREDICTION_TOOL}` tool."
    )
}

/// User message for a density prediction.
///
/// `expected_labels` are the hour labels the forecast should use; when the
/// history is not hourly they are omitted and the model picks its own.
#[must_use]
pub fn crowd_alert_user(input: &CrowdAlertInput, expected_labels: Option<&[String]>) -> String {
    let recent = input
        .recent_crowd_data
        .iter()
        .map(|d| format_number(*d))
        .collect::<Vec<_>>()
        .join(", ");
    let historical = input
        .historical_crowd_data
        .iter()
        .map(|p| format!("{}: {}", p.time, format_number(p.density)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "Analyze the recent and historical crowd density data for the location: {location}.\n\n\
         Recent Crowd Data: [{recent}]\n\
         Historical Crowd Data: [{historical}]\n\n\
         Generate a short message predicting how crowd density will change, and forecast \
         the density for each of the next {PREDICTION_POINT_COUNT} hours.",
        location = input.location,
    );

    if let Some(labels) = expected_labels {
        let _ = write!(
            prompt,
            " Label the forecast points {}, continuing the historical time labels.",
            labels.join(", ")
        );
    }

    prompt
}

/// System prompt for image density estimation.
#[must_use]
pub fn detect_crowd_system() -> String {
    format!(
        "You are an expert at analyzing images to determine crowd density. \
         Always answer by calling the `{CROWD_DENSITY_TOOL}` tool."
    )
}

/// Text accompanying the image in a density estimation request.
pub const DETECT_CROWD_USER: &str = "Analyze the provided image and estimate the crowd density \
     as a percentage from 0 (empty) to 100 (extremely crowded). Return only the estimated \
     crowd density percentage.";

/// System prompt for synthetic location data.
#[must_use]
pub fn generate_location_system() -> String {
    format!(
        "You are a city planning simulator. Given a location name, you generate a realistic \
         crowd data profile for it. Always answer by calling the `{LOCATION_DATA_TOOL}` tool."
    )
}

/// User message for synthetic location data.
#[must_use]
pub fn generate_location_user(input: &GenerateLocationInput, labels: &[String]) -> String {
    format!(
        "Location Name: {name}\n\n\
         Generate the following:\n\
         1. A realistic maximum capacity for this type of location.\n\
         2. A series of {GENERATED_POINT_COUNT} historical crowd density data points for a \
         typical day, labelled {labels}. The crowd levels should follow a plausible daily \
         pattern (e.g., lower in the morning, peaking midday, then tapering off).\n\
         3. A realistic current density, which must be the same as the density of the last \
         historical data point ({last}).\n\n\
         For example, a \"plaza\" might have a higher capacity than a small \"cafe\". \
         A \"station\" would have peaks during commute times.",
        name = input.location_name,
        labels = labels.join(", "),
        last = labels.last().map_or("", String::as_str),
    )
}

/// System prompt for the in-app assistant.
#[must_use]
pub fn chat_system() -> String {
    format!(
        "You are a helpful AI assistant for the CrowdWatch application. \
         Your goal is to answer user questions about the application's features and data. \
         Be friendly, concise, and helpful.\n\n\
         The application has the following features:\n\
         - Dashboard: Shows a list of locations with their current crowd density and \
         historical data. Users can add new locations and get AI predictions for future \
         crowd levels.\n\
         - Real-time: Uses the device's camera to analyze live video and show real-time \
         crowd density.\n\
         - Statistics: Displays overall statistics like average density and the most/least \
         crowded locations.\n\n\
         Always answer by calling the `{CHAT_REPLY_TOOL}` tool."
    )
}

/// User message carrying the transcript and the newest message.
#[must_use]
pub fn chat_user(input: &ChatInput) -> String {
    let mut prompt = String::from("Here is the conversation history:\n");
    if input.history.is_empty() {
        prompt.push_str("(none)\n");
    }
    for turn in &input.history {
        let role = match turn.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        let _ = writeln!(prompt, "{role}: {}", turn.content);
    }
    let _ = write!(
        prompt,
        "\nHere is the user's latest message:\nuser: {}\n\nGenerate a helpful and relevant reply.",
        input.message
    );
    prompt
}

/// Formats densities without a trailing `.0` for whole numbers.
fn format_number(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdwatch_ai_models::ChatTurn;
    use crowdwatch_location_models::DataPoint;

    #[test]
    fn alert_prompt_interpolates_inputs() {
        let input = CrowdAlertInput {
            recent_crowd_data: vec![120.0, 130.5],
            historical_crowd_data: vec![DataPoint::new("4pm", 120.0), DataPoint::new("5pm", 130.5)],
            location: "Central Plaza".to_string(),
        };
        let labels = vec!["6pm".to_string(), "7pm".to_string(), "8pm".to_string()];
        let prompt = crowd_alert_user(&input, Some(labels.as_slice()));
        assert!(prompt.contains("location: Central Plaza"));
        assert!(prompt.contains("Recent Crowd Data: [120, 130.5]"));
        assert!(prompt.contains("4pm: 120, 5pm: 130.5"));
        assert!(prompt.contains("6pm, 7pm, 8pm"));

        let unlabelled = crowd_alert_user(&input, None);
        assert!(!unlabelled.contains("Label the forecast"));
    }

    #[test]
    fn chat_prompt_renders_history_in_order() {
        let input = ChatInput {
            history: vec![
                ChatTurn {
                    role: ChatRole::User,
                    content: "hi".to_string(),
                },
                ChatTurn {
                    role: ChatRole::Model,
                    content: "hello!".to_string(),
                },
            ],
            message: "what is the real-time view?".to_string(),
        };
        let prompt = chat_user(&input);
        let user_at = prompt.find("user: hi").unwrap();
        let model_at = prompt.find("model: hello!").unwrap();
        let latest_at = prompt.find("user: what is the real-time view?").unwrap();
        assert!(user_at < model_at && model_at < latest_at);
    }

    #[test]
    fn location_prompt_names_the_last_label() {
        let labels = vec!["9am".to_string(), "5pm".to_string()];
        let prompt = generate_location_user(
            &GenerateLocationInput {
                location_name: "Grand Central Market".to_string(),
            },
            &labels,
        );
        assert!(prompt.contains("Location Name: Grand Central Market"));
        assert!(prompt.contains("historical data point (5pm)"));
    }
}
