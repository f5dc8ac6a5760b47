//! The four CrowdWatch prompt flows.
//!
//! Each flow renders its prompt, issues exactly one structured request and
//! validates the result. Generator conventions that the rest of the app
//! does not depend on (label continuity, `current == last`) are logged as
//! warnings rather than rejected.

use crowdwatch_ai_models::{
    ChatInput, ChatOutput, CrowdAlertInput, CrowdDensityEstimate, CrowdPrediction,
    DetectCrowdInput, GENERATED_POINT_COUNT, GenerateLocationInput, GeneratedLocationData,
    MAX_IMAGE_DENSITY, PREDICTION_POINT_COUNT, chat_reply_tool, crowd_density_tool,
    location_data_tool, prediction_tool,
};
use crowdwatch_location::labels::{following_hours, hour_range};
use crowdwatch_location::seed::{DAY_END_HOUR, DAY_START_HOUR};
use crowdwatch_location_models::DataPoint;

use crate::providers::{ContentBlock, LlmProvider, Message};
use crate::structured::request_structured;
use crate::{AiError, DataUri, prompts};

/// Forecasts the next three hours of density for one location.
///
/// # Errors
///
/// Returns [`AiError`] on transport failure, missing output, or when the
/// forecast does not have exactly three finite, non-negative points.
pub async fn crowd_density_alert(
    provider: &dyn LlmProvider,
    input: &CrowdAlertInput,
) -> Result<CrowdPrediction, AiError> {
    let expected = input
        .historical_crowd_data
        .last()
        .and_then(|p| following_hours(&p.time, PREDICTION_POINT_COUNT));

    let prompt = prompts::crowd_alert_user(input, expected.as_deref());
    let prediction: CrowdPrediction = request_structured(
        provider,
        &prompts::crowd_alert_system(),
        &[Message::user_text(prompt)],
        &prediction_tool(),
    )
    .await?;

    if prediction.predicted_data.len() != PREDICTION_POINT_COUNT {
        return Err(AiError::validation(format!(
            "expected {PREDICTION_POINT_COUNT} predicted points, got {}",
            prediction.predicted_data.len()
        )));
    }
    check_densities(&prediction.predicted_data)?;

    if let Some(expected) = expected {
        let actual: Vec<&str> = prediction
            .predicted_data
            .iter()
            .map(|p| p.time.as_str())
            .collect();
        if actual != expected {
            log::warn!(
                "Prediction for {} used labels {actual:?}, expected {expected:?}",
                input.location
            );
        }
    }

    log::debug!(
        "Prediction for {}: {}",
        input.location,
        prediction.prediction_text
    );

    Ok(prediction)
}

/// Estimates crowd density (0 to 100) from one image.
///
/// The data URI is validated before any request is made.
///
/// # Errors
///
/// Returns [`AiError::DataUri`] for a malformed image, or [`AiError`] on
/// transport failure or an out-of-range estimate.
pub async fn detect_crowd_from_image(
    provider: &dyn LlmProvider,
    input: &DetectCrowdInput,
) -> Result<CrowdDensityEstimate, AiError> {
    let image = DataUri::parse(&input.image_data_uri)?;

    let message = Message::user_blocks(vec![
        ContentBlock::Text {
            text: prompts::DETECT_CROWD_USER.to_string(),
        },
        ContentBlock::Image {
            media_type: image.media_type().to_string(),
            data: image.data().to_string(),
        },
    ]);

    let estimate: CrowdDensityEstimate = request_structured(
        provider,
        &prompts::detect_crowd_system(),
        &[message],
        &crowd_density_tool(),
    )
    .await?;

    let density = estimate.crowd_density;
    if !density.is_finite() || !(0.0..=MAX_IMAGE_DENSITY).contains(&density) {
        return Err(AiError::validation(format!(
            "crowd density {density} outside 0..={MAX_IMAGE_DENSITY}"
        )));
    }

    Ok(estimate)
}

/// Generates a plausible capacity and one day of hourly history for a
/// location name.
///
/// # Errors
///
/// Returns [`AiError::InvalidInput`] for an empty name (no request is
/// made), or [`AiError`] on transport failure or when the profile does
/// not have nine finite, non-negative points and a positive capacity.
pub async fn generate_location_data(
    provider: &dyn LlmProvider,
    input: &GenerateLocationInput,
) -> Result<GeneratedLocationData, AiError> {
    let name = input.location_name.trim();
    if name.is_empty() {
        return Err(AiError::InvalidInput {
            message: "location name is empty".to_string(),
        });
    }

    let labels = hour_range(DAY_START_HOUR, DAY_END_HOUR);
    let input = GenerateLocationInput {
        location_name: name.to_string(),
    };

    let data: GeneratedLocationData = request_structured(
        provider,
        &prompts::generate_location_system(),
        &[Message::user_text(prompts::generate_location_user(
            &input, &labels,
        ))],
        &location_data_tool(),
    )
    .await?;

    if data.historical_data.len() != GENERATED_POINT_COUNT {
        return Err(AiError::validation(format!(
            "expected {GENERATED_POINT_COUNT} historical points, got {}",
            data.historical_data.len()
        )));
    }
    check_densities(&data.historical_data)?;

    if !data.max_capacity.is_finite() || data.rounded_capacity() == 0 {
        return Err(AiError::validation(format!(
            "max capacity {} is not a positive number",
            data.max_capacity
        )));
    }
    if !data.current_density.is_finite() || data.current_density < 0.0 {
        return Err(AiError::validation(format!(
            "current density {} is negative or not finite",
            data.current_density
        )));
    }

    if let Some(last) = data.historical_data.last()
        && (last.density - data.current_density).abs() > f64::EPSILON
    {
        log::warn!(
            "Generated data for {name}: current density {} differs from last historical density {}",
            data.current_density,
            last.density
        );
    }

    Ok(data)
}

/// Produces one assistant reply given the full transcript.
///
/// # Errors
///
/// Returns [`AiError`] on transport failure or a blank reply.
pub async fn chat(provider: &dyn LlmProvider, input: &ChatInput) -> Result<ChatOutput, AiError> {
    let output: ChatOutput = request_structured(
        provider,
        &prompts::chat_system(),
        &[Message::user_text(prompts::chat_user(input))],
        &chat_reply_tool(),
    )
    .await?;

    if output.reply.trim().is_empty() {
        return Err(AiError::validation("reply is empty"));
    }

    Ok(output)
}

fn check_densities(points: &[DataPoint]) -> Result<(), AiError> {
    match points
        .iter()
        .find(|p| !p.density.is_finite() || p.density < 0.0)
    {
        Some(bad) => Err(AiError::validation(format!(
            "density {} at {} is negative or not finite",
            bad.density, bad.time
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crowdwatch_ai_models::{
        CHAT_REPLY_TOOL, CROWD_DENSITY_TOOL, ChatTurn, LOCATION_DATA_TOOL, PREDICTION_TOOL,
    };
    use crowdwatch_location_models::ChatRole;

    use super::*;
    use crate::providers::{LlmResponse, MessageContent, StopReason};

    /// Answers every request by calling the forced tool with `output`.
    struct FakeProvider {
        output: serde_json::Value,
        calls: AtomicUsize,
        last_messages: Mutex<Vec<Message>>,
    }

    impl FakeProvider {
        fn new(output: serde_json::Value) -> Self {
            Self {
                output,
                calls: AtomicUsize::new(0),
                last_messages: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for FakeProvider {
        async fn chat(
            &self,
            _system_prompt: &str,
            messages: &[Message],
            _tools: &[serde_json::Value],
            tool_choice: Option<&str>,
        ) -> Result<LlmResponse, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_messages.lock().unwrap() = messages.to_vec();
            Ok(LlmResponse {
                content: vec![ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: tool_choice.unwrap_or_default().to_string(),
                    input: self.output.clone(),
                }],
                stop_reason: StopReason::ToolUse,
            })
        }
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl LlmProvider for FailingProvider {
        async fn chat(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _tools: &[serde_json::Value],
            _tool_choice: Option<&str>,
        ) -> Result<LlmResponse, AiError> {
            Err(AiError::Provider {
                message: "service unavailable".to_string(),
            })
        }
    }

    fn alert_input() -> CrowdAlertInput {
        CrowdAlertInput {
            recent_crowd_data: vec![100.0, 120.0],
            historical_crowd_data: vec![DataPoint::new("4pm", 100.0), DataPoint::new("5pm", 120.0)],
            location: "Central Plaza".to_string(),
        }
    }

    fn user_text(provider: &FakeProvider) -> String {
        match &provider.last_messages.lock().unwrap()[0].content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(_) => panic!("expected text message"),
        }
    }

    #[tokio::test]
    async fn alert_returns_three_points_and_names_expected_labels() {
        let provider = FakeProvider::new(serde_json::json!({
            "predictionText": "Crowds will ease after 6pm.",
            "predictedData": [
                { "time": "6pm", "density": 110 },
                { "time": "7pm", "density": 90 },
                { "time": "8pm", "density": 60 }
            ]
        }));
        let prediction = crowd_density_alert(&provider, &alert_input()).await.unwrap();
        assert_eq!(prediction.predicted_data.len(), 3);
        assert_eq!(prediction.predicted_data[0].time, "6pm");
        assert!(user_text(&provider).contains("6pm, 7pm, 8pm"));
    }

    #[tokio::test]
    async fn alert_tolerates_unexpected_labels() {
        let provider = FakeProvider::new(serde_json::json!({
            "predictionText": "Steady.",
            "predictedData": [
                { "time": "+1h", "density": 1 },
                { "time": "+2h", "density": 2 },
                { "time": "+3h", "density": 3 }
            ]
        }));
        assert!(crowd_density_alert(&provider, &alert_input()).await.is_ok());
    }

    #[tokio::test]
    async fn alert_without_hour_labels_omits_label_hint() {
        let output = serde_json::json!({
            "predictionText": "Not enough history to be sure.",
            "predictedData": [
                { "time": "later", "density": 10 },
                { "time": "later", "density": 12 },
                { "time": "later", "density": 14 }
            ]
        });

        let empty = CrowdAlertInput {
            recent_crowd_data: vec![],
            historical_crowd_data: vec![],
            location: "New Site".to_string(),
        };
        let provider = FakeProvider::new(output.clone());
        let prediction = crowd_density_alert(&provider, &empty).await.unwrap();
        assert_eq!(prediction.predicted_data.len(), 3);
        assert!(!user_text(&provider).contains("Label the forecast points"));

        let timestamps = CrowdAlertInput {
            recent_crowd_data: vec![40.0],
            historical_crowd_data: vec![DataPoint::new("14:05", 40.0)],
            location: "Gate 3".to_string(),
        };
        let provider = FakeProvider::new(output);
        assert!(crowd_density_alert(&provider, &timestamps).await.is_ok());
        assert_eq!(provider.calls(), 1);
        assert!(!user_text(&provider).contains("Label the forecast points"));
    }

    #[tokio::test]
    async fn alert_rejects_wrong_point_count() {
        let provider = FakeProvider::new(serde_json::json!({
            "predictionText": "Busy.",
            "predictedData": [{ "time": "6pm", "density": 1 }]
        }));
        let err = crowd_density_alert(&provider, &alert_input())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Validation { .. }));
    }

    #[tokio::test]
    async fn alert_rejects_negative_density() {
        let provider = FakeProvider::new(serde_json::json!({
            "predictionText": "Busy.",
            "predictedData": [
                { "time": "6pm", "density": 1 },
                { "time": "7pm", "density": -4 },
                { "time": "8pm", "density": 1 }
            ]
        }));
        assert!(matches!(
            crowd_density_alert(&provider, &alert_input()).await,
            Err(AiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn alert_surfaces_transport_failure() {
        assert!(matches!(
            crowd_density_alert(&FailingProvider, &alert_input()).await,
            Err(AiError::Provider { .. })
        ));
    }

    #[tokio::test]
    async fn detect_sends_image_block_and_validates_range() {
        let provider = FakeProvider::new(serde_json::json!({ "crowdDensity": 42 }));
        let input = DetectCrowdInput {
            image_data_uri: "data:image/jpeg;base64,aGVsbG8=".to_string(),
        };
        let estimate = detect_crowd_from_image(&provider, &input).await.unwrap();
        assert!((estimate.crowd_density - 42.0).abs() < f64::EPSILON);

        let messages = provider.last_messages.lock().unwrap().clone();
        let MessageContent::Blocks(blocks) = &messages[0].content else {
            panic!("expected content blocks");
        };
        assert!(blocks.iter().any(|b| matches!(
            b,
            ContentBlock::Image { media_type, data } if media_type == "image/jpeg" && data == "aGVsbG8="
        )));

        let too_high = FakeProvider::new(serde_json::json!({ "crowdDensity": 140 }));
        assert!(matches!(
            detect_crowd_from_image(&too_high, &input).await,
            Err(AiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn detect_rejects_bad_uri_without_calling_provider() {
        let provider = FakeProvider::new(serde_json::json!({ "crowdDensity": 10 }));
        let input = DetectCrowdInput {
            image_data_uri: "data:text/plain;base64,aGVsbG8=".to_string(),
        };
        assert!(matches!(
            detect_crowd_from_image(&provider, &input).await,
            Err(AiError::DataUri(_))
        ));
        assert_eq!(provider.calls(), 0);
    }

    fn day_profile(capacity: f64, current: f64) -> serde_json::Value {
        let points: Vec<serde_json::Value> = hour_range(DAY_START_HOUR, DAY_END_HOUR)
            .into_iter()
            .enumerate()
            .map(|(i, time)| serde_json::json!({ "time": time, "density": (i + 1) * 10 }))
            .collect();
        serde_json::json!({
            "maxCapacity": capacity,
            "currentDensity": current,
            "historicalData": points
        })
    }

    #[tokio::test]
    async fn generate_accepts_day_profile() {
        let provider = FakeProvider::new(day_profile(299.7, 90.0));
        let data = generate_location_data(
            &provider,
            &GenerateLocationInput {
                location_name: "  Grand Central Market ".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(data.historical_data.len(), GENERATED_POINT_COUNT);
        assert_eq!(data.rounded_capacity(), 300);
        assert!(user_text(&provider).contains("Location Name: Grand Central Market\n"));
    }

    #[tokio::test]
    async fn generate_keeps_mismatched_current_density() {
        let provider = FakeProvider::new(day_profile(300.0, 55.0));
        let data = generate_location_data(
            &provider,
            &GenerateLocationInput {
                location_name: "Cafe".to_string(),
            },
        )
        .await
        .unwrap();
        assert!((data.current_density - 55.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn generate_rejects_empty_name_and_bad_capacity() {
        let provider = FakeProvider::new(day_profile(300.0, 90.0));
        assert!(matches!(
            generate_location_data(
                &provider,
                &GenerateLocationInput {
                    location_name: "   ".to_string(),
                },
            )
            .await,
            Err(AiError::InvalidInput { .. })
        ));
        assert_eq!(provider.calls(), 0);

        let zero = FakeProvider::new(day_profile(0.2, 90.0));
        assert!(matches!(
            generate_location_data(
                &zero,
                &GenerateLocationInput {
                    location_name: "Closet".to_string(),
                },
            )
            .await,
            Err(AiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn chat_replies_and_rejects_blank() {
        let input = ChatInput {
            history: vec![ChatTurn {
                role: ChatRole::User,
                content: "hi".to_string(),
            }],
            message: "What does the statistics page show?".to_string(),
        };
        let provider = FakeProvider::new(serde_json::json!({ "reply": "Averages and extremes." }));
        assert_eq!(
            chat(&provider, &input).await.unwrap().reply,
            "Averages and extremes."
        );

        let blank = FakeProvider::new(serde_json::json!({ "reply": "  " }));
        assert!(matches!(
            chat(&blank, &input).await,
            Err(AiError::Validation { .. })
        ));
    }

    #[test]
    fn tool_names_are_forced_per_flow() {
        assert_eq!(prediction_tool()["name"], PREDICTION_TOOL);
        assert_eq!(crowd_density_tool()["name"], CROWD_DENSITY_TOOL);
        assert_eq!(location_data_tool()["name"], LOCATION_DATA_TOOL);
        assert_eq!(chat_reply_tool()["name"], CHAT_REPLY_TOOL);
    }
}
