//! Implementations behind each subcommand and menu entry.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crowdwatch_ai::AiError;
use crowdwatch_ai::providers::{LlmProvider, create_provider_from_env};
use crowdwatch_analytics_models::StatsSummary;
use crowdwatch_cli_utils::{MultiProgress, with_spinner};
use crowdwatch_location::{LocationRegistry, RegistryError, filter_by_name};
use crowdwatch_location_models::{DataPoint, Location};
use crowdwatch_realtime::{DirectoryFrameSource, Sampler, SamplerConfig, SamplerEvent};
use crowdwatch_server::actions;

/// State shared by the commands of one CLI run.
pub struct Session {
    multi: MultiProgress,
    registry: RwLock<LocationRegistry>,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl Session {
    /// A session over the seed locations. The LLM provider is created on
    /// first use so listing commands work without credentials.
    #[must_use]
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            registry: RwLock::new(LocationRegistry::seeded()),
            provider: None,
        }
    }

    #[cfg(test)]
    fn with_provider(multi: MultiProgress, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::new(multi)
        }
    }

    async fn provider(&mut self) -> Result<Arc<dyn LlmProvider>, AiError> {
        if let Some(provider) = &self.provider {
            return Ok(Arc::clone(provider));
        }
        let provider: Arc<dyn LlmProvider> = Arc::from(create_provider_from_env().await?);
        self.provider = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// Snapshot of all locations.
    #[must_use]
    pub fn locations(&self) -> Vec<Location> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .all()
            .to_vec()
    }

    fn selected_id(&self) -> Option<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .selected_id()
            .map(str::to_string)
    }
}

/// Prints the locations whose name contains `search`.
pub fn list_locations(session: &Session, search: &str) {
    let locations = session.locations();
    let matches = filter_by_name(&locations, search);

    if matches.is_empty() {
        println!("No locations match \"{search}\".");
        return;
    }

    let selected = session.selected_id();
    println!();
    println!(
        "  {:<15} {:<24} {:>9} {:>9} {:>8}  LEVEL",
        "ID", "NAME", "CURRENT", "CAPACITY", "OCCUP."
    );
    println!("{}", "-".repeat(86));
    for location in matches {
        let marker = if selected.as_deref() == Some(location.id.as_str()) {
            '*'
        } else {
            ' '
        };
        println!("{marker} {}", format_location_row(location));
    }
    println!();
}

/// Prints the aggregate statistics.
pub fn show_statistics(session: &Session) {
    let summary = crowdwatch_analytics::summarize(&session.locations());
    print!("{}", format_statistics(&summary));
}

/// Prints the forecast for `id` and selects it once the forecast succeeds.
///
/// # Errors
///
/// Returns an error if the location does not exist or no LLM provider is
/// configured.
pub async fn predict(session: &mut Session, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let location = session
        .registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .cloned()
        .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
    let provider = session.provider().await?;

    let response = with_spinner(
        &session.multi,
        &format!("Predicting crowds at {}...", location.name),
        actions::get_crowd_alert(provider.as_ref(), &location),
    )
    .await;

    if !response.success {
        println!("{}", response.message.unwrap_or_default());
        return Ok(());
    }

    session
        .registry
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .select(id)?;

    println!("\n{}\n", response.prediction_text.unwrap_or_default());
    for point in response.predicted_data.unwrap_or_default() {
        println!(
            "  {:>5}  {:>7.0}  {}",
            point.time,
            point.density,
            location_level_label(&location, &point)
        );
    }
    println!();

    Ok(())
}

/// Generates and adds a new location.
///
/// # Errors
///
/// Returns an error if no LLM provider is configured.
pub async fn add_location(
    session: &mut Session,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = session.provider().await?;

    let response = with_spinner(
        &session.multi,
        &format!("Generating data for {}...", name.trim()),
        actions::add_new_location(provider.as_ref(), &session.registry, name),
    )
    .await;

    match response.location {
        Some(view) if response.success => {
            println!(
                "Added {} (id {}): capacity {}, current {:.0}, {}",
                view.location.name,
                view.location.id,
                view.location.max_capacity,
                view.location.current_density,
                view.density_level
            );
        }
        _ => println!("{}", response.message.unwrap_or_default()),
    }

    Ok(())
}

/// Runs the interactive assistant.
///
/// # Errors
///
/// Returns an error if no LLM provider is configured or a prompt fails.
pub async fn chat(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let provider = session.provider().await?;
    crowdwatch_conversations::interactive::run(provider.as_ref()).await
}

/// Samples frames from `frames` until Ctrl-C, or until `samples` points
/// have been recorded. `interval_secs` overrides `SAMPLE_INTERVAL_SECS`.
///
/// # Errors
///
/// Returns an error if the directory has no usable images or no LLM
/// provider is configured.
pub async fn watch(
    session: &mut Session,
    frames: &Path,
    interval_secs: Option<u64>,
    samples: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = DirectoryFrameSource::open(frames)?;
    let provider = session.provider().await?;
    let mut config = SamplerConfig::from_env();
    if let Some(secs) = interval_secs.filter(|&s| s > 0) {
        config.interval = Duration::from_secs(secs);
    }

    println!(
        "Watching {} ({} frame(s), every {}s). Press Ctrl-C to stop.",
        frames.display(),
        source.len(),
        config.interval.as_secs()
    );

    let mut handle = Sampler::new(provider, config).spawn(Box::new(source));
    let mut recorded = 0usize;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = handle.events.recv() => {
                let Some(event) = event else { break };
                if print_event(event, &mut recorded) == WatchStep::Stop
                    || samples.is_some_and(|n| recorded >= n)
                {
                    break;
                }
            }
        }
    }

    for event in handle.shutdown().await {
        print_event(event, &mut recorded);
    }
    println!("Stopped after {recorded} sample(s).");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum WatchStep {
    Continue,
    Stop,
}

fn print_event(event: SamplerEvent, recorded: &mut usize) -> WatchStep {
    match event {
        SamplerEvent::Sample { point, window } => {
            *recorded += 1;
            println!("{}", format_sample(&point, &window));
        }
        SamplerEvent::Failed { message, .. } => println!("{message}"),
        SamplerEvent::Skipped => log::debug!("Previous frame still being analyzed"),
        SamplerEvent::CaptureFailed { message, fatal } => {
            println!("{message}");
            if fatal {
                return WatchStep::Stop;
            }
        }
    }
    WatchStep::Continue
}

/// Runs the API server until it exits.
///
/// The server uses actix-web's runtime, so it runs in a blocking task to
/// avoid nesting tokio runtimes.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    tokio::task::spawn_blocking(move || {
        let system = actix_web::rt::System::new();
        if interactive {
            system.block_on(crowdwatch_server::interactive::run())
        } else {
            system.block_on(crowdwatch_server::run_server())
        }
    })
    .await??;
    Ok(())
}

fn format_location_row(location: &Location) -> String {
    format!(
        "{:<15} {:<24} {:>9.0} {:>9} {:>7.0}%  {}",
        location.id,
        truncate(&location.name, 24),
        location.current_density,
        location.max_capacity,
        location.occupancy_percent(),
        location.density_level()
    )
}

fn format_statistics(summary: &StatsSummary) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "Locations:       {}", summary.location_count);
    let _ = writeln!(out, "Average density: {:.1}%", summary.average_density);
    let describe = |l: Option<&crowdwatch_analytics_models::CrowdedLocation>| {
        l.map_or_else(
            || "n/a".to_string(),
            |l| format!("{} ({:.0}%, {})", l.name, l.occupancy_percent, l.level),
        )
    };
    let _ = writeln!(
        out,
        "Most crowded:    {}",
        describe(summary.most_crowded.as_ref())
    );
    let _ = writeln!(
        out,
        "Least crowded:   {}",
        describe(summary.least_crowded.as_ref())
    );
    let _ = writeln!(out);

    for bar in &summary.chart {
        let _ = writeln!(
            out,
            "  {:<24} {:<30} {:>5.0}%",
            truncate(&bar.name, 24),
            chart_bar(bar.density, 30),
            bar.density
        );
    }
    let _ = writeln!(out);
    out
}

fn format_sample(point: &DataPoint, window: &[DataPoint]) -> String {
    let trend = window
        .iter()
        .map(|p| format!("{:.0}", p.density))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "[{}] density {:>3.0}  {}  (last {}: {trend})",
        point.time,
        point.density,
        chart_bar(point.density, 20),
        window.len()
    )
}

fn location_level_label(location: &Location, point: &DataPoint) -> String {
    crowdwatch_location_models::DensityLevel::classify(point.density, location.max_capacity)
        .to_string()
}

/// Horizontal bar for a percentage, capped at `width` cells.
fn chart_bar(percent: f64, width: usize) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = if percent.is_finite() {
        ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize
    } else {
        width
    };
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use crowdwatch_ai::providers::{ContentBlock, LlmResponse, Message, StopReason};
    use crowdwatch_cli_utils::ProgressDrawTarget;

    use super::*;

    /// Answers every request with the forced tool, or fails.
    struct FakeProvider {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FakeProvider {
        async fn chat(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _tools: &[serde_json::Value],
            tool_choice: Option<&str>,
        ) -> Result<LlmResponse, AiError> {
            if self.fail {
                return Err(AiError::Provider {
                    message: "unavailable".to_string(),
                });
            }
            Ok(LlmResponse {
                content: vec![ContentBlock::ToolUse {
                    id: "1".to_string(),
                    name: tool_choice.unwrap_or_default().to_string(),
                    input: serde_json::json!({
                        "predictionText": "Busy evening ahead.",
                        "predictedData": [
                            { "time": "6pm", "density": 300 },
                            { "time": "7pm", "density": 280 },
                            { "time": "8pm", "density": 200 }
                        ]
                    }),
                }],
                stop_reason: StopReason::ToolUse,
            })
        }
    }

    fn session(fail: bool) -> Session {
        Session::with_provider(
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            Arc::new(FakeProvider { fail }),
        )
    }

    #[tokio::test]
    async fn failed_prediction_keeps_selection() {
        let mut session = session(true);
        let before = session.selected_id();
        assert_eq!(before.as_deref(), Some("1"));

        predict(&mut session, "3").await.unwrap();

        assert_eq!(session.selected_id(), before);
        assert_eq!(session.locations().len(), 5);
    }

    #[tokio::test]
    async fn successful_prediction_selects_location() {
        let mut session = session(false);
        predict(&mut session, "3").await.unwrap();
        assert_eq!(session.selected_id().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn predicting_unknown_location_is_an_error() {
        let mut session = session(false);
        assert!(predict(&mut session, "missing").await.is_err());
        assert_eq!(session.selected_id().as_deref(), Some("1"));
    }

    #[test]
    fn chart_bar_scales_and_caps() {
        assert_eq!(chart_bar(50.0, 10), "#####.....");
        assert_eq!(chart_bar(250.0, 4), "####");
        assert_eq!(chart_bar(f64::INFINITY, 3), "###");
        assert_eq!(chart_bar(-5.0, 3), "...");
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("Short", 10), "Short");
        assert_eq!(truncate("A very long location name", 10), "A very ...");
    }

    #[test]
    fn row_shows_level_and_occupancy() {
        let location = LocationRegistry::seeded().all()[0].clone();
        let row = format_location_row(&location);
        assert!(row.contains("Central Plaza"));
        assert!(row.contains(&location.density_level().to_string()));
    }

    #[test]
    fn statistics_for_empty_registry_show_na() {
        let text = format_statistics(&crowdwatch_analytics::summarize(&[]));
        assert!(text.contains("Average density: 0.0%"));
        assert!(text.contains("Most crowded:    n/a"));
    }
}
