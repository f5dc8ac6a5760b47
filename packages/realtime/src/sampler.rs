//! Interval-driven frame analysis with a single in-flight call.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crowdwatch_ai::DataUri;
use crowdwatch_ai::flows::detect_crowd_from_image;
use crowdwatch_ai::providers::LlmProvider;
use crowdwatch_ai_models::DetectCrowdInput;
use crowdwatch_location_models::DataPoint;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::window::{RollingWindow, WINDOW_SIZE};
use crate::{ANALYSIS_FAILED_MESSAGE, CaptureError, FrameSource};

/// Default seconds between captures.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

const EVENT_BUFFER: usize = 32;

/// Sampler settings.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Time between capture attempts.
    pub interval: Duration,
    /// Points kept in the rolling window.
    pub window_size: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            window_size: WINDOW_SIZE,
        }
    }
}

impl SamplerConfig {
    /// Reads `SAMPLE_INTERVAL_SECS`, falling back to the default for unset,
    /// unparsable or zero values.
    #[must_use]
    pub fn from_env() -> Self {
        let secs = std::env::var("SAMPLE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        Self {
            interval: Duration::from_secs(secs),
            ..Self::default()
        }
    }
}

/// Something the sampler wants the caller to know about.
#[derive(Debug, Clone)]
pub enum SamplerEvent {
    /// A frame was analyzed.
    Sample {
        /// The new point, labelled with local `HH:MM`.
        point: DataPoint,
        /// The window after adding `point`, oldest first.
        window: Vec<DataPoint>,
    },
    /// Analysis failed; the window is unchanged.
    Failed {
        /// User-facing message.
        message: String,
        /// Underlying error, for logs.
        detail: String,
    },
    /// A tick fired while an analysis was still pending.
    Skipped,
    /// No frame could be captured.
    CaptureFailed {
        /// User-facing description.
        message: String,
        /// Whether the sampler stopped because of it.
        fatal: bool,
    },
}

/// Running sampler. Dropping the handle's receiver also stops it.
pub struct SamplerHandle {
    /// Event stream.
    pub events: mpsc::Receiver<SamplerEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    /// Stops sampling and waits for the loop to exit.
    ///
    /// An analysis already in flight still completes. Events not yet read
    /// from [`Self::events`], including that analysis's result, are
    /// returned in order.
    pub async fn shutdown(mut self) -> Vec<SamplerEvent> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        // Every sender is gone once the loop and its pending analysis end.
        let mut remaining = Vec::new();
        while let Some(event) = self.events.recv().await {
            remaining.push(event);
        }

        if let Err(e) = (&mut self.task).await {
            log::error!("Sampler task failed: {e}");
        }
        remaining
    }
}

/// Periodic capture-and-analyze loop.
pub struct Sampler {
    provider: Arc<dyn LlmProvider>,
    config: SamplerConfig,
}

impl Sampler {
    /// Creates a sampler that analyzes frames with `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, config: SamplerConfig) -> Self {
        Self { provider, config }
    }

    /// Starts sampling `source` on the current Tokio runtime.
    pub fn spawn(self, source: Box<dyn FrameSource>) -> SamplerHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(self.run(source, events_tx, shutdown_rx));

        SamplerHandle {
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    async fn run(
        self,
        mut source: Box<dyn FrameSource>,
        events: mpsc::Sender<SamplerEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let window = Arc::new(Mutex::new(RollingWindow::new(self.config.window_size)));
        let mut pending: Option<JoinHandle<()>> = None;

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!("Sampling every {}s", self.config.interval.as_secs_f64());

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            if events.is_closed() {
                log::debug!("Sampler event receiver dropped");
                break;
            }

            if pending.as_ref().is_some_and(|task| !task.is_finished()) {
                log::debug!("Analysis still pending, skipping tick");
                if events.send(SamplerEvent::Skipped).await.is_err() {
                    break;
                }
                continue;
            }

            let frame = match source.capture().await {
                Ok(frame) => frame,
                Err(e) => {
                    let fatal = e.is_fatal();
                    log::error!("Frame capture failed: {e}");
                    let event = SamplerEvent::CaptureFailed {
                        message: capture_message(&e),
                        fatal,
                    };
                    if events.send(event).await.is_err() || fatal {
                        break;
                    }
                    continue;
                }
            };

            pending = Some(tokio::spawn(analyze(
                Arc::clone(&self.provider),
                frame,
                Arc::clone(&window),
                events.clone(),
            )));
        }

        if let Some(task) = pending {
            if let Err(e) = task.await {
                log::error!("Frame analysis task failed: {e}");
            }
        }

        log::info!("Sampler stopped");
    }
}

/// Analyzes one frame and reports the outcome.
async fn analyze(
    provider: Arc<dyn LlmProvider>,
    frame: DataUri,
    window: Arc<Mutex<RollingWindow>>,
    events: mpsc::Sender<SamplerEvent>,
) {
    let input = DetectCrowdInput {
        image_data_uri: frame.to_string(),
    };

    let event = match detect_crowd_from_image(provider.as_ref(), &input).await {
        Ok(estimate) => {
            let point = DataPoint::new(
                chrono::Local::now().format("%H:%M").to_string(),
                estimate.crowd_density,
            );
            let snapshot = {
                let mut w = window.lock().unwrap_or_else(PoisonError::into_inner);
                w.push(point.clone());
                w.points()
            };
            SamplerEvent::Sample {
                point,
                window: snapshot,
            }
        }
        Err(e) => {
            log::error!("Error analyzing frame: {e}");
            SamplerEvent::Failed {
                message: ANALYSIS_FAILED_MESSAGE.to_string(),
                detail: e.to_string(),
            }
        }
    };

    if events.send(event).await.is_err() {
        log::debug!("Sampler event receiver dropped before analysis finished");
    }
}

fn capture_message(e: &CaptureError) -> String {
    match e {
        CaptureError::PermissionDenied(_) => {
            "Camera access denied. Please enable camera permissions to use this feature."
                .to_string()
        }
        CaptureError::Unsupported(_) => {
            "No supported camera is available on this device.".to_string()
        }
        CaptureError::Unavailable(_) => "Could not capture a frame from the camera.".to_string(),
    }
}
