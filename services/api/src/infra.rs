use crate::cli::ModelArgs;
use cardio_severity::config::AppConfig;
use cardio_severity::error::AppError;
use cardio_severity::severity::{ModelArtifactBundle, SeverityPipeline};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) pipeline: Arc<SeverityPipeline>,
}

/// Load the bundle named by CLI flags or configuration and apply threshold overrides.
///
/// A flag beats the environment, which beats the value persisted in the bundle.
pub(crate) fn load_pipeline(
    config: &AppConfig,
    overrides: &ModelArgs,
) -> Result<SeverityPipeline, AppError> {
    let path = overrides
        .bundle
        .clone()
        .unwrap_or_else(|| config.model.bundle_path.clone());

    let bundle = ModelArtifactBundle::from_path(&path)?;
    let mut pipeline = SeverityPipeline::from_bundle(bundle)?;

    let threshold = overrides
        .low_confidence_threshold
        .or(config.model.low_confidence_threshold);
    if let Some(threshold) = threshold {
        pipeline = pipeline.with_low_confidence_threshold(threshold)?;
        info!(threshold, "low-confidence threshold overridden");
    }

    Ok(pipeline)
}
