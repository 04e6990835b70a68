use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ropscan::api::server::run_server;
use ropscan::api::types::ApiContext;
use ropscan::config;
use ropscan::db::open_database;
use ropscan::inference::{Classifier, ImagePreprocessor, InferencePipeline};
use ropscan::intake::IntakeService;

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let uploads_dir = config::uploads_dir();
    std::fs::create_dir_all(&uploads_dir)
        .map_err(|e| format!("Cannot create uploads directory: {e}"))?;

    let conn = open_database(&config::database_path())
        .map_err(|e| format!("Database initialization failed: {e}"))?;

    let classifier = build_classifier();
    let pipeline = Arc::new(InferencePipeline::new(
        ImagePreprocessor::new(config::MODEL_INPUT_SIZE),
        classifier,
        &config::CLASS_LABELS,
    ));
    let intake = Arc::new(IntakeService::new(uploads_dir, pipeline));
    let ctx = ApiContext::new(conn, intake);

    run_server(ctx, config::bind_addr()).await
}

#[cfg(feature = "onnx-model")]
fn build_classifier() -> Arc<dyn Classifier> {
    use ropscan::inference::OnnxClassifier;
    let path = config::model_path();
    tracing::info!(model = %path.display(), "Using ONNX classifier");
    Arc::new(OnnxClassifier::new(&path, config::CLASS_LABELS.len()))
}

#[cfg(not(feature = "onnx-model"))]
fn build_classifier() -> Arc<dyn Classifier> {
    use ropscan::inference::MockClassifier;
    tracing::warn!("Built without the onnx-model feature; using the mock classifier");
    Arc::new(MockClassifier::new(config::CLASS_LABELS.len()))
}
