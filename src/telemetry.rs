use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
/// RUST_LOG wins over the configured level when it is set.
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&observability.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);

    if observability.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!("Conductor telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the events of one workflow run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one started cycle of the conductor workflow
pub fn create_workflow_span(operation: &str, run_id: &str, epoch: u64) -> tracing::Span {
    tracing::info_span!(
        "workflow_run",
        operation = operation,
        run.id = run_id,
        epoch = epoch,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique_uuids() {
        let a = generate_correlation_id();
        let b = generate_correlation_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
