use opentelemetry::{trace::TraceError, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "inkwell=info,tower_http=info";

/// Constructs a [`Resource`] which describes the service.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(
				DEPLOYMENT_ENVIRONMENT,
				if cfg!(debug_assertions) {
					"development"
				} else {
					"production"
				},
			),
		],
		SCHEMA_URL,
	)
}

/// Constructs a [`Tracer`] that batches spans to the OTLP collector at `endpoint`.
fn init_tracer(endpoint: &str) -> Result<Tracer, TraceError> {
	opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::AlwaysOn)
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(
			opentelemetry_otlp::new_exporter()
				.tonic()
				.with_endpoint(endpoint),
		)
		.install_batch(runtime::Tokio)
}

fn env_filter() -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initializes the tracing subscriber, returning a guard that flushes
/// exported spans when dropped.
///
/// Spans are only exported when an OTLP endpoint is configured; logs always
/// go to stdout.
pub fn init_tracing_subscriber(config: &Config) -> Result<OtelGuard, TraceError> {
	let tracer = config.otlp_endpoint.as_deref().map(init_tracer).transpose()?;
	let exporting = tracer.is_some();

	tracing_subscriber::registry()
		.with(env_filter())
		.with(tracing_subscriber::fmt::layer().with_ansi(true))
		.with(tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
		.init();

	Ok(OtelGuard { exporting })
}

pub struct OtelGuard {
	exporting: bool,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		if self.exporting {
			opentelemetry::global::shutdown_tracer_provider();
		}
	}
}
