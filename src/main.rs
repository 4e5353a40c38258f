#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod markdown;
mod model;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
#[cfg(test)]
mod test;
mod trace;
mod view;

use std::{net::SocketAddr, sync::Arc};

use aide::openapi::OpenApi;
use argon2::Argon2;
use axum::{extract::Request, Extension, Router};
use tokio::signal;
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

pub use error::Error;

pub type Database = Arc<dyn store::Store>;
pub type AppState = State;

/// `DATABASE_URL` value that selects the in-memory store.
const MEMORY_DATABASE_URL: &str = "memory";

/// The shared application state.
///
/// Handlers extract the parts they need (`State<Database>`, `State<Arc<Config>>`)
/// through [`axum::extract::FromRef`].
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub config: Arc<config::Config>,
}

/// Builds the application router.
///
/// Rate limiting is skipped when `limits` is `None`. When it is set, the
/// router must be served with `ConnectInfo<SocketAddr>`.
pub fn app(state: State, limits: Option<&ratelimit::Limits>) -> Router {
	let mut api = OpenApi::default();

	let router = route::api::routes()
		.finish_api_with(&mut api, openapi::docs)
		.merge(route::post::routes())
		.merge(route::auth::routes(
			limits.map(|limits| limits.credentials.clone()),
		))
		.layer(Extension(Arc::new(api)))
		.with_state(state);

	let router = match limits {
		Some(limits) => router.layer(GovernorLayer {
			config: limits.default.clone(),
		}),
		None => router,
	};

	router.layer(
		ServiceBuilder::new()
			.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
			.layer(
				TraceLayer::new_for_http().make_span_with(|request: &Request| {
					let request_id = request
						.headers()
						.get("x-request-id")
						.and_then(|id| id.to_str().ok())
						.unwrap_or_default();

					tracing::info_span!(
						"request",
						method = %request.method(),
						uri = %request.uri(),
						request_id
					)
				}),
			)
			.layer(PropagateRequestIdLayer::x_request_id())
			.layer(CompressionLayer::new()),
	)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	dotenvy::dotenv().ok();

	let config = config::Config::from_env()?;
	let _guard = trace::init_tracing_subscriber(&config)?;

	let database: Database = if config.database_url == MEMORY_DATABASE_URL {
		tracing::warn!("using the in-memory store, nothing will be persisted");

		Arc::new(store::MemoryStore::new())
	} else {
		let database = store::PgStore::new(
			sqlx::postgres::PgPoolOptions::new()
				.connect(&config.database_url)
				.await?,
		);

		database.migrate().await?;
		Arc::new(database)
	};

	let limits = if config.rate_limit {
		Some(ratelimit::Limits::new().ok_or("rate limit quotas must not be empty")?)
	} else {
		None
	};

	if let Some(limits) = &limits {
		limits.spawn_cleanup();
	}

	let address = SocketAddr::new(config.host, config.port);
	let state = State {
		database,
		hasher: Argon2::default(),
		config: Arc::new(config),
	};

	let listener = tokio::net::TcpListener::bind(address).await?;

	tracing::info!(%address, "listening");

	axum::serve(
		listener,
		app(state, limits.as_ref()).into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await?;

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = signal::ctrl_c().await {
			tracing::error!(%error, "failed to listen for ctrl-c");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut terminate) => {
				terminate.recv().await;
			}
			Err(error) => {
				tracing::error!(%error, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {},
		() = terminate => {},
	}

	tracing::info!("shutting down");
}
