use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::PeerIpKeyExtractor,
	GovernorError,
};

/// A per-IP quota. Requires the connection's [`std::net::SocketAddr`] to be
/// available through `ConnectInfo`.
pub type Limit = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// The quotas applied by the router.
pub struct Limits {
	/// Applied to every route.
	pub default: Limit,
	/// Applied on top of `default` to the login and signup forms.
	pub credentials: Limit,
}

impl Limits {
	/// Returns `None` if a quota is empty, which would reject every request.
	pub fn new() -> Option<Self> {
		Some(Self {
			default: quota(Duration::from_millis(100), 50)?,
			credentials: quota(Duration::from_secs(2), 5)?,
		})
	}

	/// Periodically drops the state of clients that are back within their quota.
	pub fn spawn_cleanup(&self) {
		let limiters = [&self.default, &self.credentials]
			.map(|config| config.limiter().clone());

		tokio::spawn(async move {
			let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

			loop {
				interval.tick().await;

				for limiter in &limiters {
					tracing::debug!(size = limiter.len(), "rate limiting storage");

					limiter.retain_recent();
				}
			}
		});
	}
}

/// One request is replenished every `period`, up to `burst` at once.
fn quota(period: Duration, burst: u32) -> Option<Limit> {
	GovernorConfigBuilder::default()
		.period(period)
		.burst_size(burst)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	crate::Error::from(error).into_response()
}

#[cfg(test)]
mod test {
	#[test]
	fn test_limits_are_valid() {
		assert!(super::Limits::new().is_some());
	}
}
