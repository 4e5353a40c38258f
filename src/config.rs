use std::{net::IpAddr, str::FromStr};

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
	pub database_url: String,
	pub host: IpAddr,
	pub port: u16,
	/// Number of posts shown on each page of the feed.
	pub page_size: u32,
	/// Marks the session cookie as `Secure`. Enable when served over HTTPS.
	pub cookie_secure: bool,
	pub rate_limit: bool,
	/// OTLP collector endpoint. Span export is disabled when unset.
	pub otlp_endpoint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
}

impl Default for Config {
	fn default() -> Self {
		Self {
			database_url: String::new(),
			host: IpAddr::from([127, 0, 0, 1]),
			port: 3000,
			page_size: 5,
			cookie_secure: false,
			rate_limit: true,
			otlp_endpoint: None,
		}
	}
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds a configuration from any variable source, falling back to
	/// [`Config::default`] for everything except `DATABASE_URL`.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let defaults = Self::default();

		let page_size = parse(&lookup, "PAGE_SIZE", defaults.page_size)?;

		if page_size == 0 {
			return Err(ConfigError::Invalid {
				name: "PAGE_SIZE",
				value: page_size.to_string(),
			});
		}

		Ok(Self {
			database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
			host: parse(&lookup, "HOST", defaults.host)?,
			port: parse(&lookup, "PORT", defaults.port)?,
			page_size,
			cookie_secure: parse(&lookup, "COOKIE_SECURE", defaults.cookie_secure)?,
			rate_limit: parse(&lookup, "RATE_LIMIT", defaults.rate_limit)?,
			otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
		})
	}
}

fn parse<T: FromStr>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	default: T,
) -> Result<T, ConfigError> {
	match lookup(name) {
		Some(value) => value
			.parse()
			.map_err(|_| ConfigError::Invalid { name, value }),
		None => Ok(default),
	}
}
