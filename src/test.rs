use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use axum_test::{TestResponse, TestServer, TestServerConfig};

pub use axum::http::StatusCode;
pub use serde_json::json;

use crate::{config::Config, store::MemoryStore, Database, State};

pub const PASSWORD: &str = "correct horse battery staple";

/// A cheap hasher so tests don't spend their time in argon2.
pub fn hasher() -> Argon2<'static> {
	Argon2::new(
		Algorithm::Argon2id,
		Version::V0x13,
		Params::new(1024, 1, 1, Some(32)).unwrap(),
	)
}

/// A server backed by an empty in-memory store, keeping cookies between requests.
pub fn app() -> TestServer {
	app_with(Arc::new(MemoryStore::new()))
}

pub fn app_with(database: Database) -> TestServer {
	let state = State {
		database,
		hasher: hasher(),
		config: Arc::new(Config::default()),
	};

	TestServer::new_with_config(
		crate::app(state, None),
		TestServerConfig {
			save_cookies: true,
			..TestServerConfig::default()
		},
	)
	.unwrap()
}

#[track_caller]
pub fn assert_redirect(response: &TestResponse, location: &str) {
	assert!(
		response.status_code().is_redirection(),
		"expected a redirect to {location}, got {}",
		response.status_code()
	);
	assert_eq!(response.header("location"), location);
}

/// Registers `username` with [`PASSWORD`] and a matching email address.
pub async fn signup(server: &TestServer, username: &str) {
	let email = format!("{username}@example.com");
	let response = server
		.post("/signup")
		.form(&[
			("username", username),
			("email", email.as_str()),
			("password", PASSWORD),
			("confirm", PASSWORD),
		])
		.await;

	assert_redirect(&response, "/login");
}

/// Registers `username` and logs the server's cookie jar in as them.
pub async fn login(server: &TestServer, username: &str) {
	signup(server, username).await;

	let response = server
		.post("/login")
		.form(&[("username", username), ("password", PASSWORD)])
		.await;

	assert_redirect(&response, "/");
}

/// Creates a post as the logged in user and returns its page's path.
pub async fn create_post(server: &TestServer, title: &str, tags: &str) -> String {
	let response = server
		.post("/create")
		.form(&[
			("title", title),
			("content", "Some *Markdown* content."),
			("tags", tags),
		])
		.await;

	assert!(response.status_code().is_redirection());

	response.header("location").to_str().unwrap().to_string()
}
