use axum::{http::StatusCode, routing::get, Router};
use tower_governor::GovernorLayer;

use crate::{ratelimit, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid username or password")]
	InvalidUsernameOrPassword,
	#[error("login required")]
	LoginRequired,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::InvalidUsernameOrPassword | Self::LoginRequired => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

/// Login, signup and logout pages. `limit` throttles the credential forms.
pub fn routes(limit: Option<ratelimit::Limit>) -> Router<AppState> {
	use route::*;

	let credentials = Router::new()
		.route("/login", get(login_form).post(login))
		.route("/signup", get(signup_form).post(signup));

	let credentials = match limit {
		Some(config) => credentials.route_layer(GovernorLayer { config }),
		None => credentials,
	};

	credentials.route("/logout", get(logout))
}
