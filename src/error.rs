use aide::{gen::GenContext, openapi::Operation, OperationOutput};
use axum::{
	body::Body,
	extract::rejection,
	http::{header, Response, StatusCode},
	response::{Html, IntoResponse, Redirect},
	Json,
};
use serde::Serialize;
use tower_governor::GovernorError;
use uuid::Uuid;

use crate::{route::auth, session, store, view};

/// Error type for the application.
///
/// The Display trait is not sent to the client for internal errors,
/// so it can show sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("form error: {0}")]
	Form(#[from] rejection::FormRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("auth error: {0}")]
	Auth(#[from] auth::Error),
	#[error("post {0} belongs to another user")]
	Forbidden(Uuid),
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown tag {0}")]
	UnknownTag(String),
	#[error("no user exists to own the post")]
	NoAuthor,
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("template error: {0}")]
	Template(#[from] askama::Error),
	#[error("rate limit error: {0}")]
	RateLimit(#[from] GovernorError),
}

impl From<sqlx::Error> for Error {
	fn from(error: sqlx::Error) -> Self {
		Self::Store(error.into())
	}
}

impl Error {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Form(..) => StatusCode::BAD_REQUEST,
			Self::Path(..) | Self::UnknownPost(..) | Self::UnknownTag(..) => StatusCode::NOT_FOUND,
			Self::Auth(error) => error.status(),
			Self::Forbidden(..) => StatusCode::FORBIDDEN,
			Self::NoAuthor => StatusCode::UNPROCESSABLE_ENTITY,
			Self::Store(store::Error::UsernameTaken | store::Error::EmailTaken) => {
				StatusCode::CONFLICT
			}
			Self::RateLimit(GovernorError::TooManyRequests { .. }) => {
				StatusCode::TOO_MANY_REQUESTS
			}
			Self::RateLimit(GovernorError::Other { code, .. }) => *code,
			Self::Store(..) | Self::Template(..) | Self::RateLimit(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}

	/// Messages that are safe to show to the client.
	pub fn messages(&self) -> Vec<String> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors
						.iter()
						.map(move |error| format!("{field}: {}", describe(error)))
				})
				.collect(),
			Self::Json(error) => vec![error.body_text()],
			Self::Form(error) => vec![error.body_text()],
			Self::Path(..) => vec!["not found".into()],
			Self::Auth(auth::Error::Argon(..)) => Vec::new(),
			Self::Auth(error) => vec![error.to_string()],
			Self::Forbidden(..) => vec![FORBIDDEN_MESSAGE.into()],
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				vec![format!("too many requests, retry in {wait_time}s")]
			}
			Self::UnknownPost(..)
			| Self::UnknownTag(..)
			| Self::NoAuthor
			| Self::Store(store::Error::UsernameTaken | store::Error::EmailTaken) => {
				vec![self.to_string()]
			}
			Self::Store(..) | Self::Template(..) | Self::RateLimit(..) => Vec::new(),
		}
	}

	fn rate_limit_headers(&self) -> Option<&axum::http::HeaderMap> {
		match self {
			Self::RateLimit(
				GovernorError::TooManyRequests { headers, .. } | GovernorError::Other { headers, .. },
			) => headers.as_ref(),
			_ => None,
		}
	}

	fn log(&self) {
		if self.status().is_server_error() {
			tracing::error!(error = %self, "request failed");
		} else {
			tracing::debug!(error = %self, "request rejected");
		}
	}
}

pub const FORBIDDEN_MESSAGE: &str = "You can only modify your own posts.";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";

/// Human readable text for a single validation failure.
pub fn describe(error: &validator::ValidationError) -> String {
	error
		.message
		.as_ref()
		.map_or_else(|| error.code.to_string(), |message| message.to_string())
}

/// Redirects to `to`, leaving `message` to be shown on the next rendered page.
pub fn redirect_with_flash(to: &str, message: &str) -> Response<Body> {
	(
		[(
			header::SET_COOKIE,
			session::header_value(&session::flash_cookie(message)),
		)],
		Redirect::to(to),
	)
		.into_response()
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		self.into_page(view::Layout::anonymous())
	}
}

impl Error {
	/// Renders the error as a page inside `layout`, or as a flash redirect.
	pub fn into_page(self, layout: view::Layout<'_>) -> Response<Body> {
		self.log();

		match self {
			Self::Auth(auth::Error::InvalidUsernameOrPassword) => {
				redirect_with_flash("/login", &auth::Error::InvalidUsernameOrPassword.to_string())
			}
			Self::Auth(auth::Error::LoginRequired) => {
				redirect_with_flash("/login", LOGIN_REQUIRED_MESSAGE)
			}
			Self::Forbidden(..) => redirect_with_flash("/", FORBIDDEN_MESSAGE),
			error => {
				let status = error.status();
				let message = error
					.messages()
					.into_iter()
					.next()
					.unwrap_or_else(|| "Something went wrong.".into());

				let page = view::ErrorPage {
					layout,
					status: status.as_u16(),
					reason: status.canonical_reason().unwrap_or("Error"),
					message: &message,
				};

				let body = askama::Template::render(&page).unwrap_or(message);
				let mut response = (status, Html(body)).into_response();

				if let Some(headers) = error.rate_limit_headers() {
					response.headers_mut().extend(headers.clone());
				}

				response
			}
		}
	}
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<String>,
}

/// An [`Error`] rendered as a JSON body, used by the API routes.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl<E> From<E> for ApiError
where
	Error: From<E>,
{
	fn from(error: E) -> Self {
		Self(Error::from(error))
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response<Body> {
		let error = self.0;

		error.log();

		let mut response = (
			error.status(),
			Json(ErrorResponse {
				success: false,
				errors: error.messages(),
			}),
		)
			.into_response();

		if let Some(headers) = error.rate_limit_headers() {
			response.headers_mut().extend(headers.clone());
		}

		response
	}
}

impl OperationOutput for ApiError {
	type Inner = ErrorResponse;

	fn operation_response(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Option<aide::openapi::Response> {
		Json::<ErrorResponse>::operation_response(ctx, operation)
	}
}
