use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use cookie::Cookie;
use uuid::Uuid;

use crate::{error::Error, model, route::auth, session, view::Layout, Database};

/// The per-request context: who is asking, and what message is waiting for them.
///
/// A missing, malformed or revoked session cookie yields an anonymous context
/// rather than an error; handlers that need a user call [`Context::user`].
///
/// ```rust
/// async fn route(ctx: Context) -> Result<Response, Error> {
///   let user = ctx.user()?;
///   // ...
/// }
/// ```
#[derive(Debug, Default)]
pub struct Context {
	/// The session the user is authenticated with.
	pub session_id: Option<Uuid>,
	pub user: Option<model::User>,
	/// A message left by the previous response, shown once.
	pub flash: Option<String>,
}

impl Context {
	/// Returns the authenticated user, or [`auth::Error::LoginRequired`].
	pub fn user(&self) -> Result<&model::User, Error> {
		self.user
			.as_ref()
			.ok_or_else(|| auth::Error::LoginRequired.into())
	}

	pub fn layout(&self) -> Layout<'_> {
		Layout {
			user: self.user.as_ref(),
			flash: self.flash.as_deref(),
		}
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Context
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	/// Resolves the session cookie into a user and picks up the flash cookie.
	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let cookies = parts
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.filter_map(|value| value.to_str().ok())
			.flat_map(Cookie::split_parse_encoded)
			.filter_map(Result::ok)
			.map(Cookie::into_owned)
			.collect::<Vec<_>>();

		let session_id = cookies
			.iter()
			.find(|cookie| cookie.name() == session::COOKIE_NAME)
			.and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

		let flash = cookies
			.iter()
			.find(|cookie| cookie.name() == session::FLASH_COOKIE_NAME)
			.map(|cookie| cookie.value().to_string())
			.filter(|message| !message.is_empty());

		let Some(session_id) = session_id else {
			return Ok(Self {
				flash,
				..Self::default()
			});
		};

		let database = Database::from_ref(state);
		let user = database.find_session_user(session_id).await?;

		Ok(Self {
			session_id: user.as_ref().map(|_| session_id),
			user,
			flash,
		})
	}
}
