mod context;

pub use context::Context;

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::de;

use crate::error::{ApiError, Error};

/// Extractor that deserializes a JSON body and validates it.
///
/// T must implement [`serde::de::DeserializeOwned`] and [`validator::Validate`]
/// in order to be used in an extractor. Rejections are rendered as JSON.
///
/// ```rust
/// async fn route(Json(post): Json<CreatePostInput>) {
///   // ...
/// }
/// ```
#[derive(OperationIo)]
#[aide(input_with = "axum::Json<T>", output_with = "axum::Json<T>", json_schema)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
	T: serde::Serialize,
{
	fn into_response(self) -> Response<Body> {
		axum::extract::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: de::DeserializeOwned + validator::Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Json::<T>::from_request(req, state)
			.await?
			.0;

		result.validate()?;
		Ok(Self(result))
	}
}

/// Extractor that deserializes a url-encoded form body.
///
/// Unlike [`Json<T>`], this does not validate the input: form handlers
/// re-render the form with the validation messages instead of rejecting.
pub struct Form<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Form<T>
where
	T: de::DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Form::<T>::from_request(req, state)
			.await?
			.0;

		Ok(Self(result))
	}
}

/// Extractor that deserializes a path parameter.
///
/// A parameter that does not parse (such as a malformed id) is
/// reported as not found.
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: de::DeserializeOwned + Send,
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Path::<T>::from_request_parts(parts, state)
			.await?
			.0;

		Ok(Self(result))
	}
}
