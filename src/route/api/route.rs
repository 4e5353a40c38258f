use std::sync::Arc;

use aide::{
	gen::GenContext,
	openapi::{OpenApi, Operation},
	OperationOutput,
};
use axum::{
	body::Body,
	extract::State,
	http::{Response, StatusCode},
	response::IntoResponse,
	Extension,
};
use macros::route;
use schemars::JsonSchema;
use serde::Serialize;

use crate::{
	error::{ApiError, Error},
	extract::Json,
	openapi::tag,
	Database,
};

use super::model;

/// A JSON body sent with `201 Created`.
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
	fn into_response(self) -> Response<Body> {
		(StatusCode::CREATED, axum::Json(self.0)).into_response()
	}
}

impl<T: JsonSchema> OperationOutput for Created<T> {
	type Inner = T;

	fn operation_response(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Option<aide::openapi::Response> {
		axum::Json::<T>::operation_response(ctx, operation)
	}

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, aide::openapi::Response)> {
		Self::operation_response(ctx, operation)
			.map(|response| vec![(Some(201), response)])
			.unwrap_or_default()
	}
}

/// List posts
/// Returns every post, newest first. This endpoint is not paginated.
#[route(tag = tag::POST)]
pub async fn list_posts(
	State(database): State<Database>,
) -> Result<Json<Vec<model::ApiPost>>, ApiError> {
	let posts = database.all_posts().await?;

	Ok(Json(posts.into_iter().map(model::ApiPost::from).collect()))
}

/// Create post
/// Creates a post from a title, Markdown content and optional tags.
/// The post is attributed to the earliest registered user, so at least one
/// account must exist.
#[route(
	tag = tag::POST,
	response(status = 201, description = "The created post.", shape = "Json<model::ApiPost>"),
	response(status = 422, description = "No account exists to own the post.", shape = "Json<crate::error::ErrorResponse>")
)]
pub async fn create_post(
	State(database): State<Database>,
	Json(input): Json<model::CreatePostInput>,
) -> Result<Created<model::ApiPost>, ApiError> {
	let author = database.first_user().await?.ok_or(Error::NoAuthor)?;
	let post = database.create_post(author.id, input.changes()).await?;

	tracing::info!(post = %post.id, user = %author.id, "created post through the api");

	Ok(Created(post.into()))
}

pub async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> Response<Body> {
	axum::Json(api.as_ref()).into_response()
}
