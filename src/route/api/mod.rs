use aide::axum::{routing::get_with, ApiRouter};
use axum::routing::get;

use crate::AppState;

pub mod model;
pub mod route;

/// The JSON API, documented through aide. The OpenAPI document itself is
/// served at `/api/docs.json`.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/api/posts",
			get_with(list_posts, list_posts_docs).post_with(create_post, create_post_docs),
		)
		.route("/api/docs.json", get(serve_docs))
}
