use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::error::ErrorResponse;

pub mod tag {
	pub const POST: &str = "Post";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("inkwell")
		.summary("A small multi-user blog")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Reading and publishing posts".into()),
			..Default::default()
		})
		.default_response_with::<axum::Json<ErrorResponse>, _>(|res| {
			res.example(ErrorResponse {
				success: false,
				errors: vec!["title: This field is required.".into()],
			})
		})
}
