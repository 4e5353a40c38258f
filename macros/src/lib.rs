mod route;

use proc_macro::TokenStream;

/// Generates the OpenAPI operation for an API handler.
///
/// The generated function is named after the handler with a `_docs` suffix and
/// is meant to be passed to aide's `*_with` routing functions. The first line of
/// the handler's doc comment becomes the operation summary and the remaining
/// lines its description.
///
/// ```rust,ignore
/// /// List posts
/// /// Returns every post, newest first.
/// #[route(tag = tag::POST, response(status = 200, shape = "Json<Vec<ApiPost>>"))]
/// pub async fn list_posts() -> Json<Vec<ApiPost>> { .. }
/// ```
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}
