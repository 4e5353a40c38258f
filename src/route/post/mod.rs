use axum::{
	routing::{get, post},
	Router,
};

use crate::AppState;

pub mod model;
pub mod route;

/// The feed, tag filter and post pages, plus the create, edit and delete forms.
pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/", get(index))
		.route("/index", get(index))
		.route("/page/:n", get(page))
		.route("/tag/:name", get(tag))
		.route("/post/:id", get(show))
		.route("/create", get(create_form).post(create))
		.route("/edit/:id", get(edit_form).post(edit))
		.route("/delete/:id", post(delete))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_create_and_filter_by_tag() {
		let app = app();

		login(&app, "alice").await;

		let location = create_post(&app, "Hello", "x, y").await;

		assert!(location.starts_with("/post/"));

		let page = app.get(&location).await.text();

		assert!(page.contains("Hello"));
		assert!(page.contains("by alice"));
		assert!(page.contains("Your post has been created."));

		assert!(app.get("/").await.text().contains("Hello"));
		assert!(app.get("/tag/x").await.text().contains("Hello"));
		assert!(app.get("/tag/y").await.text().contains("Hello"));

		let response = app.get("/tag/z").await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_duplicate_tags_are_collapsed() {
		let app = app();

		login(&app, "alice").await;
		create_post(&app, "Tagged", "a, a, b").await;

		let posts = app.get("/api/posts").await.json::<serde_json::Value>();

		assert_eq!(posts[0]["tags"], json!(["a", "b"]));
	}

	#[tokio::test]
	async fn test_deleting_a_post_keeps_its_tags() {
		let app = app();

		login(&app, "alice").await;

		let location = create_post(&app, "Doomed", "keep").await;
		let id = location.trim_start_matches("/post/");

		assert_redirect(&app.post(&format!("/delete/{id}")).await, "/");

		assert_eq!(
			app.get(&location).await.status_code(),
			StatusCode::NOT_FOUND
		);

		let response = app.get("/tag/keep").await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(!response.text().contains("Doomed"));
	}

	#[tokio::test]
	async fn test_pages_out_of_range_are_empty() {
		let app = app();

		login(&app, "alice").await;

		for title in ["first", "second", "third"] {
			create_post(&app, title, "").await;
		}

		for path in ["/page/999", "/page/0"] {
			let response = app.get(path).await;

			assert_eq!(response.status_code(), StatusCode::OK);

			let page = response.text();

			assert!(page.contains("No posts here yet."));
			assert!(!page.contains("first"));
		}

		let response = app.get("/page/abc").await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_feed_is_paginated_newest_first() {
		let app = app();

		login(&app, "alice").await;

		for title in ["one", "two", "three", "four", "five", "six"] {
			create_post(&app, title, "").await;
		}

		let first = app.get("/index").await.text();

		assert!(first.contains("six"));
		assert!(first.contains("two"));
		assert!(!first.contains("one"));
		assert!(first.contains("href=\"/page/2\""));
		assert!(first.find("six") < first.find("five"));

		let second = app.get("/page/2").await.text();

		assert!(second.contains("one"));
		assert!(!second.contains("six"));
		assert!(second.contains("href=\"/page/1\""));
	}

	#[tokio::test]
	async fn test_only_the_owner_can_modify() {
		let app = app();

		login(&app, "alice").await;

		let location = create_post(&app, "Mine", "x").await;
		let id = location.trim_start_matches("/post/").to_string();

		app.get("/logout").await;
		login(&app, "bob").await;

		let response = app
			.post(&format!("/edit/{id}"))
			.form(&[("title", "Hacked"), ("content", "pwned"), ("tags", "")])
			.await;

		assert_redirect(&response, "/");
		assert!(app
			.get("/")
			.await
			.text()
			.contains("You can only modify your own posts."));

		assert_redirect(&app.get(&format!("/edit/{id}")).await, "/");
		assert_redirect(&app.post(&format!("/delete/{id}")).await, "/");

		let page = app.get(&location).await.text();

		assert!(page.contains("Mine"));
		assert!(!page.contains("Hacked"));
		assert!(!page.contains(&format!("/edit/{id}")));
	}

	#[tokio::test]
	async fn test_edit_replaces_tags() {
		let app = app();

		login(&app, "alice").await;

		let location = create_post(&app, "Draft", "old, shared").await;
		let id = location.trim_start_matches("/post/");

		let form = app.get(&format!("/edit/{id}")).await.text();

		assert!(form.contains("value=\"old, shared\""));

		let response = app
			.post(&format!("/edit/{id}"))
			.form(&[("title", "Final"), ("content", "done"), ("tags", "shared, new")])
			.await;

		assert_redirect(&response, &location);

		let posts = app.get("/api/posts").await.json::<serde_json::Value>();

		assert_eq!(posts[0]["title"], "Final");
		assert_eq!(posts[0]["tags"], json!(["new", "shared"]));
		assert!(!app.get("/tag/old").await.text().contains("Final"));
	}

	#[tokio::test]
	async fn test_unknown_and_malformed_ids() {
		let app = app();

		login(&app, "alice").await;

		let unknown = format!("/edit/{}", uuid::Uuid::new_v4());

		assert_eq!(app.get(&unknown).await.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(
			app.get("/post/not-a-uuid").await.status_code(),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			app.post(&format!("/delete/{}", uuid::Uuid::new_v4()))
				.await
				.status_code(),
			StatusCode::NOT_FOUND
		);
	}

	#[tokio::test]
	async fn test_not_found_pages_keep_the_navigation() {
		let app = app();

		let response = app.get("/tag/missing").await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert!(response.text().contains("Log in"));

		login(&app, "alice").await;

		for path in [
			format!("/post/{}", uuid::Uuid::new_v4()),
			format!("/edit/{}", uuid::Uuid::new_v4()),
			"/tag/missing".to_string(),
		] {
			let response = app.get(&path).await;

			assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

			let page = response.text();

			assert!(page.contains("404 Not Found"));
			assert!(page.contains("Log out"));
			assert!(!page.contains("Sign up"));
		}
	}

	#[tokio::test]
	async fn test_anonymous_users_are_sent_to_login() {
		let app = app();

		assert_redirect(&app.get("/create").await, "/login");
		assert_redirect(
			&app.post("/create").form(&[("title", "t"), ("content", "c")]).await,
			"/login",
		);

		assert!(app
			.get("/login")
			.await
			.text()
			.contains("Please log in to access this page."));
	}

	#[tokio::test]
	async fn test_invalid_post_is_not_created() {
		let app = app();

		login(&app, "alice").await;

		let response = app
			.post("/create")
			.form(&[("title", ""), ("content", "body"), ("tags", "x")])
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert!(response.text().contains("This field is required."));
		assert_eq!(
			app.get("/tag/x").await.status_code(),
			StatusCode::NOT_FOUND
		);
	}

	#[tokio::test]
	async fn test_markdown_is_rendered() {
		let app = app();

		login(&app, "alice").await;

		let location = app
			.post("/create")
			.form(&[
				("title", "Code"),
				("content", "```rust\nfn main() {}\n```\n\n<script>alert(1)</script>"),
				("tags", ""),
			])
			.await
			.header("location");
		let page = app.get(location.to_str().unwrap()).await.text();

		assert!(page.contains("<code class=\"language-rust\">"));
		assert!(!page.contains("<script>alert(1)</script>"));
	}
}
