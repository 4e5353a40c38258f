use std::collections::BTreeMap;

use askama::Template;
use axum::{
	body::Body,
	http::{header, Response},
	response::{AppendHeaders, Html, IntoResponse},
};
use uuid::Uuid;

use crate::{
	error::{self, Error},
	extract::Context,
	markdown,
	model::{Post, User},
	route::{auth::model as auth_model, post::model as post_model},
	session,
};

/// What every page needs to render the navigation bar and the flash message.
pub struct Layout<'a> {
	pub user: Option<&'a User>,
	pub flash: Option<&'a str>,
}

impl Layout<'_> {
	pub fn anonymous() -> Self {
		Layout {
			user: None,
			flash: None,
		}
	}
}

/// A post prepared for display, with its body rendered to HTML.
pub struct PostView {
	pub id: Uuid,
	pub title: String,
	pub author: String,
	pub tags: Vec<String>,
	pub html: String,
	pub created_at: String,
	/// Whether the viewer owns the post and may edit or delete it.
	pub owned: bool,
}

impl PostView {
	pub fn new(post: &Post, viewer: Option<&User>) -> Self {
		Self {
			id: post.id,
			title: post.title.clone(),
			author: post.author.clone(),
			tags: post.tags.clone(),
			html: markdown::render(&post.content),
			created_at: post.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
			owned: viewer.is_some_and(|user| user.id == post.user_id),
		}
	}

	pub fn list(posts: &[Post], viewer: Option<&User>) -> Vec<Self> {
		posts.iter().map(|post| Self::new(post, viewer)).collect()
	}
}

/// Page links for the feed.
#[derive(Debug, PartialEq, Eq)]
pub struct Pagination {
	pub page: u32,
	pub total_pages: u32,
	pub prev: Option<u32>,
	pub next: Option<u32>,
}

impl Pagination {
	pub fn new(page: u32, page_size: u32, total: i64) -> Self {
		let total = u64::try_from(total).unwrap_or(0);
		let total_pages = total.div_ceil(u64::from(page_size.max(1)));
		let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

		Self {
			page,
			total_pages,
			prev: (page > 1).then(|| (page - 1).min(total_pages.max(1))),
			next: (page < total_pages).then(|| page + 1),
		}
	}
}

/// Validation messages keyed by form field.
#[derive(Debug, Default)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.0
			.entry(field.to_string())
			.or_default()
			.push(message.into());
	}

	/// The first message for a field, which is the one shown next to it.
	pub fn first(&self, field: &str) -> Option<&str> {
		self.0
			.get(field)
			.and_then(|messages| messages.first())
			.map(String::as_str)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<validator::ValidationErrors> for FormErrors {
	fn from(errors: validator::ValidationErrors) -> Self {
		let mut form = Self::default();

		for (field, errors) in errors.field_errors() {
			for error in errors {
				form.add(&field, error::describe(error));
			}
		}

		form
	}
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
	pub layout: Layout<'a>,
	pub posts: Vec<PostView>,
	pub pagination: Option<Pagination>,
	/// Set when the feed is filtered by a tag.
	pub tag: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostPage<'a> {
	pub layout: Layout<'a>,
	pub post: PostView,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormPage<'a> {
	pub layout: Layout<'a>,
	pub heading: &'a str,
	pub action: String,
	pub form: &'a post_model::PostForm,
	pub errors: FormErrors,
}

impl PostFormPage<'_> {
	pub fn title_max_length(&self) -> usize {
		crate::model::TITLE_MAX_LENGTH
	}
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage<'a> {
	pub layout: Layout<'a>,
	pub form: &'a auth_model::LoginForm,
	pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage<'a> {
	pub layout: Layout<'a>,
	pub form: &'a auth_model::SignupForm,
	pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage<'a> {
	pub layout: Layout<'a>,
	pub status: u16,
	pub reason: &'a str,
	pub message: &'a str,
}

/// Renders a page for the request, consuming its flash message.
pub fn render(ctx: &Context, page: impl Template) -> Result<Response<Body>, Error> {
	let html = page.render()?;
	let mut cookies = Vec::new();

	if ctx.flash.is_some() {
		cookies.push((
			header::SET_COOKIE,
			session::header_value(&session::clear_flash_cookie()),
		));
	}

	Ok((AppendHeaders(cookies), Html(html)).into_response())
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_pagination_middle() {
		assert_eq!(
			Pagination::new(2, 5, 12),
			Pagination {
				page: 2,
				total_pages: 3,
				prev: Some(1),
				next: Some(3),
			}
		);
	}

	#[test]
	fn test_pagination_out_of_range() {
		let pagination = Pagination::new(999, 5, 3);

		assert_eq!(pagination.total_pages, 1);
		assert_eq!(pagination.prev, Some(1));
		assert_eq!(pagination.next, None);
	}

	#[test]
	fn test_pagination_empty() {
		let pagination = Pagination::new(1, 5, 0);

		assert_eq!(pagination.total_pages, 0);
		assert_eq!(pagination.prev, None);
		assert_eq!(pagination.next, None);
	}

	#[test]
	fn test_form_errors_first() {
		let mut errors = FormErrors::default();

		errors.add("email", "This field is required.");
		errors.add("email", "Invalid email address.");

		assert_eq!(errors.first("email"), Some("This field is required."));
		assert_eq!(errors.first("username"), None);
		assert!(!errors.is_empty());
	}
}
