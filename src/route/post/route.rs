use std::sync::Arc;

use axum::{
	body::Body,
	extract::State,
	http::Response,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
	config::Config,
	error::{redirect_with_flash, Error},
	extract::{Context, Form, Path},
	model::{Post, User},
	route::model::Paginate,
	view::{self, FormErrors, Pagination, PostView},
	Database,
};

use super::model;

const CREATED_MESSAGE: &str = "Your post has been created.";
const UPDATED_MESSAGE: &str = "Your post has been updated.";
const DELETED_MESSAGE: &str = "Your post has been deleted.";

/// Fetches a post that `user` is allowed to modify.
///
/// An unknown post is reported before ownership is checked.
async fn owned_post(database: &Database, id: Uuid, user: &User) -> Result<Post, Error> {
	let post = database
		.find_post(id)
		.await?
		.ok_or(Error::UnknownPost(id))?;

	if post.user_id != user.id {
		tracing::warn!(post = %id, user = %user.id, "attempt to modify another user's post");
		return Err(Error::Forbidden(id));
	}

	Ok(post)
}

/// Returns one page of the feed. Pages outside of the feed are empty.
pub async fn list_posts(database: &Database, paginate: &Paginate) -> Result<Vec<Post>, Error> {
	if !paginate.in_range() {
		return Ok(Vec::new());
	}

	Ok(database
		.list_posts(paginate.limit(), paginate.offset())
		.await?)
}

/// Returns every post tagged with exactly `name`.
pub async fn posts_by_tag(database: &Database, name: &str) -> Result<Vec<Post>, Error> {
	let tag = database
		.find_tag(name)
		.await?
		.ok_or_else(|| Error::UnknownTag(name.to_string()))?;

	Ok(database.posts_by_tag(tag.id).await?)
}

async fn feed(
	database: &Database,
	config: &Config,
	ctx: &Context,
	page: u32,
) -> Result<Response<Body>, Error> {
	let paginate = Paginate::new(page, config.page_size);
	let posts = list_posts(database, &paginate).await?;
	let total = database.count_posts().await?;

	view::render(
		ctx,
		view::IndexPage {
			layout: ctx.layout(),
			posts: PostView::list(&posts, ctx.user.as_ref()),
			pagination: Some(Pagination::new(page, config.page_size, total)),
			tag: None,
		},
	)
}

/// The first page of the feed, served at `/` and `/index`.
pub async fn index(
	State(database): State<Database>,
	State(config): State<Arc<Config>>,
	ctx: Context,
) -> Result<Response<Body>, Error> {
	feed(&database, &config, &ctx, 1).await
}

pub async fn page(
	State(database): State<Database>,
	State(config): State<Arc<Config>>,
	ctx: Context,
	Path(page): Path<u32>,
) -> Result<Response<Body>, Error> {
	feed(&database, &config, &ctx, page).await
}

/// Turns a failed page into an error page that keeps the visitor's navigation.
///
/// The flash stays in its cookie since the error page does not clear it.
fn or_error_page(ctx: &Context, page: Result<Response<Body>, Error>) -> Response<Body> {
	page.unwrap_or_else(|error| {
		error.into_page(view::Layout {
			flash: None,
			..ctx.layout()
		})
	})
}

async fn tag_page(database: &Database, ctx: &Context, name: &str) -> Result<Response<Body>, Error> {
	let posts = posts_by_tag(database, name).await?;

	view::render(
		ctx,
		view::IndexPage {
			layout: ctx.layout(),
			posts: PostView::list(&posts, ctx.user.as_ref()),
			pagination: None,
			tag: Some(name),
		},
	)
}

pub async fn tag(
	State(database): State<Database>,
	ctx: Context,
	Path(name): Path<String>,
) -> Response<Body> {
	or_error_page(&ctx, tag_page(&database, &ctx, &name).await)
}

async fn post_page(database: &Database, ctx: &Context, id: Uuid) -> Result<Response<Body>, Error> {
	let post = database
		.find_post(id)
		.await?
		.ok_or(Error::UnknownPost(id))?;

	view::render(
		ctx,
		view::PostPage {
			layout: ctx.layout(),
			post: PostView::new(&post, ctx.user.as_ref()),
		},
	)
}

pub async fn show(
	State(database): State<Database>,
	ctx: Context,
	Path(id): Path<Uuid>,
) -> Response<Body> {
	or_error_page(&ctx, post_page(&database, &ctx, id).await)
}

pub async fn create_form(ctx: Context) -> Result<Response<Body>, Error> {
	ctx.user()?;

	let form = model::PostForm::default();

	view::render(
		&ctx,
		view::PostFormPage {
			layout: ctx.layout(),
			heading: "New post",
			action: "/create".into(),
			form: &form,
			errors: FormErrors::default(),
		},
	)
}

pub async fn create(
	State(database): State<Database>,
	ctx: Context,
	Form(form): Form<model::PostForm>,
) -> Result<Response<Body>, Error> {
	let user = ctx.user()?;

	if let Err(errors) = form.validate() {
		return view::render(
			&ctx,
			view::PostFormPage {
				layout: ctx.layout(),
				heading: "New post",
				action: "/create".into(),
				form: &form,
				errors: errors.into(),
			},
		);
	}

	let post = database.create_post(user.id, form.changes()).await?;

	tracing::info!(post = %post.id, user = %user.id, "created post");

	Ok(redirect_with_flash(&format!("/post/{}", post.id), CREATED_MESSAGE))
}

async fn edit_form_page(database: &Database, ctx: &Context, id: Uuid) -> Result<Response<Body>, Error> {
	let post = owned_post(database, id, ctx.user()?).await?;
	let form = model::PostForm::from(&post);

	view::render(
		ctx,
		view::PostFormPage {
			layout: ctx.layout(),
			heading: "Edit post",
			action: format!("/edit/{id}"),
			form: &form,
			errors: FormErrors::default(),
		},
	)
}

pub async fn edit_form(
	State(database): State<Database>,
	ctx: Context,
	Path(id): Path<Uuid>,
) -> Response<Body> {
	or_error_page(&ctx, edit_form_page(&database, &ctx, id).await)
}

/// Replaces the title, content and whole tag set of a post.
pub async fn edit(
	State(database): State<Database>,
	ctx: Context,
	Path(id): Path<Uuid>,
	Form(form): Form<model::PostForm>,
) -> Result<Response<Body>, Error> {
	let user = ctx.user()?;

	owned_post(&database, id, user).await?;

	if let Err(errors) = form.validate() {
		return view::render(
			&ctx,
			view::PostFormPage {
				layout: ctx.layout(),
				heading: "Edit post",
				action: format!("/edit/{id}"),
				form: &form,
				errors: errors.into(),
			},
		);
	}

	database
		.update_post(id, form.changes())
		.await?
		.ok_or(Error::UnknownPost(id))?;

	tracing::info!(post = %id, user = %user.id, "updated post");

	Ok(redirect_with_flash(&format!("/post/{id}"), UPDATED_MESSAGE))
}

/// Deletes a post. Its tags are kept.
pub async fn delete(
	State(database): State<Database>,
	ctx: Context,
	Path(id): Path<Uuid>,
) -> Result<Response<Body>, Error> {
	let user = ctx.user()?;

	owned_post(&database, id, user).await?;

	if !database.delete_post(id).await? {
		return Err(Error::UnknownPost(id));
	}

	tracing::info!(post = %id, user = %user.id, "deleted post");

	Ok(redirect_with_flash("/", DELETED_MESSAGE))
}
