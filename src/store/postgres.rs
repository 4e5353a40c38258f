use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{Error, Result, Store};
use crate::model::{NewUser, Post, PostChanges, Tag, User};

const SELECT_POST: &str = r#"
	SELECT post.id, post.user_id, "user".username AS author, post.title, post.content, post.created_at
	FROM post
	JOIN "user" ON "user".id = post.user_id
"#;

const ORDER_POSTS: &str = "ORDER BY post.created_at DESC, post.id DESC";

/// A [`Store`] backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Applies the migrations in `./migrations`.
	pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
		sqlx::migrate!("./migrations").run(&self.pool).await
	}
}

#[derive(sqlx::FromRow)]
struct PostRow {
	id: Uuid,
	user_id: Uuid,
	author: String,
	title: String,
	content: String,
	created_at: chrono::DateTime<chrono::Utc>,
}

/// Loads the tag names of every row with a single join-table query.
async fn with_tags(conn: &mut PgConnection, rows: Vec<PostRow>) -> Result<Vec<Post>> {
	let ids = rows.iter().map(|row| row.id).collect::<Vec<_>>();

	let links = sqlx::query_as::<_, (Uuid, String)>(
		r#"
			SELECT post_tag.post_id, tag.name
			FROM post_tag
			JOIN tag ON tag.id = post_tag.tag_id
			WHERE post_tag.post_id = ANY($1)
			ORDER BY tag.name
		"#,
	)
	.bind(&ids)
	.fetch_all(&mut *conn)
	.await?;

	let mut tags: HashMap<Uuid, Vec<String>> = HashMap::new();

	for (post_id, name) in links {
		tags.entry(post_id).or_default().push(name);
	}

	Ok(rows
		.into_iter()
		.map(|row| Post {
			tags: tags.remove(&row.id).unwrap_or_default(),
			id: row.id,
			user_id: row.user_id,
			author: row.author,
			title: row.title,
			content: row.content,
			created_at: row.created_at,
		})
		.collect())
}

async fn fetch_post(conn: &mut PgConnection, id: Uuid) -> Result<Option<Post>> {
	let row = sqlx::query_as::<_, PostRow>(&format!("{SELECT_POST} WHERE post.id = $1"))
		.bind(id)
		.fetch_optional(&mut *conn)
		.await?;

	let Some(row) = row else {
		return Ok(None);
	};

	Ok(with_tags(conn, vec![row]).await?.pop())
}

/// Links each tag name to the post, creating tags that do not exist yet.
///
/// Tags are upserted in name order so concurrent writers lock tag rows in the same order.
async fn link_tags(conn: &mut PgConnection, post_id: Uuid, tags: &[String]) -> Result<()> {
	if tags.is_empty() {
		return Ok(());
	}

	let mut names = tags.to_vec();

	names.sort_unstable();
	names.dedup();

	// the no-op update makes RETURNING yield the existing row on conflict
	let tag_ids = sqlx::query_scalar::<_, Uuid>(
		r#"
			INSERT INTO tag (name)
			SELECT name FROM unnest($1::text[]) AS tags(name)
			ORDER BY name
			ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
			RETURNING id
		"#,
	)
	.bind(&names)
	.fetch_all(&mut *conn)
	.await?;

	sqlx::query(
		r#"
			INSERT INTO post_tag (post_id, tag_id)
			SELECT $1::uuid, tag_id FROM unnest($2::uuid[]) AS tags(tag_id)
			ON CONFLICT DO NOTHING
		"#,
	)
	.bind(post_id)
	.bind(&tag_ids)
	.execute(&mut *conn)
	.await?;

	Ok(())
}

#[axum::async_trait]
impl Store for PgStore {
	#[tracing::instrument(skip_all, fields(username = %user.username))]
	async fn create_user(&self, user: NewUser) -> Result<User> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, email, username, password) VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.username)
		.bind(&user.password)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) => match d.constraint() {
				Some("user_email_key") => Error::EmailTaken,
				Some("user_username_key") => Error::UsernameTaken,
				_ => Error::Database(e),
			},
			e => Error::Database(e),
		})
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = $1"#)
				.bind(username)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn first_user(&self) -> Result<Option<User>> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" ORDER BY created_at, id LIMIT 1"#)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Uuid> {
		Ok(
			sqlx::query_scalar::<_, Uuid>("INSERT INTO session (user_id) VALUES ($1) RETURNING id")
				.bind(user_id)
				.fetch_one(&self.pool)
				.await?,
		)
	}

	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}

	async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
		let mut conn = self.pool.acquire().await?;
		let rows = sqlx::query_as::<_, PostRow>(&format!(
			"{SELECT_POST} {ORDER_POSTS} LIMIT $1 OFFSET $2"
		))
		.bind(limit)
		.bind(offset)
		.fetch_all(&mut *conn)
		.await?;

		with_tags(&mut conn, rows).await
	}

	async fn count_posts(&self) -> Result<i64> {
		Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post")
			.fetch_one(&self.pool)
			.await?)
	}

	async fn all_posts(&self) -> Result<Vec<Post>> {
		let mut conn = self.pool.acquire().await?;
		let rows = sqlx::query_as::<_, PostRow>(&format!("{SELECT_POST} {ORDER_POSTS}"))
			.fetch_all(&mut *conn)
			.await?;

		with_tags(&mut conn, rows).await
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
		let mut conn = self.pool.acquire().await?;

		fetch_post(&mut conn, id).await
	}

	async fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
		Ok(
			sqlx::query_as::<_, Tag>("SELECT id, name FROM tag WHERE name = $1")
				.bind(name)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn posts_by_tag(&self, tag_id: Uuid) -> Result<Vec<Post>> {
		let mut conn = self.pool.acquire().await?;
		let rows = sqlx::query_as::<_, PostRow>(&format!(
			r#"
				{SELECT_POST}
				JOIN post_tag ON post_tag.post_id = post.id
				WHERE post_tag.tag_id = $1
				{ORDER_POSTS}
			"#
		))
		.bind(tag_id)
		.fetch_all(&mut *conn)
		.await?;

		with_tags(&mut conn, rows).await
	}

	#[tracing::instrument(skip(self, post), fields(title = %post.title))]
	async fn create_post(&self, user_id: Uuid, post: PostChanges) -> Result<Post> {
		let mut tx = self.pool.begin().await?;

		let id = sqlx::query_scalar::<_, Uuid>(
			r#"
				INSERT INTO post (id, user_id, title, content)
				VALUES (DEFAULT, $1, $2, $3)
				RETURNING id
			"#,
		)
		.bind(user_id)
		.bind(&post.title)
		.bind(&post.content)
		.fetch_one(&mut *tx)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) if d.is_foreign_key_violation() => {
				Error::UnknownUser(user_id)
			}
			e => Error::Database(e),
		})?;

		link_tags(&mut tx, id, &post.tags).await?;

		let created = fetch_post(&mut tx, id)
			.await?
			.ok_or(Error::Database(sqlx::Error::RowNotFound))?;

		tx.commit().await?;

		Ok(created)
	}

	#[tracing::instrument(skip(self, post))]
	async fn update_post(&self, id: Uuid, post: PostChanges) -> Result<Option<Post>> {
		let mut tx = self.pool.begin().await?;

		let updated = sqlx::query("UPDATE post SET title = $1, content = $2 WHERE id = $3")
			.bind(&post.title)
			.bind(&post.content)
			.bind(id)
			.execute(&mut *tx)
			.await?;

		if updated.rows_affected() == 0 {
			return Ok(None);
		}

		sqlx::query("DELETE FROM post_tag WHERE post_id = $1")
			.bind(id)
			.execute(&mut *tx)
			.await?;

		link_tags(&mut tx, id, &post.tags).await?;

		let post = fetch_post(&mut tx, id).await?;

		tx.commit().await?;

		Ok(post)
	}

	#[tracing::instrument(skip(self))]
	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		// post_tag rows go with the post through ON DELETE CASCADE
		let deleted = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(deleted.rows_affected() > 0)
	}
}
