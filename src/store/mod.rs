mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use uuid::Uuid;

use crate::model::{NewUser, Post, PostChanges, Tag, User};

/// An error returned by a [`Store`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
	#[error("unknown user {0}")]
	UnknownUser(Uuid),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Persistence for users, sessions, posts and tags.
///
/// Every method is a single unit of work: writes that touch more than one
/// table (a post and its tag links) are applied atomically.
/// Posts are always returned newest first, with their tag names sorted.
#[axum::async_trait]
pub trait Store: Send + Sync {
	/// Inserts a user, failing with [`Error::UsernameTaken`] or
	/// [`Error::EmailTaken`] when either is already registered.
	async fn create_user(&self, user: NewUser) -> Result<User>;

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

	/// Returns the earliest registered user.
	async fn first_user(&self) -> Result<Option<User>>;

	/// Opens a new session for the user and returns its id.
	async fn create_session(&self, user_id: Uuid) -> Result<Uuid>;

	/// Resolves a session id into the user that owns it.
	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>>;

	/// Removes a session. Removing an unknown session is not an error.
	async fn delete_session(&self, session_id: Uuid) -> Result<()>;

	async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>>;

	async fn count_posts(&self) -> Result<i64>;

	async fn all_posts(&self) -> Result<Vec<Post>>;

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

	/// Looks up a tag by its exact (case-sensitive) name.
	async fn find_tag(&self, name: &str) -> Result<Option<Tag>>;

	async fn posts_by_tag(&self, tag_id: Uuid) -> Result<Vec<Post>>;

	/// Creates a post owned by `user_id`, creating any tag that does not exist yet.
	async fn create_post(&self, user_id: Uuid, post: PostChanges) -> Result<Post>;

	/// Replaces the title, content and the whole tag set of a post.
	///
	/// Returns `None` if the post does not exist.
	async fn update_post(&self, id: Uuid, post: PostChanges) -> Result<Option<Post>>;

	/// Deletes a post and its tag links. Tags themselves are kept.
	///
	/// Returns `false` if the post did not exist.
	async fn delete_post(&self, id: Uuid) -> Result<bool>;
}
