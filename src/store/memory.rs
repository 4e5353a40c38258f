use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Error, Result, Store};
use crate::model::{NewUser, Post, PostChanges, Tag, User};

/// A [`Store`] that keeps everything in process memory.
///
/// Each call holds a single lock for its whole duration, which gives the same
/// atomicity the Postgres store gets from transactions.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
	users: Vec<User>,
	sessions: Vec<(Uuid, Uuid)>,
	posts: Vec<PostRecord>,
	tags: Vec<Tag>,
	post_tags: Vec<(Uuid, Uuid)>,
}

struct PostRecord {
	id: Uuid,
	user_id: Uuid,
	title: String,
	content: String,
	created_at: chrono::DateTime<chrono::Utc>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Tables {
	/// Posts newest first. Posts created at the same instant keep
	/// reverse insertion order.
	fn ordered_posts(&self) -> Vec<&PostRecord> {
		let mut posts = self.posts.iter().rev().collect::<Vec<_>>();

		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		posts
	}

	fn to_post(&self, record: &PostRecord) -> Post {
		let mut tags = self
			.post_tags
			.iter()
			.filter(|(post_id, _)| *post_id == record.id)
			.filter_map(|(_, tag_id)| self.tags.iter().find(|tag| tag.id == *tag_id))
			.map(|tag| tag.name.clone())
			.collect::<Vec<_>>();

		tags.sort();

		Post {
			id: record.id,
			user_id: record.user_id,
			author: self
				.users
				.iter()
				.find(|user| user.id == record.user_id)
				.map(|user| user.username.clone())
				.unwrap_or_default(),
			title: record.title.clone(),
			content: record.content.clone(),
			tags,
			created_at: record.created_at,
		}
	}

	fn tag_id(&mut self, name: &str) -> Uuid {
		if let Some(tag) = self.tags.iter().find(|tag| tag.name == name) {
			return tag.id;
		}

		let tag = Tag {
			id: Uuid::new_v4(),
			name: name.to_string(),
		};
		let id = tag.id;

		self.tags.push(tag);
		id
	}

	fn link_tags(&mut self, post_id: Uuid, tags: &[String]) {
		for name in tags {
			let tag_id = self.tag_id(name);

			if !self.post_tags.contains(&(post_id, tag_id)) {
				self.post_tags.push((post_id, tag_id));
			}
		}
	}
}

#[axum::async_trait]
impl Store for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<User> {
		let mut tables = self.tables.write().await;

		if tables.users.iter().any(|u| u.email == user.email) {
			return Err(Error::EmailTaken);
		}

		if tables.users.iter().any(|u| u.username == user.username) {
			return Err(Error::UsernameTaken);
		}

		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			username: user.username,
			created_at: chrono::Utc::now(),
		};

		tables.users.push(user.clone());
		Ok(user)
	}

	async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables.users.iter().find(|u| u.username == username).cloned())
	}

	async fn first_user(&self) -> Result<Option<User>> {
		Ok(self.tables.read().await.users.first().cloned())
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Uuid> {
		let mut tables = self.tables.write().await;

		if !tables.users.iter().any(|u| u.id == user_id) {
			return Err(Error::UnknownUser(user_id));
		}

		let id = Uuid::new_v4();

		tables.sessions.push((id, user_id));
		Ok(id)
	}

	async fn find_session_user(&self, session_id: Uuid) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables
			.sessions
			.iter()
			.find(|(id, _)| *id == session_id)
			.and_then(|(_, user_id)| tables.users.iter().find(|u| u.id == *user_id))
			.cloned())
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		self.tables
			.write()
			.await
			.sessions
			.retain(|(id, _)| *id != session_id);

		Ok(())
	}

	async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
		let tables = self.tables.read().await;
		let skip = usize::try_from(offset).unwrap_or(usize::MAX);
		let take = usize::try_from(limit).unwrap_or(0);

		Ok(tables
			.ordered_posts()
			.into_iter()
			.skip(skip)
			.take(take)
			.map(|record| tables.to_post(record))
			.collect())
	}

	async fn count_posts(&self) -> Result<i64> {
		let tables = self.tables.read().await;

		Ok(i64::try_from(tables.posts.len()).unwrap_or(i64::MAX))
	}

	async fn all_posts(&self) -> Result<Vec<Post>> {
		let tables = self.tables.read().await;

		Ok(tables
			.ordered_posts()
			.into_iter()
			.map(|record| tables.to_post(record))
			.collect())
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
		let tables = self.tables.read().await;

		Ok(tables
			.posts
			.iter()
			.find(|record| record.id == id)
			.map(|record| tables.to_post(record)))
	}

	async fn find_tag(&self, name: &str) -> Result<Option<Tag>> {
		let tables = self.tables.read().await;

		Ok(tables.tags.iter().find(|tag| tag.name == name).cloned())
	}

	async fn posts_by_tag(&self, tag_id: Uuid) -> Result<Vec<Post>> {
		let tables = self.tables.read().await;

		Ok(tables
			.ordered_posts()
			.into_iter()
			.filter(|record| tables.post_tags.contains(&(record.id, tag_id)))
			.map(|record| tables.to_post(record))
			.collect())
	}

	async fn create_post(&self, user_id: Uuid, post: PostChanges) -> Result<Post> {
		let mut tables = self.tables.write().await;

		if !tables.users.iter().any(|u| u.id == user_id) {
			return Err(Error::UnknownUser(user_id));
		}

		let record = PostRecord {
			id: Uuid::new_v4(),
			user_id,
			title: post.title,
			content: post.content,
			created_at: chrono::Utc::now(),
		};
		let id = record.id;

		tables.posts.push(record);
		tables.link_tags(id, &post.tags);

		let created = tables.to_post(&tables.posts[tables.posts.len() - 1]);

		Ok(created)
	}

	async fn update_post(&self, id: Uuid, post: PostChanges) -> Result<Option<Post>> {
		let mut tables = self.tables.write().await;

		let Some(index) = tables.posts.iter().position(|record| record.id == id) else {
			return Ok(None);
		};

		tables.posts[index].title = post.title;
		tables.posts[index].content = post.content;
		tables.post_tags.retain(|(post_id, _)| *post_id != id);
		tables.link_tags(id, &post.tags);

		Ok(Some(tables.to_post(&tables.posts[index])))
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		let mut tables = self.tables.write().await;
		let before = tables.posts.len();

		tables.posts.retain(|record| record.id != id);

		if tables.posts.len() == before {
			return Ok(false);
		}

		tables.post_tags.retain(|(post_id, _)| *post_id != id);
		Ok(true)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn user(username: &str) -> NewUser {
		NewUser {
			id: Uuid::new_v4(),
			username: username.into(),
			email: format!("{username}@example.com"),
			password: vec![1; 32],
		}
	}

	fn changes(title: &str, tags: &[&str]) -> PostChanges {
		PostChanges {
			title: title.into(),
			content: format!("# {title}"),
			tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
		}
	}

	#[tokio::test]
	async fn test_unique_username_and_email() {
		let store = MemoryStore::new();

		store.create_user(user("alice")).await.unwrap();

		let mut same_name = user("alice");
		same_name.email = "other@example.com".into();

		assert!(matches!(
			store.create_user(same_name).await,
			Err(Error::UsernameTaken)
		));

		let mut same_email = user("bob");
		same_email.email = "alice@example.com".into();

		assert!(matches!(
			store.create_user(same_email).await,
			Err(Error::EmailTaken)
		));
	}

	#[tokio::test]
	async fn test_posts_newest_first_and_paged() {
		let store = MemoryStore::new();
		let alice = store.create_user(user("alice")).await.unwrap();

		for title in ["one", "two", "three"] {
			store.create_post(alice.id, changes(title, &[])).await.unwrap();
		}

		let titles = |posts: Vec<Post>| posts.into_iter().map(|p| p.title).collect::<Vec<_>>();

		assert_eq!(
			titles(store.list_posts(2, 0).await.unwrap()),
			vec!["three", "two"]
		);
		assert_eq!(titles(store.list_posts(2, 2).await.unwrap()), vec!["one"]);
		assert!(store.list_posts(5, 4990).await.unwrap().is_empty());
		assert_eq!(store.count_posts().await.unwrap(), 3);
	}

	#[tokio::test]
	async fn test_update_replaces_tags() {
		let store = MemoryStore::new();
		let alice = store.create_user(user("alice")).await.unwrap();
		let post = store
			.create_post(alice.id, changes("hello", &["x", "y"]))
			.await
			.unwrap();

		assert_eq!(post.author, "alice");
		assert_eq!(post.tags, vec!["x", "y"]);

		let post = store
			.update_post(post.id, changes("hello", &["y", "z"]))
			.await
			.unwrap()
			.unwrap();

		assert_eq!(post.tags, vec!["y", "z"]);

		let x = store.find_tag("x").await.unwrap().unwrap();

		assert!(store.posts_by_tag(x.id).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_delete_keeps_tags() {
		let store = MemoryStore::new();
		let alice = store.create_user(user("alice")).await.unwrap();
		let first = store
			.create_post(alice.id, changes("first", &["shared"]))
			.await
			.unwrap();
		let second = store
			.create_post(alice.id, changes("second", &["shared"]))
			.await
			.unwrap();

		assert!(store.delete_post(first.id).await.unwrap());
		assert!(!store.delete_post(first.id).await.unwrap());

		let shared = store.find_tag("shared").await.unwrap().unwrap();
		let posts = store.posts_by_tag(shared.id).await.unwrap();

		assert_eq!(posts.len(), 1);
		assert_eq!(posts[0].id, second.id);
	}

	#[tokio::test]
	async fn test_sessions() {
		let store = MemoryStore::new();
		let alice = store.create_user(user("alice")).await.unwrap();
		let session = store.create_session(alice.id).await.unwrap();

		let found = store.find_session_user(session).await.unwrap().unwrap();

		assert_eq!(found.id, alice.id);

		store.delete_session(session).await.unwrap();
		store.delete_session(session).await.unwrap();

		assert!(store.find_session_user(session).await.unwrap().is_none());
	}
}
