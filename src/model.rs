use serde::Serialize;
use uuid::Uuid;

/// The longest title a post can have, in characters.
pub const TITLE_MAX_LENGTH: usize = 140;

/// A model representing a single user.
///
/// Use this when fetching from the store and handing data to views.
/// The `email` and `password` fields are never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
	pub id: Uuid,
	#[serde(skip_serializing)]
	pub email: String,
	/// argon2 output, salted with `id`
	#[serde(skip_serializing)]
	pub password: Vec<u8>,
	pub username: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A free-form label attached to any number of posts.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
	pub id: Uuid,
	pub name: String,
}

/// A post together with its author's username and the names of its tags.
///
/// The body is kept as raw Markdown; it is only rendered to HTML by the views.
#[derive(Debug, Clone)]
pub struct Post {
	pub id: Uuid,
	pub user_id: Uuid,
	pub author: String,
	pub title: String,
	pub content: String,
	pub tags: Vec<String>,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
	/// The tag names joined the same way a user would type them in a form.
	pub fn tags_csv(&self) -> String {
		self.tags.join(", ")
	}
}

/// Input for creating a post or replacing an existing one's fields.
#[derive(Debug, Clone)]
pub struct PostChanges {
	pub title: String,
	pub content: String,
	/// Already normalized with [`parse_tags`].
	pub tags: Vec<String>,
}

/// Input for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub username: String,
	pub email: String,
	pub password: Vec<u8>,
}

/// Splits a comma separated list of tag names.
///
/// Tokens are trimmed, empty tokens are dropped and duplicates are removed
/// (keeping the first occurrence). Names are compared case-sensitively.
pub fn parse_tags(csv: &str) -> Vec<String> {
	normalize_tags(csv.split(','))
}

/// Normalizes an already split list of tag names with the same rules as [`parse_tags`].
pub fn normalize_tags<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	let mut tags: Vec<String> = Vec::new();

	for name in names.into_iter().map(str::trim).filter(|name| !name.is_empty()) {
		if !tags.iter().any(|tag| tag == name) {
			tags.push(name.to_string());
		}
	}

	tags
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_parse_tags_dedup() {
		assert_eq!(parse_tags("a, a, b"), vec!["a", "b"]);
	}

	#[test]
	fn test_parse_tags_drops_empty() {
		assert_eq!(parse_tags(" , rust,, ,web "), vec!["rust", "web"]);
		assert!(parse_tags("").is_empty());
		assert!(parse_tags(" ,  , ").is_empty());
	}

	#[test]
	fn test_parse_tags_case_sensitive() {
		assert_eq!(parse_tags("Rust, rust, RUST"), vec!["Rust", "rust", "RUST"]);
	}

	#[test]
	fn test_normalize_tags_list() {
		assert_eq!(normalize_tags([" x", "y ", "x", ""]), vec!["x", "y"]);
	}
}
