use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::model::{self, Post, PostChanges};

/// A post as exposed by the JSON API.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiPost {
	pub id: Uuid,
	pub title: String,
	/// The Markdown source of the post.
	pub content: String,
	/// Tag names, sorted.
	pub tags: Vec<String>,
	/// The username of the post's owner.
	pub author: String,
	/// The creation time, in RFC 3339 format.
	pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<Post> for ApiPost {
	fn from(post: Post) -> Self {
		Self {
			id: post.id,
			title: post.title,
			content: post.content,
			tags: post.tags,
			author: post.author,
			timestamp: post.created_at,
		}
	}
}

/// Tag names, either comma separated or as a list.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TagList {
	Csv(String),
	List(Vec<String>),
}

impl TagList {
	pub fn names(&self) -> Vec<String> {
		match self {
			Self::Csv(csv) => model::parse_tags(csv),
			Self::List(names) => model::normalize_tags(names.iter().map(String::as_str)),
		}
	}
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct CreatePostInput {
	#[serde(default)]
	#[validate(custom(function = "crate::route::model::title"))]
	pub title: String,
	/// The Markdown source of the post.
	#[serde(default)]
	#[validate(custom(function = "crate::route::model::required"))]
	pub content: String,
	pub tags: Option<TagList>,
}

impl CreatePostInput {
	pub fn changes(self) -> PostChanges {
		PostChanges {
			title: self.title.trim().to_string(),
			tags: self.tags.as_ref().map(TagList::names).unwrap_or_default(),
			content: self.content,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::model::TITLE_MAX_LENGTH;

	#[test]
	fn test_tag_list_formats() {
		let csv: CreatePostInput =
			serde_json::from_str(r#"{"title": "t", "content": "c", "tags": "a, b, a"}"#).unwrap();
		let list: CreatePostInput =
			serde_json::from_str(r#"{"title": "t", "content": "c", "tags": [" a", "b", ""]}"#)
				.unwrap();

		assert_eq!(csv.changes().tags, vec!["a", "b"]);
		assert_eq!(list.changes().tags, vec!["a", "b"]);
	}

	#[test]
	fn test_missing_content_is_invalid() {
		let input: CreatePostInput = serde_json::from_str(r#"{"title": "T"}"#).unwrap();

		assert!(input.validate().unwrap_err().field_errors().contains_key("content"));
	}

	#[test]
	fn test_long_title_is_invalid() {
		let input = CreatePostInput {
			title: "é".repeat(TITLE_MAX_LENGTH + 1),
			content: "c".into(),
			tags: None,
		};
		let errors = input.validate().unwrap_err();

		assert_eq!(
			errors.field_errors()["title"][0].message.as_deref(),
			Some("Title must be at most 140 characters.")
		);

		let input = CreatePostInput {
			title: "é".repeat(TITLE_MAX_LENGTH),
			..input
		};

		assert!(input.validate().is_ok());
	}
}
