use serde::Deserialize;
use validator::Validate;

use crate::model::{self, Post, PostChanges};

/// The create and edit form. `tags` is the raw comma separated input.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
	#[validate(custom(function = "crate::route::model::title"))]
	pub title: String,
	/// Markdown source of the post body.
	#[validate(custom(function = "crate::route::model::required"))]
	pub content: String,
	pub tags: String,
}

impl PostForm {
	pub fn changes(&self) -> PostChanges {
		PostChanges {
			title: self.title.trim().to_string(),
			content: self.content.clone(),
			tags: model::parse_tags(&self.tags),
		}
	}
}

impl From<&Post> for PostForm {
	fn from(post: &Post) -> Self {
		Self {
			title: post.title.clone(),
			content: post.content.clone(),
			tags: post.tags_csv(),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_title_length() {
		let mut form = PostForm {
			title: "a".repeat(model::TITLE_MAX_LENGTH),
			content: "body".into(),
			tags: String::new(),
		};

		assert!(form.validate().is_ok());

		form.title.push('a');

		assert!(form.validate().unwrap_err().field_errors().contains_key("title"));
	}

	#[test]
	fn test_changes_normalizes_tags() {
		let form = PostForm {
			title: " Hello ".into(),
			content: "body".into(),
			tags: "x, y, x, ".into(),
		};
		let changes = form.changes();

		assert_eq!(changes.title, "Hello");
		assert_eq!(changes.tags, vec!["x", "y"]);
	}
}
