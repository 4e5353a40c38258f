use std::borrow::Cow;

use validator::ValidationError;

use crate::model::TITLE_MAX_LENGTH;

/// A window into the feed, 1-indexed.
///
/// Page 0 and pages past the end are valid and simply hold no posts.
#[derive(Debug, Clone, Copy)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	pub page: u32,
	/// The number of items to return per page.
	pub size: u32,
}

impl Paginate {
	pub fn new(page: u32, size: u32) -> Self {
		Self { page, size }
	}

	pub fn in_range(&self) -> bool {
		self.page >= 1 && self.size >= 1
	}

	pub fn offset(&self) -> i64 {
		i64::from(self.page.saturating_sub(1)) * i64::from(self.size)
	}

	pub fn limit(&self) -> i64 {
		i64::from(self.size)
	}
}

/// Rejects empty and whitespace-only input.
pub fn required(value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		let mut error = ValidationError::new("required");

		error.message = Some(Cow::Borrowed("This field is required."));
		return Err(error);
	}

	Ok(())
}

/// A required title of at most [`TITLE_MAX_LENGTH`] characters.
pub fn title(value: &str) -> Result<(), ValidationError> {
	required(value)?;

	if value.chars().count() > TITLE_MAX_LENGTH {
		let mut error = ValidationError::new("length");

		error.message = Some(Cow::Owned(format!(
			"Title must be at most {TITLE_MAX_LENGTH} characters."
		)));
		return Err(error);
	}

	Ok(())
}

#[cfg(test)]
mod test {
	#[test]
	fn test_title() {
		use crate::model::TITLE_MAX_LENGTH;

		assert_eq!(super::title("  ").unwrap_err().code, "required");
		assert_eq!(
			super::title(&"a".repeat(TITLE_MAX_LENGTH + 1)).unwrap_err().code,
			"length"
		);
		assert!(super::title(&"a".repeat(TITLE_MAX_LENGTH)).is_ok());
	}

	#[test]
	fn test_paginate_offset() {
		let mut paginate = super::Paginate { page: 1, size: 10 };

		assert_eq!(paginate.offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.offset(), 10);

		paginate.size = 5;

		assert_eq!(paginate.offset(), 5);

		paginate.page = 3;

		assert_eq!(paginate.offset(), 10);
	}

	#[test]
	fn test_paginate_limit() {
		let paginate = super::Paginate { page: 1, size: 10 };

		assert_eq!(paginate.limit(), 10);
	}

	#[test]
	fn test_paginate_range() {
		assert!(!super::Paginate::new(0, 5).in_range());
		assert!(super::Paginate::new(999, 5).in_range());
		assert_eq!(super::Paginate::new(u32::MAX, 5).offset(), i64::from(u32::MAX - 1) * 5);
	}

	#[test]
	fn test_required() {
		assert!(super::required("value").is_ok());
		assert!(super::required("").is_err());
		assert!(super::required("   ").is_err());
	}
}
