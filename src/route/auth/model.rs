use serde::Deserialize;
use validator::Validate;

/// The login form. Missing fields deserialize as empty so the form can be
/// re-rendered with inline messages.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
	#[validate(custom(function = "crate::route::model::required"))]
	pub username: String,
	#[validate(custom(function = "crate::route::model::required"))]
	pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
	/// The name shown next to every post of the user.
	#[validate(
		custom(function = "crate::route::model::required"),
		length(max = 64, message = "Username must be at most 64 characters.")
	)]
	pub username: String,
	#[validate(
		custom(function = "crate::route::model::required"),
		email(message = "Invalid email address.")
	)]
	pub email: String,
	#[validate(custom(function = "crate::route::model::required"))]
	pub password: String,
	#[validate(
		custom(function = "crate::route::model::required"),
		must_match(other = "password", message = "Field must be equal to password.")
	)]
	pub confirm: String,
}
