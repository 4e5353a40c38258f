use cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "session";
pub const FLASH_COOKIE_NAME: &str = "flash";

/// Creates a session cookie with no expiry
pub fn create_cookie(session_id: Uuid, secure: bool) -> Cookie<'static> {
	Cookie::build((COOKIE_NAME, session_id.to_string()))
		.secure(secure)
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie() -> Cookie<'static> {
	expired(COOKIE_NAME)
}

/// Creates a cookie holding a one-shot message shown on the next rendered page.
pub fn flash_cookie(message: impl Into<String>) -> Cookie<'static> {
	Cookie::build((FLASH_COOKIE_NAME, message.into()))
		.http_only(true)
		.same_site(SameSite::Lax)
		.path("/")
		.into()
}

/// Creates an empty flash cookie, sent once the message has been displayed
pub fn clear_flash_cookie() -> Cookie<'static> {
	expired(FLASH_COOKIE_NAME)
}

fn expired(name: &'static str) -> Cookie<'static> {
	Cookie::build(name)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

/// Formats a cookie for a `Set-Cookie` header, percent-encoding its value.
pub fn header_value(cookie: &Cookie<'_>) -> String {
	cookie.encoded().to_string()
}
