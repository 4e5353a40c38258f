use argon2::Argon2;
use axum::{
	body::Body,
	extract::State,
	http::{header, Response},
	response::{AppendHeaders, IntoResponse, Redirect},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
	error::{redirect_with_flash, Error},
	extract::{Context, Form},
	model::NewUser,
	session, store,
	view::{self, FormErrors},
	AppState, Database,
};

use super::model;

pub const KEY_LENGTH: usize = 32;

const SIGNUP_MESSAGE: &str = "Registration successful. Please log in.";

/// Hashes a password with Argon2, using the user's id as a salt.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

pub async fn login_form(ctx: Context) -> Result<Response<Body>, Error> {
	if ctx.user.is_some() {
		return Ok(Redirect::to("/").into_response());
	}

	let form = model::LoginForm::default();

	view::render(
		&ctx,
		view::LoginPage {
			layout: ctx.layout(),
			form: &form,
			errors: FormErrors::default(),
		},
	)
}

/// Checks the credentials and opens a session.
///
/// An unknown username and a wrong password produce the same response.
pub async fn login(
	State(state): State<AppState>,
	ctx: Context,
	Form(form): Form<model::LoginForm>,
) -> Result<Response<Body>, Error> {
	if ctx.user.is_some() {
		return Ok(Redirect::to("/").into_response());
	}

	if let Err(errors) = form.validate() {
		return view::render(
			&ctx,
			view::LoginPage {
				layout: ctx.layout(),
				form: &form,
				errors: errors.into(),
			},
		);
	}

	let Some(user) = state.database.find_user_by_username(&form.username).await? else {
		tracing::warn!(username = %form.username, "login with unknown username");
		return Err(super::Error::InvalidUsernameOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &form.password, &user.id).map_err(super::Error::from)?;

	if user.password != hashed {
		tracing::warn!(user = %user.id, "login with wrong password");
		return Err(super::Error::InvalidUsernameOrPassword.into());
	}

	let session_id = state.database.create_session(user.id).await?;
	let cookie = session::create_cookie(session_id, state.config.cookie_secure);

	tracing::info!(user = %user.id, "logged in");

	Ok((
		AppendHeaders([
			(header::SET_COOKIE, session::header_value(&cookie)),
			(
				header::SET_COOKIE,
				session::header_value(&session::clear_flash_cookie()),
			),
		]),
		Redirect::to("/"),
	)
		.into_response())
}

pub async fn signup_form(ctx: Context) -> Result<Response<Body>, Error> {
	if ctx.user.is_some() {
		return Ok(Redirect::to("/").into_response());
	}

	let form = model::SignupForm::default();

	view::render(
		&ctx,
		view::SignupPage {
			layout: ctx.layout(),
			form: &form,
			errors: FormErrors::default(),
		},
	)
}

/// Registers an account. The user is not logged in afterwards.
pub async fn signup(
	State(state): State<AppState>,
	ctx: Context,
	Form(form): Form<model::SignupForm>,
) -> Result<Response<Body>, Error> {
	if ctx.user.is_some() {
		return Ok(Redirect::to("/").into_response());
	}

	let mut errors = match form.validate() {
		Ok(()) => FormErrors::default(),
		Err(errors) => FormErrors::from(errors),
	};

	if errors.is_empty() {
		let id = Uuid::new_v4();
		let hashed = hash_password(&state.hasher, &form.password, &id).map_err(super::Error::from)?;

		let created = state
			.database
			.create_user(NewUser {
				id,
				username: form.username.clone(),
				email: form.email.clone(),
				password: hashed.to_vec(),
			})
			.await;

		match created {
			Ok(user) => {
				tracing::info!(user = %user.id, username = %user.username, "registered");
				return Ok(redirect_with_flash("/login", SIGNUP_MESSAGE));
			}
			Err(store::Error::UsernameTaken) => errors.add("username", "Username already taken."),
			Err(store::Error::EmailTaken) => errors.add("email", "Email already taken."),
			Err(error) => return Err(error.into()),
		}
	}

	view::render(
		&ctx,
		view::SignupPage {
			layout: ctx.layout(),
			form: &form,
			errors,
		},
	)
}

/// Ends the current session, if any.
pub async fn logout(State(database): State<Database>, ctx: Context) -> Result<impl IntoResponse, Error> {
	if let Some(session_id) = ctx.session_id {
		database.delete_session(session_id).await?;

		tracing::info!(session = %session_id, "logged out");
	}

	Ok((
		[(
			header::SET_COOKIE,
			session::header_value(&session::clear_cookie()),
		)],
		Redirect::to("/"),
	))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_hash_password_is_salted_by_id() {
		let hasher = crate::test::hasher();
		let a = hash_password(&hasher, "hunter2", &Uuid::new_v4()).unwrap();
		let b = hash_password(&hasher, "hunter2", &Uuid::new_v4()).unwrap();

		assert_ne!(a, b);
	}

	#[test]
	fn test_hash_password_is_deterministic() {
		let hasher = crate::test::hasher();
		let id = Uuid::new_v4();

		assert_eq!(
			hash_password(&hasher, "hunter2", &id).unwrap(),
			hash_password(&hasher, "hunter2", &id).unwrap()
		);
	}
}
