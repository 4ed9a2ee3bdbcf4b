use axum::{extract::Extension, response::Redirect, Form};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::{
    forms::{SigninForm, SigninInput, ValidationError},
    AuthError, LOGIN_PATH, PROTECTED_PATH, SIGNIN_FAILED_MESSAGE, SIGNIN_MISMATCH_MESSAGE,
    SIGNIN_UNKNOWN_MESSAGE,
};
use crate::sesame::{
    password,
    session::Session,
    state::AppState,
    users::{User, UserStore},
};

#[derive(Debug)]
pub(crate) enum SigninOutcome {
    Authenticated(User),
    UnknownEmail,
    WrongPassword,
}

/// `POST /signin`
///
/// Unknown email and wrong password get different messages but the same
/// redirect target.
#[instrument(skip_all)]
pub async fn signin(
    Extension(state): Extension<Arc<AppState>>,
    Extension(session): Extension<Session>,
    form: Option<Form<SigninForm>>,
) -> Redirect {
    let message = match authenticate(state.users(), form.map(|Form(form)| form)).await {
        Ok(SigninOutcome::Authenticated(user)) => {
            info!(user_id = %user.id, "user signed in");
            session.set_identity(user.username, user.id.to_string()).await;
            return Redirect::to(PROTECTED_PATH);
        }
        Ok(SigninOutcome::UnknownEmail) => SIGNIN_UNKNOWN_MESSAGE,
        Ok(SigninOutcome::WrongPassword) => SIGNIN_MISMATCH_MESSAGE,
        Err(AuthError::Invalid(err)) => {
            debug!("signin rejected: {err}");
            SIGNIN_FAILED_MESSAGE
        }
        Err(AuthError::Internal(err)) => {
            error!("Failed to sign in: {err:#}");
            SIGNIN_FAILED_MESSAGE
        }
    };

    session.flash(message).await;
    Redirect::to(LOGIN_PATH)
}

pub(crate) async fn authenticate(
    users: &dyn UserStore,
    form: Option<SigninForm>,
) -> Result<SigninOutcome, AuthError> {
    let input = SigninInput::try_from(form.ok_or(ValidationError::MissingBody)?)?;

    let Some(user) = users.find_by_email(&input.email).await? else {
        return Ok(SigninOutcome::UnknownEmail);
    };

    if password::verify(input.password, user.password_hash.clone()).await? {
        Ok(SigninOutcome::Authenticated(user))
    } else {
        Ok(SigninOutcome::WrongPassword)
    }
}
