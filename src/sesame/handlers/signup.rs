use axum::{extract::Extension, response::Redirect, Form};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::{
    forms::{SignupForm, SignupInput, ValidationError},
    AuthError, HOME_PATH, PROTECTED_PATH, SIGNUP_CONFLICT_MESSAGE, SIGNUP_FAILED_MESSAGE,
};
use crate::sesame::{
    password,
    session::Session,
    state::AppState,
    users::{InsertOutcome, NewUser, User, UserStore},
};

#[derive(Debug)]
pub(crate) enum SignupOutcome {
    Created(User),
    /// Username or email taken; nothing was written.
    Conflict,
}

/// `POST /signup`
#[instrument(skip_all)]
pub async fn signup(
    Extension(state): Extension<Arc<AppState>>,
    Extension(session): Extension<Session>,
    form: Option<Form<SignupForm>>,
) -> Redirect {
    match register(state.users(), form.map(|Form(form)| form)).await {
        Ok(SignupOutcome::Created(user)) => {
            info!(user_id = %user.id, "user signed up");
            session.set_identity(user.username, user.id.to_string()).await;
            Redirect::to(PROTECTED_PATH)
        }
        Ok(SignupOutcome::Conflict) => {
            debug!("signup rejected: username or email taken");
            session.flash(SIGNUP_CONFLICT_MESSAGE).await;
            Redirect::to(HOME_PATH)
        }
        Err(AuthError::Invalid(err)) => {
            debug!("signup rejected: {err}");
            session.flash(SIGNUP_FAILED_MESSAGE).await;
            Redirect::to(HOME_PATH)
        }
        Err(AuthError::Internal(err)) => {
            error!("Failed to create account: {err:#}");
            session.flash(SIGNUP_FAILED_MESSAGE).await;
            Redirect::to(HOME_PATH)
        }
    }
}

pub(crate) async fn register(
    users: &dyn UserStore,
    form: Option<SignupForm>,
) -> Result<SignupOutcome, AuthError> {
    let input = SignupInput::try_from(form.ok_or(ValidationError::MissingBody)?)?;

    if users
        .find_by_username_or_email(&input.username, &input.email)
        .await?
        .is_some()
    {
        return Ok(SignupOutcome::Conflict);
    }

    let password_hash = password::hash(input.password).await?;

    let outcome = users
        .insert(NewUser {
            username: input.username,
            email: input.email,
            password_hash,
        })
        .await?;

    Ok(match outcome {
        InsertOutcome::Created(user) => SignupOutcome::Created(user),
        InsertOutcome::Conflict => SignupOutcome::Conflict,
    })
}
