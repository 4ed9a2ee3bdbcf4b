use axum::{extract::Extension, response::Redirect};
use tracing::instrument;

use super::LOGIN_PATH;
use crate::sesame::session::Session;

/// `GET /signout`: drops the whole session; the session middleware deletes
/// the stored record and clears the cookie.
#[instrument(skip_all)]
pub async fn signout(Extension(session): Extension<Session>) -> Redirect {
    session.destroy().await;
    Redirect::to(LOGIN_PATH)
}
