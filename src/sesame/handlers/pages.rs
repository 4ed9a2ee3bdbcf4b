//! Page handlers. Each consumes the pending flash message.

use axum::{extract::Extension, response::Html};
use std::sync::Arc;

use crate::sesame::{
    session::Session,
    state::AppState,
    views::{View, ViewContext},
};

/// `GET /`: the signup form, for anonymous visitors.
pub async fn index(
    Extension(state): Extension<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    render_with_flash(&state, &session, View::Index, ViewContext::new()).await
}

/// `GET /login`: the signin form, for anonymous visitors.
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    render_with_flash(&state, &session, View::Login, ViewContext::new()).await
}

/// `GET /protected`: greets the signed-in user by name.
pub async fn protected(
    Extension(state): Extension<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let mut context = ViewContext::new();
    if let Some(username) = session.username().await {
        context.insert("username", username);
    }
    render_with_flash(&state, &session, View::Protected, context).await
}

async fn render_with_flash(
    state: &AppState,
    session: &Session,
    view: View,
    mut context: ViewContext,
) -> Html<String> {
    if let Some(message) = session.take_flash().await {
        context.insert("message", message);
    }
    Html(state.views().render(view, &context))
}
