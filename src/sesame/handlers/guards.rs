//! Access gates. Both only read `user_id`; neither touches session state.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::{LOGIN_PATH, PROTECTED_PATH};
use crate::sesame::session::{Session, SessionData};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Proceed,
    Redirect(&'static str),
}

/// Pages for signed-in users only.
#[must_use]
pub fn require_logged_in(data: &SessionData) -> Gate {
    if data.user_id.is_some() {
        Gate::Proceed
    } else {
        Gate::Redirect(LOGIN_PATH)
    }
}

/// Pages for anonymous visitors only.
#[must_use]
pub fn require_logged_out(data: &SessionData) -> Gate {
    if data.user_id.is_none() {
        Gate::Proceed
    } else {
        Gate::Redirect(PROTECTED_PATH)
    }
}

pub async fn is_logged_in(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    apply(require_logged_in(&session.snapshot().await), request, next).await
}

pub async fn is_logged_out(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    apply(require_logged_out(&session.snapshot().await), request, next).await
}

async fn apply(gate: Gate, request: Request, next: Next) -> Response {
    match gate {
        Gate::Proceed => next.run(request).await,
        Gate::Redirect(to) => Redirect::to(to).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> SessionData {
        SessionData {
            username: Some("abc".to_string()),
            user_id: Some("42".to_string()),
            flash: None,
        }
    }

    #[test]
    fn logged_in_gate() {
        assert_eq!(require_logged_in(&signed_in()), Gate::Proceed);
        assert_eq!(
            require_logged_in(&SessionData::default()),
            Gate::Redirect("/login")
        );
    }

    #[test]
    fn logged_out_gate() {
        assert_eq!(
            require_logged_out(&SessionData::default()),
            Gate::Proceed
        );
        assert_eq!(
            require_logged_out(&signed_in()),
            Gate::Redirect("/protected")
        );
    }

    #[test]
    fn gates_only_look_at_user_id() {
        let name_only = SessionData {
            username: Some("abc".to_string()),
            user_id: None,
            flash: Some("hi".to_string()),
        };
        assert_eq!(require_logged_in(&name_only), Gate::Redirect("/login"));
        assert_eq!(require_logged_out(&name_only), Gate::Proceed);
    }

    #[test]
    fn gates_are_idempotent() {
        for data in [SessionData::default(), signed_in()] {
            let first = (require_logged_in(&data), require_logged_out(&data));
            for _ in 0..3 {
                assert_eq!((require_logged_in(&data), require_logged_out(&data)), first);
            }
        }
    }
}
