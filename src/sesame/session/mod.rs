//! Cookie sessions.
//!
//! [`middleware`] loads the session named by the `sesame_session` cookie (or
//! starts a new one), hands handlers a [`Session`] through request extensions,
//! and persists whatever they changed once the response is ready.

use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::interval};
use tracing::{debug, error};

pub mod postgres;
pub mod store;

pub use self::postgres::PgSessionStore;
pub use self::store::{MemorySessionStore, SessionData, SessionStore};

pub const SESSION_COOKIE_NAME: &str = "sesame_session";

pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;
/// One year.
pub const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;
/// How often expired session records are purged.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
pub struct SessionConfig {
    ttl_seconds: u64,
    cookie_secure: bool,
}

impl SessionConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds.min(MAX_SESSION_TTL_SECONDS);
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Store plus cookie policy, shared by every request.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[derive(Debug, Default)]
struct SessionState {
    data: SessionData,
    changed: bool,
    regenerate: bool,
    destroyed: bool,
}

/// Per-request session handle. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    #[must_use]
    pub fn new(data: SessionData) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                data,
                changed: false,
                regenerate: false,
                destroyed: false,
            })),
        }
    }

    /// Current data, for read-only decisions such as the access gates.
    pub async fn snapshot(&self) -> SessionData {
        self.state.lock().await.data.clone()
    }

    pub async fn username(&self) -> Option<String> {
        self.state.lock().await.data.username.clone()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.state.lock().await.data.user_id.clone()
    }

    /// Record the signed-in user. The session moves to a fresh token, so a
    /// cookie handed out before authentication never carries the identity.
    pub async fn set_identity(&self, username: String, user_id: String) {
        let mut state = self.state.lock().await;
        state.data.username = Some(username);
        state.data.user_id = Some(user_id);
        state.changed = true;
        state.regenerate = true;
    }

    /// Keep the data but issue a new token; the old record is deleted.
    pub async fn regenerate(&self) {
        let mut state = self.state.lock().await;
        state.changed = true;
        state.regenerate = true;
    }

    /// Leave a message for the next rendered page.
    pub async fn flash(&self, message: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.data.flash = Some(message.into());
        state.changed = true;
    }

    /// Return the pending flash message and clear it.
    pub async fn take_flash(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        let message = state.data.flash.take();
        if message.is_some() {
            state.changed = true;
        }
        message
    }

    /// Drop the whole session, not just its fields.
    pub async fn destroy(&self) {
        let mut state = self.state.lock().await;
        state.data = SessionData::default();
        state.destroyed = true;
    }
}

/// Load the request's session, run the handler, persist the result.
pub async fn middleware(
    State(manager): State<SessionManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let (mut token, data) = match resolve_session(&manager, request.headers()).await {
        Ok(resolved) => resolved,
        Err(err) => {
            error!("Failed to load session: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let session = Session::new(data.clone().unwrap_or_default());
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let state = session.state.lock().await;

    if state.destroyed {
        if data.is_some() {
            if let Err(err) = manager.store.destroy(&hash_session_token(&token)).await {
                error!("Failed to delete session: {err:#}");
            }
        }
        // Always clear the cookie, even if the session record was missing.
        if let Ok(cookie) = clear_session_cookie(&manager.config) {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        return response;
    }

    if state.regenerate {
        if data.is_some() {
            if let Err(err) = manager.store.destroy(&hash_session_token(&token)).await {
                error!("Failed to delete replaced session: {err:#}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
        token = match generate_session_token() {
            Ok(token) => token,
            Err(err) => {
                error!("Failed to regenerate session token: {err:#}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        debug!("session token regenerated");
    }

    // New sessions are persisted on first sight; known ones only when touched.
    if data.is_none() || state.changed {
        if let Err(err) = manager
            .store
            .save(&hash_session_token(&token), &state.data, manager.config.ttl())
            .await
        {
            error!("Failed to save session: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        match session_cookie(&manager.config, &token) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(err) => error!("Failed to build session cookie: {err}"),
        }
    }

    response
}

/// Periodically delete expired records from `store`.
pub fn spawn_cleanup_worker(
    store: Arc<dyn SessionStore>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            match store.cleanup_expired().await {
                Ok(0) => {}
                Ok(deleted) => debug!("purged {deleted} expired sessions"),
                Err(err) => error!("session cleanup failed: {err:#}"),
            }
        }
    })
}

/// Returns the token to use and the stored data, `None` for a new session.
async fn resolve_session(
    manager: &SessionManager,
    headers: &HeaderMap,
) -> Result<(String, Option<SessionData>)> {
    if let Some(token) = extract_session_token(headers) {
        let token_hash = hash_session_token(&token);
        if let Some(data) = manager.store.load(&token_hash).await? {
            return Ok((token, Some(data)));
        }
        debug!("unknown or expired session cookie, starting a new session");
    }
    Ok((generate_session_token()?, None))
}

/// Create a new session token for the cookie.
/// The raw value is only returned to set the cookie; stores see its hash.
pub(crate) fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash a session token so raw values never reach a store.
pub(crate) fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build an `HttpOnly` cookie for the session token.
fn session_cookie(config: &SessionConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &SessionConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().map(str::trim);
            let val = parts.next().map(str::trim);
            if let (Some(SESSION_COOKIE_NAME), Some(val)) = (key, val) {
                if !val.is_empty() {
                    return Some(val.to_string());
                }
            }
        }
    }
    None
}
