//! # Sesame
//!
//! `sesame` is a small session-based authentication service: visitors sign up
//! or sign in through HTML forms, and a cookie-backed session decides whether
//! they may see the protected page.
//!
//! ## Sessions
//!
//! The session cookie carries an opaque random token. Stores only ever see its
//! SHA-256 hash. Session state is limited to the signed-in identity and a
//! one-shot flash message that the next rendered page consumes.
//!
//! ## Passwords
//!
//! Passwords are hashed with Argon2id and a per-record salt. The stored PHC
//! string is the only password material that reaches the user store.
//!
//! ## Failure disclosure
//!
//! Signin answers an unknown email and a wrong password with different flash
//! messages but the same redirect target. Internal failures are logged and only
//! a generic message reaches the browser.

pub mod cli;
pub mod sesame;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
