pub mod forms;
pub mod guards;
pub mod health;
pub mod pages;
pub mod signin;
pub mod signout;
pub mod signup;

pub use self::health::health;
pub use self::signin::signin;
pub use self::signout::signout;
pub use self::signup::signup;

use thiserror::Error;

use self::forms::ValidationError;

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const PROTECTED_PATH: &str = "/protected";

pub const SIGNUP_CONFLICT_MESSAGE: &str = "The username or email are no longer available.";
pub const SIGNUP_FAILED_MESSAGE: &str = "An error occurred during the account creation process.";
pub const SIGNIN_UNKNOWN_MESSAGE: &str = "Account credentials do not exist, please try again.";
pub const SIGNIN_MISMATCH_MESSAGE: &str = "Double check that your credentials are correct.";
pub const SIGNIN_FAILED_MESSAGE: &str = "An error occurred during the login process.";

/// Failures that end a signup or signin attempt with the generic message.
#[derive(Debug, Error)]
pub(crate) enum AuthError {
    #[error("invalid form: {0}")]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
