//! Typed form input. Raw fields are checked here before any store call.

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

pub const USERNAME_MIN_CHARS: usize = 3;
pub const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing form body")]
    MissingBody,
    #[error("missing field: {0}")]
    Missing(&'static str),
    #[error("username must be at least {} characters", USERNAME_MIN_CHARS)]
    UsernameTooShort,
    #[error("invalid email format")]
    InvalidEmail,
    #[error("password must be at least {} characters", PASSWORD_MIN_CHARS)]
    PasswordTooShort,
}

/// Raw `POST /signup` body.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Raw `POST /signin` body.
#[derive(Debug, Default, Deserialize)]
pub struct SigninForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated signup input.
#[derive(Debug)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Validated signin input.
#[derive(Debug)]
pub struct SigninInput {
    pub email: String,
    pub password: String,
}

impl TryFrom<SignupForm> for SignupInput {
    type Error = ValidationError;

    fn try_from(form: SignupForm) -> Result<Self, Self::Error> {
        let username = required(form.username, "username")?;
        let email = required(form.email, "email")?;
        let password = required(form.password, "password")?;

        if username.chars().count() < USERNAME_MIN_CHARS {
            return Err(ValidationError::UsernameTooShort);
        }
        check_email(&email)?;
        check_password(&password)?;

        Ok(Self {
            username,
            email,
            password,
        })
    }
}

impl TryFrom<SigninForm> for SigninInput {
    type Error = ValidationError;

    fn try_from(form: SigninForm) -> Result<Self, Self::Error> {
        let email = required(form.email, "email")?;
        let password = required(form.password, "password")?;

        check_email(&email)?;
        check_password(&password)?;

        Ok(Self { email, password })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::Missing(field))
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        Err(ValidationError::PasswordTooShort)
    } else {
        Ok(())
    }
}

/// Basic email format check.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, password: &str) -> SignupForm {
        SignupForm {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@b.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }

    #[test]
    fn signup_accepts_minimum_lengths() {
        let input = SignupInput::try_from(signup("abc", "a@b.com", "password")).map(|i| i.username);
        assert_eq!(input, Ok("abc".to_string()));
    }

    #[test]
    fn signup_rejects_each_constraint() {
        assert_eq!(
            SignupInput::try_from(signup("ab", "a@b.com", "password1")).err(),
            Some(ValidationError::UsernameTooShort)
        );
        assert_eq!(
            SignupInput::try_from(signup("abc", "a.b.com", "password1")).err(),
            Some(ValidationError::InvalidEmail)
        );
        assert_eq!(
            SignupInput::try_from(signup("abc", "a@b.com", "short")).err(),
            Some(ValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn signup_requires_every_field() {
        let form = SignupForm {
            username: Some("abc".to_string()),
            email: None,
            password: Some("password1".to_string()),
        };
        assert_eq!(
            SignupInput::try_from(form).err(),
            Some(ValidationError::Missing("email"))
        );
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // Three characters, six bytes.
        assert!(SignupInput::try_from(signup("äöü", "a@b.com", "password1")).is_ok());
        // Seven characters, fourteen bytes.
        assert_eq!(
            SignupInput::try_from(signup("abc", "a@b.com", "äääääää")).err(),
            Some(ValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn signin_validates_email_and_password() {
        let ok = SigninInput::try_from(SigninForm {
            email: Some("a@b.com".to_string()),
            password: Some("password1".to_string()),
        });
        assert!(ok.is_ok());

        let short = SigninInput::try_from(SigninForm {
            email: Some("a@b.com".to_string()),
            password: Some("pass".to_string()),
        });
        assert_eq!(short.err(), Some(ValidationError::PasswordTooShort));

        let missing = SigninInput::try_from(SigninForm::default());
        assert_eq!(missing.err(), Some(ValidationError::Missing("email")));
    }
}
