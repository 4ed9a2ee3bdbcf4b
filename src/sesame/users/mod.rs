//! User records and the store abstraction the auth handlers write through.
//!
//! Records are created on signup and never updated or deleted. Usernames and
//! emails are each unique across the collection.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod postgres;

pub use self::postgres::PgUserStore;

/// A stored user. `password_hash` is an Argon2id PHC string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Fields supplied by signup; the store assigns the id.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Result of an insert attempt.
#[derive(Debug)]
pub enum InsertOutcome {
    Created(User),
    /// Username or email already taken; nothing was written.
    Conflict,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user whose username OR email matches.
    async fn find_by_username_or_email(&self, username: &str, email: &str)
        -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn insert(&self, user: NewUser) -> Result<InsertOutcome>;
}

/// Process-local user collection.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|user| user.username == username || user.email == email)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<InsertOutcome> {
        // Uniqueness is re-checked under the write lock.
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|existing| existing.username == user.username || existing.email == user.email)
        {
            return Ok(InsertOutcome::Conflict);
        }

        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };
        users.push(record.clone());

        Ok(InsertOutcome::Created(record))
    }
}
