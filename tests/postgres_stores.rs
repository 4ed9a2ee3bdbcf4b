//! Postgres-backed user and session stores against `sql/schema.sql`.
//!
//! Set `SESAME_TEST_DSN` to a disposable database to run these; without it
//! the tests are skipped.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::{bail, Context, Result};
use sesame::sesame::{
    schema,
    session::{PgSessionStore, SessionData, SessionStore},
    users::{InsertOutcome, NewUser, PgUserStore, UserStore},
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tokio::sync::OnceCell;
use uuid::Uuid;

const TEST_DSN: &str = "SESAME_TEST_DSN";

// Concurrent `CREATE TABLE IF NOT EXISTS` can collide, so apply it once.
static SCHEMA: OnceCell<()> = OnceCell::const_new();

async fn connect() -> Result<Option<PgPool>> {
    let Ok(dsn) = std::env::var(TEST_DSN) else {
        eprintln!("Skipping integration test: {TEST_DSN} is not set");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&dsn)
        .await
        .context("Failed to connect to test database")?;
    SCHEMA.get_or_try_init(|| schema::apply(&pool)).await?;
    Ok(Some(pool))
}

fn new_user(suffix: &str) -> NewUser {
    NewUser {
        username: format!("user-{suffix}"),
        email: format!("{suffix}@sesame.test"),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
    }
}

fn token_hash() -> Vec<u8> {
    Uuid::new_v4().as_bytes().to_vec()
}

#[tokio::test]
async fn user_store_inserts_and_rejects_duplicates() -> Result<()> {
    let Some(pool) = connect().await? else {
        return Ok(());
    };
    let users = PgUserStore::new(pool);
    let suffix = Uuid::new_v4().simple().to_string();

    let created = match users.insert(new_user(&suffix)).await? {
        InsertOutcome::Created(user) => user,
        InsertOutcome::Conflict => bail!("fresh user reported as conflict"),
    };
    assert_eq!(created.username, format!("user-{suffix}"));
    assert!(!created.id.is_nil());

    let found = users
        .find_by_email(&format!("{suffix}@sesame.test"))
        .await?
        .expect("user by email");
    assert_eq!(found, created);

    let found = users
        .find_by_username_or_email(&format!("user-{suffix}"), "nobody@sesame.test")
        .await?
        .expect("user by username");
    assert_eq!(found.id, created.id);

    // Same username, new email.
    let mut duplicate = new_user(&suffix);
    duplicate.email = format!("other-{suffix}@sesame.test");
    assert!(matches!(
        users.insert(duplicate).await?,
        InsertOutcome::Conflict
    ));

    // Same email, new username.
    let mut duplicate = new_user(&suffix);
    duplicate.username = format!("other-{suffix}");
    assert!(matches!(
        users.insert(duplicate).await?,
        InsertOutcome::Conflict
    ));

    assert!(users
        .find_by_email(&format!("other-{suffix}@sesame.test"))
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn session_store_saves_loads_and_destroys() -> Result<()> {
    let Some(pool) = connect().await? else {
        return Ok(());
    };
    let sessions = PgSessionStore::new(pool);
    let hash = token_hash();

    assert_eq!(sessions.load(&hash).await?, None);

    let anonymous = SessionData {
        flash: Some("hello".to_string()),
        ..SessionData::default()
    };
    sessions
        .save(&hash, &anonymous, Duration::from_secs(60))
        .await?;
    assert_eq!(sessions.load(&hash).await?, Some(anonymous));

    let signed_in = SessionData {
        username: Some("abc".to_string()),
        user_id: Some(Uuid::new_v4().to_string()),
        flash: None,
    };
    sessions
        .save(&hash, &signed_in, Duration::from_secs(60))
        .await?;
    assert_eq!(sessions.load(&hash).await?, Some(signed_in));

    sessions.destroy(&hash).await?;
    assert_eq!(sessions.load(&hash).await?, None);

    // Destroying a missing record is not an error.
    sessions.destroy(&hash).await?;

    Ok(())
}

#[tokio::test]
async fn session_store_purges_expired_rows() -> Result<()> {
    let Some(pool) = connect().await? else {
        return Ok(());
    };
    let sessions = PgSessionStore::new(pool);
    let stale = token_hash();
    let live = token_hash();

    sessions
        .save(&stale, &SessionData::default(), Duration::ZERO)
        .await?;
    sessions
        .save(&live, &SessionData::default(), Duration::from_secs(60))
        .await?;

    assert_eq!(sessions.load(&stale).await?, None);

    // Other expired rows in a shared database may be purged too.
    assert!(sessions.cleanup_expired().await? >= 1);
    assert!(sessions.load(&live).await?.is_some());

    sessions.destroy(&live).await?;
    Ok(())
}
