//! Startup schema bootstrap. Every statement is idempotent.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::debug;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Apply `sql/schema.sql` statement by statement.
///
/// # Errors
/// Returns an error naming the failing statement.
pub async fn apply(pool: &PgPool) -> Result<()> {
    for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }
    debug!("schema applied");
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_skips_comments_and_keeps_multiline_statements() {
        let sql = "-- users\nCREATE TABLE a (\n  id INT\n);\n\nCREATE INDEX b ON a (id);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE a ("));
        assert!(statements[0].ends_with(");"));
        assert_eq!(statements[1], "CREATE INDEX b ON a (id);");
    }

    #[test]
    fn split_keeps_trailing_statement_without_semicolon() {
        let statements = split_sql_statements("SELECT 1");
        assert_eq!(statements, vec!["SELECT 1".to_string()]);
    }

    #[test]
    fn bundled_schema_creates_both_tables() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert!(statements.iter().any(|s| s.contains("CREATE TABLE IF NOT EXISTS users")));
        assert!(statements
            .iter()
            .any(|s| s.contains("CREATE TABLE IF NOT EXISTS sessions")));
    }
}
