use crate::shared::config::{get_database_path, Config, DatabaseConfig};
use anyhow::Context;
use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::time::Duration;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Схема всех таблиц (CREATE ... IF NOT EXISTS)
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Срок жизни единственного соединения in-memory БД
const IN_MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

pub async fn initialize_database(config: &Config) -> anyhow::Result<()> {
    let conn = connect(config).await?;
    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Открыть соединение согласно `[database]`
pub async fn connect(config: &Config) -> anyhow::Result<DatabaseConnection> {
    if config.database.is_in_memory() {
        tracing::info!("Using in-memory SQLite database, data is lost on restart");
        return connect_in_memory().await;
    }
    connect_file(config, &config.database).await
}

/// In-memory БД живёт, пока открыто её соединение, поэтому пул держит ровно одно
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(IN_MEMORY_CONNECTION_LIFETIME)
        .max_lifetime(IN_MEMORY_CONNECTION_LIFETIME)
        .sqlx_logging(false);
    Database::connect(options)
        .await
        .context("Failed to open in-memory database")
}

async fn connect_file(config: &Config, database: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let absolute_path = get_database_path(config)?;
    if let Some(parent) = absolute_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create database directory {}", parent.display()))?;
    }
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    tracing::info!("Opening database {} ({})", absolute_path.display(), database.path);

    let mut options = ConnectOptions::new(db_url);
    options.sqlx_logging(false);
    Database::connect(options)
        .await
        .with_context(|| format!("Failed to open database {}", absolute_path.display()))
}

/// Выполнить скрипт схемы по одному оператору
pub async fn bootstrap_schema<C: ConnectionTrait>(db: &C) -> anyhow::Result<()> {
    let statements = split_statements(SCHEMA_SQL);
    for (idx, statement) in statements.iter().enumerate() {
        db.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("{};", statement),
        ))
        .await
        .with_context(|| {
            format!(
                "Failed to execute schema statement #{}: {}",
                idx,
                statement.lines().next().unwrap_or_default()
            )
        })?;
    }
    tracing::info!("Database schema is up to date ({} statements)", statements.len());
    Ok(())
}

/// Разбить SQL-скрипт на операторы, отбросив строки-комментарии
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|statement| {
            statement
                .lines()
                .filter(|line| {
                    let trimmed = line.trim();
                    !trimmed.is_empty() && !trimmed.starts_with("--")
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .filter(|s| !s.trim().is_empty())
        .collect()
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Свежая in-memory БД со схемой
    pub async fn memory_db() -> DatabaseConnection {
        let db = connect_in_memory().await.unwrap();
        bootstrap_schema(&db).await.unwrap();
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_statements_skips_comments() {
        let sql = "-- header\nCREATE TABLE a (id TEXT);\n\n-- note\nCREATE INDEX i ON a (id);\n";
        let statements = split_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE a (id TEXT)", "CREATE INDEX i ON a (id)"]);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let db = testing::memory_db().await;
        bootstrap_schema(&db).await.unwrap();

        let tables = db
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name".to_string(),
            ))
            .await
            .unwrap();
        let names: Vec<String> = tables
            .iter()
            .map(|row| row.try_get::<String>("", "name").unwrap())
            .collect();
        for expected in [
            "a001_kpi",
            "a002_team_action_plan",
            "a003_individual_performance",
            "a004_period",
            "a005_employee",
            "sys_users",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }
}
