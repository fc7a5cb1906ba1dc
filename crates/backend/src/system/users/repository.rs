use contracts::system::auth::Role;
use contracts::system::users::User;
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, QueryResult, Statement};

const USER_COLUMNS: &str = "id, username, email, full_name, is_active, role, created_at, updated_at, last_login_at, created_by";

fn user_from_row(row: &QueryResult) -> Result<User, DbErr> {
    let role: String = row.try_get("", "role")?;
    Ok(User {
        id: row.try_get("", "id")?,
        username: row.try_get("", "username")?,
        email: row.try_get("", "email")?,
        full_name: row.try_get("", "full_name")?,
        is_active: row.try_get::<i32>("", "is_active")? != 0,
        role: Role::from_code(&role)
            .ok_or_else(|| DbErr::Custom(format!("sys_users: unexpected role '{}'", role)))?,
        created_at: row.try_get("", "created_at")?,
        updated_at: row.try_get("", "updated_at")?,
        last_login_at: row.try_get("", "last_login_at")?,
        created_by: row.try_get("", "created_by")?,
    })
}

pub async fn create_with_password(
    db: &DatabaseConnection,
    user: &User,
    password_hash: &str,
) -> Result<(), DbErr> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_users (id, username, email, password_hash, full_name, is_active, role, created_at, updated_at, last_login_at, created_by)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            user.id.clone().into(),
            user.username.clone().into(),
            user.email.clone().into(),
            password_hash.to_string().into(),
            user.full_name.clone().into(),
            i32::from(user.is_active).into(),
            user.role.code().into(),
            user.created_at.clone().into(),
            user.updated_at.clone().into(),
            user.last_login_at.clone().into(),
            user.created_by.clone().into(),
        ],
    ))
    .await?;
    Ok(())
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<User>, DbErr> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            format!("SELECT {} FROM sys_users WHERE id = ?", USER_COLUMNS),
            [id.into()],
        ))
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_by_username(db: &DatabaseConnection, username: &str) -> Result<Option<User>, DbErr> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            format!("SELECT {} FROM sys_users WHERE username = ?", USER_COLUMNS),
            [username.into()],
        ))
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_password_hash(db: &DatabaseConnection, user_id: &str) -> Result<Option<String>, DbErr> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT password_hash FROM sys_users WHERE id = ?",
            [user_id.into()],
        ))
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get("", "password_hash")?)),
        None => Ok(None),
    }
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<User>, DbErr> {
    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT {} FROM sys_users ORDER BY username", USER_COLUMNS),
        ))
        .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn update(db: &DatabaseConnection, user: &User) -> Result<(), DbErr> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users SET email = ?, full_name = ?, is_active = ?, role = ?, updated_at = ? WHERE id = ?",
        [
            user.email.clone().into(),
            user.full_name.clone().into(),
            i32::from(user.is_active).into(),
            user.role.code().into(),
            user.updated_at.clone().into(),
            user.id.clone().into(),
        ],
    ))
    .await?;
    Ok(())
}

/// Удаление пользователя вместе с его refresh-токенами
pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool, DbErr> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM sys_refresh_tokens WHERE user_id = ?",
        [id.into()],
    ))
    .await?;
    let result = db
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "DELETE FROM sys_users WHERE id = ?",
            [id.into()],
        ))
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_last_login(db: &DatabaseConnection, id: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users SET last_login_at = ? WHERE id = ?",
        [chrono::Utc::now().to_rfc3339().into(), id.into()],
    ))
    .await?;
    Ok(())
}

pub async fn count_users(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS count FROM sys_users".to_string(),
        ))
        .await?;
    match row {
        Some(row) => Ok(row.try_get::<i64>("", "count")? as usize),
        None => Ok(0),
    }
}

pub async fn update_password(db: &DatabaseConnection, id: &str, password_hash: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "UPDATE sys_users SET password_hash = ?, updated_at = ? WHERE id = ?",
        [
            password_hash.into(),
            chrono::Utc::now().to_rfc3339().into(),
            id.into(),
        ],
    ))
    .await?;
    Ok(())
}
