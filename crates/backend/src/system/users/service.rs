use chrono::Utc;
use contracts::system::auth::Role;
use contracts::system::users::{ChangePasswordDto, CreateUserDto, UpdateUserDto, User};
use sea_orm::DatabaseConnection;

use super::repository;
use crate::shared::error::{ServiceError, ServiceResult};
use crate::shared::text::sanitize_opt;
use crate::system::auth::password;

fn validate_email(email: Option<&str>) -> ServiceResult<()> {
    match email {
        Some(email) if !email.contains('@') => Err(ServiceError::Validation(format!(
            "Invalid email format: {}",
            email
        ))),
        _ => Ok(()),
    }
}

pub async fn create(
    db: &DatabaseConnection,
    dto: CreateUserDto,
    created_by: Option<String>,
) -> ServiceResult<String> {
    let username = dto.username.trim().to_string();
    if username.is_empty() {
        return Err(ServiceError::Validation("Username cannot be empty".into()));
    }
    if repository::get_by_username(db, &username).await?.is_some() {
        return Err(ServiceError::Conflict(format!("Username {} already exists", username)));
    }
    let email = sanitize_opt(dto.email);
    validate_email(email.as_deref())?;
    password::validate_password_strength(&dto.password)
        .map_err(|e| ServiceError::Validation(e.to_string()))?;

    let password_hash = password::hash_password(&dto.password)?;
    let now = Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        email,
        full_name: sanitize_opt(dto.full_name),
        is_active: true,
        role: dto.role,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
        created_by,
    };
    repository::create_with_password(db, &user, &password_hash).await?;
    tracing::info!("Created user {} with role {}", user.username, user.role.code());
    Ok(user.id)
}

pub async fn update(db: &DatabaseConnection, dto: UpdateUserDto) -> ServiceResult<()> {
    let mut user = get_by_id(db, &dto.id).await?;
    let email = sanitize_opt(dto.email);
    validate_email(email.as_deref())?;

    user.email = email;
    user.full_name = sanitize_opt(dto.full_name);
    user.is_active = dto.is_active;
    user.role = dto.role;
    user.updated_at = Utc::now().to_rfc3339();
    repository::update(db, &user).await?;
    Ok(())
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> ServiceResult<()> {
    if !repository::delete(db, id).await? {
        return Err(ServiceError::not_found(format!("User {}", id)));
    }
    tracing::info!("Deleted user {}", id);
    Ok(())
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> ServiceResult<User> {
    repository::get_by_id(db, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("User {}", id)))
}

pub async fn list_all(db: &DatabaseConnection) -> ServiceResult<Vec<User>> {
    Ok(repository::list_all(db).await?)
}

/// Смена пароля: свой пароль (со старым паролем) или чужой (только админ)
pub async fn change_password(
    db: &DatabaseConnection,
    dto: ChangePasswordDto,
    requester_id: &str,
    requester_role: Role,
) -> ServiceResult<()> {
    let user = get_by_id(db, &dto.user_id).await?;

    if user.id != requester_id {
        if !requester_role.is_admin() {
            return Err(ServiceError::Forbidden(
                "only administrators may change other users' passwords".into(),
            ));
        }
    } else {
        let old_password = dto
            .old_password
            .as_deref()
            .ok_or_else(|| ServiceError::Validation("Old password is required".into()))?;
        let current_hash = repository::get_password_hash(db, &user.id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Password of user {}", user.id)))?;
        if !password::verify_password(old_password, &current_hash)? {
            return Err(ServiceError::Validation("Invalid old password".into()));
        }
    }

    password::validate_password_strength(&dto.new_password)
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    let new_hash = password::hash_password(&dto.new_password)?;
    repository::update_password(db, &user.id, &new_hash).await?;
    tracing::info!("Password changed for user {}", user.username);
    Ok(())
}

/// Проверка логина и пароля; `None` при неверной паре
pub async fn verify_credentials(
    db: &DatabaseConnection,
    username: &str,
    password_text: &str,
) -> ServiceResult<Option<User>> {
    let Some(user) = repository::get_by_username(db, username.trim()).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Err(ServiceError::Forbidden("user account is inactive".into()));
    }
    let Some(hash) = repository::get_password_hash(db, &user.id).await? else {
        return Ok(None);
    };
    if !password::verify_password(password_text, &hash)? {
        return Ok(None);
    }
    if let Err(e) = repository::update_last_login(db, &user.id).await {
        tracing::warn!("Failed to update last login for {}: {}", user.username, e);
    }
    Ok(Some(user))
}
