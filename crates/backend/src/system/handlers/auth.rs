use axum::{extract::Json, http::StatusCode};
use contracts::system::auth::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, UserInfo};
use contracts::system::users::User;

use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceError;
use crate::system::auth::extractor::CurrentUser;
use crate::system::auth::{jwt, refresh_tokens};
use crate::system::users::service as user_service;

fn internal(e: impl std::fmt::Display) -> StatusCode {
    tracing::error!("Auth handler failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        role: user.role,
    }
}

pub async fn login(Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    let db = get_connection().map_err(internal)?;
    let user = match user_service::verify_credentials(db, &request.username, &request.password).await {
        Ok(Some(user)) => user,
        Ok(None) | Err(ServiceError::Forbidden(_)) => {
            tracing::warn!("Failed login attempt for {}", request.username);
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => return Err(internal(e)),
    };

    let access_token = jwt::generate_access_token(&user.id, &user.username, user.role)
        .await
        .map_err(internal)?;
    let refresh_token = jwt::generate_refresh_token();
    refresh_tokens::store(db, &user.id, &refresh_token)
        .await
        .map_err(internal)?;

    tracing::info!("User {} logged in", user.username);
    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        user: user_info(user),
    }))
}

pub async fn refresh(Json(request): Json<RefreshRequest>) -> Result<Json<RefreshResponse>, StatusCode> {
    let db = get_connection().map_err(internal)?;
    let user_id = refresh_tokens::find_user_id(db, &request.refresh_token)
        .await
        .map_err(internal)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = match user_service::get_by_id(db, &user_id).await {
        Ok(user) if user.is_active => user,
        Ok(_) | Err(ServiceError::NotFound(_)) => return Err(StatusCode::UNAUTHORIZED),
        Err(e) => return Err(internal(e)),
    };

    let access_token = jwt::generate_access_token(&user.id, &user.username, user.role)
        .await
        .map_err(internal)?;
    Ok(Json(RefreshResponse { access_token }))
}

pub async fn logout(Json(request): Json<RefreshRequest>) -> Result<StatusCode, StatusCode> {
    let db = get_connection().map_err(internal)?;
    refresh_tokens::revoke(db, &request.refresh_token)
        .await
        .map_err(internal)?;
    Ok(StatusCode::OK)
}

/// Данные пользователя из текущей сессии
pub async fn current_user(CurrentUser(claims): CurrentUser) -> Result<Json<UserInfo>, StatusCode> {
    let db = get_connection().map_err(internal)?;
    match user_service::get_by_id(db, &claims.sub).await {
        Ok(user) => Ok(Json(user_info(user))),
        Err(ServiceError::NotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(internal(e)),
    }
}
