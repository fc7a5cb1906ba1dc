use axum::extract::{Json, Path};
use axum::http::StatusCode;
use contracts::system::users::{ChangePasswordDto, CreateUserDto, UpdateUserDto, User};

use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;
use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service;

// Маршруты ниже (кроме смены пароля) закрыты require_admin

pub async fn list(_user: CurrentUser) -> ServiceResult<Json<Vec<User>>> {
    let db = get_connection()?;
    Ok(Json(service::list_all(db).await?))
}

pub async fn get_by_id(_user: CurrentUser, Path(id): Path<String>) -> ServiceResult<Json<User>> {
    let db = get_connection()?;
    Ok(Json(service::get_by_id(db, &id).await?))
}

pub async fn create(
    CurrentUser(claims): CurrentUser,
    Json(dto): Json<CreateUserDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    let db = get_connection()?;
    let id = service::create(db, dto, Some(claims.sub)).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}

pub async fn update(
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<UpdateUserDto>,
) -> ServiceResult<StatusCode> {
    dto.id = id;
    let db = get_connection()?;
    service::update(db, dto).await?;
    Ok(StatusCode::OK)
}

pub async fn delete(_user: CurrentUser, Path(id): Path<String>) -> ServiceResult<StatusCode> {
    let db = get_connection()?;
    service::delete(db, &id).await?;
    Ok(StatusCode::OK)
}

pub async fn change_password(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(mut dto): Json<ChangePasswordDto>,
) -> ServiceResult<StatusCode> {
    dto.user_id = id;
    let db = get_connection()?;
    service::change_password(db, dto, &claims.sub, claims.role).await?;
    Ok(StatusCode::OK)
}
