use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a004_period::{Period, PeriodDto, PeriodTransitionDto};
use contracts::domain::common::AggregateId;
use contracts::system::auth::Role;
use serde_json::json;

use crate::domain::a004_period;
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;
use crate::system::auth::extractor::CurrentUser;

/// GET /api/a004/period
pub async fn list_all() -> ServiceResult<Json<Vec<Period>>> {
    let db = get_connection()?;
    Ok(Json(a004_period::service::list_all(db).await?))
}

/// GET /api/a004/period/active
pub async fn active() -> ServiceResult<Json<Option<Period>>> {
    let db = get_connection()?;
    Ok(Json(a004_period::service::active_period(db).await?))
}

/// GET /api/a004/period/:id
pub async fn get_by_id(Path(id): Path<String>) -> ServiceResult<Json<Period>> {
    let db = get_connection()?;
    Ok(Json(a004_period::service::get_by_id(db, &id).await?))
}

/// POST /api/a004/period
pub async fn upsert(
    user: CurrentUser,
    Json(dto): Json<PeriodDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    user.require(Role::can_manage_periods, "manage periods")?;
    let db = get_connection()?;
    let id = a004_period::service::upsert(db, dto).await?;
    Ok(Json(json!({ "id": id.as_string() })))
}

/// POST /api/a004/period/:id/transition
pub async fn transition(
    user: CurrentUser,
    Path(id): Path<String>,
    Json(dto): Json<PeriodTransitionDto>,
) -> ServiceResult<Json<Period>> {
    user.require(Role::can_manage_periods, "change period status")?;
    let db = get_connection()?;
    Ok(Json(a004_period::service::transition(db, &id, dto.status).await?))
}

/// DELETE /api/a004/period/:id
pub async fn delete(user: CurrentUser, Path(id): Path<String>) -> ServiceResult<StatusCode> {
    user.require(Role::can_manage_periods, "delete periods")?;
    let db = get_connection()?;
    a004_period::service::delete(db, &id).await?;
    Ok(StatusCode::OK)
}
