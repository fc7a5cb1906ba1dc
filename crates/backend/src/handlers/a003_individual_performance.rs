use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_kpi::ActualEntryDto;
use contracts::domain::a003_individual_performance::{IndividualPerformance, IndividualPerformanceDto};
use contracts::domain::common::AggregateId;
use contracts::enums::PerformanceStatus;
use contracts::shared::aggregation::AllocationCheck;
use contracts::shared::list_query::ListFilter;
use contracts::system::auth::Role;
use serde::Deserialize;
use serde_json::json;

use crate::domain::a003_individual_performance;
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;
use crate::system::auth::extractor::CurrentUser;

#[derive(Debug, Default, Deserialize)]
pub struct IndividualListParams {
    pub team_plan_ref: Option<String>,
    pub search: Option<String>,
    pub status: Option<PerformanceStatus>,
}

/// GET /api/a003/individual-performance?team_plan_ref=&search=&status=
pub async fn list(
    Query(params): Query<IndividualListParams>,
) -> ServiceResult<Json<Vec<IndividualPerformance>>> {
    let db = get_connection()?;
    let filter = ListFilter {
        search: params.search,
        status: params.status,
        ..Default::default()
    };
    let entries =
        a003_individual_performance::service::list(db, params.team_plan_ref.as_deref(), &filter).await?;
    Ok(Json(entries))
}

/// GET /api/a003/individual-performance/:id
pub async fn get_by_id(Path(id): Path<String>) -> ServiceResult<Json<IndividualPerformance>> {
    let db = get_connection()?;
    Ok(Json(a003_individual_performance::service::get_by_id(db, &id).await?))
}

/// GET /api/a003/individual-performance/allocation/:team_plan_id
pub async fn allocation_check(Path(team_plan_id): Path<String>) -> ServiceResult<Json<AllocationCheck>> {
    let db = get_connection()?;
    Ok(Json(
        a003_individual_performance::service::allocation_check(db, &team_plan_id).await?,
    ))
}

/// POST /api/a003/individual-performance
pub async fn upsert(
    user: CurrentUser,
    Json(dto): Json<IndividualPerformanceDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    user.require(Role::can_edit_kpi, "edit individual performance")?;
    let db = get_connection()?;
    let id = a003_individual_performance::service::upsert(db, dto).await?;
    Ok(Json(json!({ "id": id.as_string() })))
}

/// POST /api/a003/individual-performance/:id/actual
pub async fn enter_actual(
    user: CurrentUser,
    Path(id): Path<String>,
    Json(entry): Json<ActualEntryDto>,
) -> ServiceResult<Json<IndividualPerformance>> {
    user.require(Role::can_enter_actuals, "enter actuals")?;
    let db = get_connection()?;
    Ok(Json(
        a003_individual_performance::service::enter_actual(db, &id, entry).await?,
    ))
}

/// DELETE /api/a003/individual-performance/:id
pub async fn delete(user: CurrentUser, Path(id): Path<String>) -> ServiceResult<StatusCode> {
    user.require(Role::can_edit_kpi, "delete individual performance")?;
    let db = get_connection()?;
    a003_individual_performance::service::delete(db, &id).await?;
    Ok(StatusCode::OK)
}
