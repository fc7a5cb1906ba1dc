use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a002_team_action_plan::{TeamActionPlan, TeamActionPlanDto, TeamAllocationReport};
use contracts::domain::common::AggregateId;
use contracts::shared::list_query::ListFilter;
use contracts::system::auth::Role;
use serde::Deserialize;
use serde_json::json;

use crate::domain::a002_team_action_plan;
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;
use crate::system::auth::extractor::CurrentUser;

#[derive(Debug, Default, Deserialize)]
pub struct TeamPlanListParams {
    pub kpi_ref: Option<String>,
    pub search: Option<String>,
}

/// GET /api/a002/team-action-plan?kpi_ref=&search=
pub async fn list(Query(params): Query<TeamPlanListParams>) -> ServiceResult<Json<Vec<TeamActionPlan>>> {
    let db = get_connection()?;
    let filter = ListFilter {
        search: params.search,
        ..Default::default()
    };
    let plans = a002_team_action_plan::service::list(db, params.kpi_ref.as_deref(), &filter).await?;
    Ok(Json(plans))
}

/// GET /api/a002/team-action-plan/:id
pub async fn get_by_id(Path(id): Path<String>) -> ServiceResult<Json<TeamActionPlan>> {
    let db = get_connection()?;
    Ok(Json(a002_team_action_plan::service::get_by_id(db, &id).await?))
}

/// GET /api/a002/team-action-plan/allocation/:kpi_id
pub async fn allocation_report(Path(kpi_id): Path<String>) -> ServiceResult<Json<TeamAllocationReport>> {
    let db = get_connection()?;
    Ok(Json(a002_team_action_plan::service::allocation_report(db, &kpi_id).await?))
}

/// POST /api/a002/team-action-plan
pub async fn upsert(
    user: CurrentUser,
    Json(dto): Json<TeamActionPlanDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    user.require(Role::can_edit_kpi, "edit team action plans")?;
    let db = get_connection()?;
    let id = a002_team_action_plan::service::upsert(db, dto).await?;
    Ok(Json(json!({ "id": id.as_string() })))
}

/// DELETE /api/a002/team-action-plan/:id
pub async fn delete(user: CurrentUser, Path(id): Path<String>) -> ServiceResult<StatusCode> {
    user.require(Role::can_edit_kpi, "delete team action plans")?;
    let db = get_connection()?;
    a002_team_action_plan::service::delete(db, &id).await?;
    Ok(StatusCode::OK)
}
