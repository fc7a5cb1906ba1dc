use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a005_employee::{ApprovalCheck, Employee, EmployeeDto};
use contracts::domain::common::AggregateId;
use contracts::shared::list_query::{ListFilter, ListState, Page};
use contracts::system::auth::Role;
use serde::Deserialize;
use serde_json::json;

use crate::domain::a005_employee;
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;
use crate::system::auth::extractor::CurrentUser;

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeListParams {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// GET /api/a005/employee
pub async fn list(Query(params): Query<EmployeeListParams>) -> ServiceResult<Json<Page<Employee>>> {
    let db = get_connection()?;
    let filter = ListFilter {
        search: params.search,
        ..Default::default()
    };
    let state = ListState::from_request(filter, params.page, params.page_size);
    Ok(Json(a005_employee::service::list(db, &state).await?))
}

/// GET /api/a005/employee/:id
pub async fn get_by_id(Path(id): Path<String>) -> ServiceResult<Json<Employee>> {
    let db = get_connection()?;
    Ok(Json(a005_employee::service::get_by_id(db, &id).await?))
}

/// GET /api/a005/employee/:id/can-approve/:target_id
pub async fn can_approve(
    Path((id, target_id)): Path<(String, String)>,
) -> ServiceResult<Json<ApprovalCheck>> {
    let db = get_connection()?;
    Ok(Json(a005_employee::service::can_approve(db, &id, &target_id).await?))
}

/// POST /api/a005/employee
pub async fn upsert(
    user: CurrentUser,
    Json(dto): Json<EmployeeDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    user.require(Role::can_manage_employees, "manage employees")?;
    let db = get_connection()?;
    let id = a005_employee::service::upsert(db, dto).await?;
    Ok(Json(json!({ "id": id.as_string() })))
}

/// DELETE /api/a005/employee/:id
pub async fn delete(user: CurrentUser, Path(id): Path<String>) -> ServiceResult<StatusCode> {
    user.require(Role::can_manage_employees, "delete employees")?;
    let db = get_connection()?;
    a005_employee::service::delete(db, &id).await?;
    Ok(StatusCode::OK)
}
