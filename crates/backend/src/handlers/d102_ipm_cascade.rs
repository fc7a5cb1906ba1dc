use axum::{
    extract::{Path, Query},
    Json,
};
use contracts::dashboards::d102_ipm_cascade::{
    CompanyCascadeResponse, IpmCascadeRequest, IpmCascadeResponse,
};

use crate::dashboards::d102_ipm_cascade::service;
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;

/// GET /api/d102/ipm-cascade/:kpi_id
pub async fn get_cascade(
    Path(kpi_id): Path<String>,
    Query(request): Query<IpmCascadeRequest>,
) -> ServiceResult<Json<IpmCascadeResponse>> {
    let db = get_connection()?;
    Ok(Json(service::get_cascade(db, &kpi_id, &request).await?))
}

/// GET /api/d102/ipm-cascade
pub async fn get_company_cascade(
    Query(request): Query<IpmCascadeRequest>,
) -> ServiceResult<Json<CompanyCascadeResponse>> {
    let db = get_connection()?;
    Ok(Json(service::get_company_cascade(db, &request).await?))
}
