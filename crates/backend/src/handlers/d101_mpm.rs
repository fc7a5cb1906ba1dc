use axum::{extract::Query, Json};
use contracts::dashboards::d101_mpm::{MpmRequest, MpmResponse};

use crate::dashboards::d101_mpm::service;
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;

/// GET /api/d101/mpm
pub async fn get_mpm(Query(request): Query<MpmRequest>) -> ServiceResult<Json<MpmResponse>> {
    let db = get_connection()?;
    Ok(Json(service::get_mpm(db, &request).await?))
}
