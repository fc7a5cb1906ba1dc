use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_kpi::{ActualEntryDto, Kpi, KpiDto, KpiNotesDto};
use contracts::domain::common::AggregateId;
use contracts::enums::{KpiCategory, PerformanceStatus, Perspective};
use contracts::shared::list_query::{ListFilter, ListState, Page};
use contracts::system::auth::Role;
use serde::Deserialize;
use serde_json::json;

use crate::domain::a001_kpi;
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;
use crate::system::auth::extractor::CurrentUser;

#[derive(Debug, Default, Deserialize)]
pub struct KpiListParams {
    pub search: Option<String>,
    pub perspective: Option<Perspective>,
    pub category: Option<KpiCategory>,
    pub status: Option<PerformanceStatus>,
    /// Месяц `YYYY-MM`, за который считается статус
    pub period: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl KpiListParams {
    fn list_state(&self) -> ListState {
        let filter = ListFilter {
            search: self.search.clone(),
            perspective: self.perspective,
            category: self.category,
            status: self.status,
            ..Default::default()
        };
        ListState::from_request(filter, self.page, self.page_size)
    }
}

/// GET /api/a001/kpi
pub async fn list(Query(params): Query<KpiListParams>) -> ServiceResult<Json<Page<Kpi>>> {
    let db = get_connection()?;
    let state = params.list_state();
    Ok(Json(
        a001_kpi::service::list(db, &state, params.period.as_deref()).await?,
    ))
}

/// GET /api/a001/kpi/:id
pub async fn get_by_id(Path(id): Path<String>) -> ServiceResult<Json<Kpi>> {
    let db = get_connection()?;
    Ok(Json(a001_kpi::service::get_by_id(db, &id).await?))
}

/// POST /api/a001/kpi
pub async fn upsert(
    user: CurrentUser,
    Json(dto): Json<KpiDto>,
) -> ServiceResult<Json<serde_json::Value>> {
    user.require(Role::can_edit_kpi, "edit KPIs")?;
    let db = get_connection()?;
    let id = a001_kpi::service::upsert(db, dto).await?;
    Ok(Json(json!({ "id": id.as_string() })))
}

/// DELETE /api/a001/kpi/:id
pub async fn delete(user: CurrentUser, Path(id): Path<String>) -> ServiceResult<StatusCode> {
    user.require(Role::can_edit_kpi, "delete KPIs")?;
    let db = get_connection()?;
    a001_kpi::service::delete(db, &id).await?;
    Ok(StatusCode::OK)
}

/// POST /api/a001/kpi/:id/actual
pub async fn enter_actual(
    user: CurrentUser,
    Path(id): Path<String>,
    Json(entry): Json<ActualEntryDto>,
) -> ServiceResult<Json<Kpi>> {
    user.require(Role::can_enter_actuals, "enter actuals")?;
    let db = get_connection()?;
    Ok(Json(a001_kpi::service::enter_actual(db, &id, entry).await?))
}

/// POST /api/a001/kpi/:id/notes
pub async fn update_notes(
    user: CurrentUser,
    Path(id): Path<String>,
    Json(notes): Json<KpiNotesDto>,
) -> ServiceResult<Json<Kpi>> {
    user.require(Role::can_enter_actuals, "edit KPI notes")?;
    let db = get_connection()?;
    Ok(Json(a001_kpi::service::update_notes(db, &id, notes).await?))
}
