use axum::{
    extract::Query,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use contracts::dashboards::d100_bsc_scorecard::{BscScorecardRequest, BscScorecardResponse};

use crate::dashboards::d100_bsc_scorecard::{export, service};
use crate::shared::data::db::get_connection;
use crate::shared::error::ServiceResult;

/// GET /api/d100/bsc-scorecard
pub async fn get_scorecard(
    Query(request): Query<BscScorecardRequest>,
) -> ServiceResult<Json<BscScorecardResponse>> {
    let db = get_connection()?;
    Ok(Json(service::get_scorecard(db, &request).await?))
}

/// GET /api/d100/bsc-scorecard/export.csv
pub async fn export_csv(Query(request): Query<BscScorecardRequest>) -> ServiceResult<Response> {
    let db = get_connection()?;
    let card = service::get_scorecard(db, &request).await?;
    let body = export::scorecard_to_csv(&card)?;
    let disposition = format!("attachment; filename=\"bsc-scorecard-{}.csv\"", card.period);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
