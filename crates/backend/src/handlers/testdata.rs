use axum::Json;
use contracts::system::auth::Role;
use serde_json::json;

use crate::shared::data::db::get_connection;
use crate::shared::data::demo_seed;
use crate::shared::error::ServiceResult;
use crate::system::auth::extractor::CurrentUser;

/// POST /api/testdata
pub async fn insert_test_data(user: CurrentUser) -> ServiceResult<Json<serde_json::Value>> {
    user.require(Role::is_admin, "load demo data")?;
    let db = get_connection()?;
    let seeded = demo_seed::seed_if_empty(db).await?;
    Ok(Json(json!({ "success": true, "seeded": seeded })))
}
