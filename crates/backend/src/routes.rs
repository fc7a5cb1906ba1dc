use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, system};

/// Роуты бизнес-данных; все требуют авторизации,
/// изменяющие дополнительно проверяют право роли в обработчике
fn business_routes() -> Router {
    Router::new()
        // ========================================
        // A001 KPI
        // ========================================
        .route(
            "/api/a001/kpi",
            get(handlers::a001_kpi::list).post(handlers::a001_kpi::upsert),
        )
        .route(
            "/api/a001/kpi/:id",
            get(handlers::a001_kpi::get_by_id).delete(handlers::a001_kpi::delete),
        )
        .route("/api/a001/kpi/:id/actual", post(handlers::a001_kpi::enter_actual))
        .route("/api/a001/kpi/:id/notes", post(handlers::a001_kpi::update_notes))
        // ========================================
        // A002 TEAM ACTION PLAN
        // ========================================
        .route(
            "/api/a002/team-action-plan",
            get(handlers::a002_team_action_plan::list).post(handlers::a002_team_action_plan::upsert),
        )
        .route(
            "/api/a002/team-action-plan/allocation/:kpi_id",
            get(handlers::a002_team_action_plan::allocation_report),
        )
        .route(
            "/api/a002/team-action-plan/:id",
            get(handlers::a002_team_action_plan::get_by_id)
                .delete(handlers::a002_team_action_plan::delete),
        )
        // ========================================
        // A003 INDIVIDUAL PERFORMANCE
        // ========================================
        .route(
            "/api/a003/individual-performance",
            get(handlers::a003_individual_performance::list)
                .post(handlers::a003_individual_performance::upsert),
        )
        .route(
            "/api/a003/individual-performance/allocation/:team_plan_id",
            get(handlers::a003_individual_performance::allocation_check),
        )
        .route(
            "/api/a003/individual-performance/:id",
            get(handlers::a003_individual_performance::get_by_id)
                .delete(handlers::a003_individual_performance::delete),
        )
        .route(
            "/api/a003/individual-performance/:id/actual",
            post(handlers::a003_individual_performance::enter_actual),
        )
        // ========================================
        // A004 PERIOD
        // ========================================
        .route(
            "/api/a004/period",
            get(handlers::a004_period::list_all).post(handlers::a004_period::upsert),
        )
        .route("/api/a004/period/active", get(handlers::a004_period::active))
        .route(
            "/api/a004/period/:id",
            get(handlers::a004_period::get_by_id).delete(handlers::a004_period::delete),
        )
        .route(
            "/api/a004/period/:id/transition",
            post(handlers::a004_period::transition),
        )
        // ========================================
        // A005 EMPLOYEE
        // ========================================
        .route(
            "/api/a005/employee",
            get(handlers::a005_employee::list).post(handlers::a005_employee::upsert),
        )
        .route(
            "/api/a005/employee/:id",
            get(handlers::a005_employee::get_by_id).delete(handlers::a005_employee::delete),
        )
        .route(
            "/api/a005/employee/:id/can-approve/:target_id",
            get(handlers::a005_employee::can_approve),
        )
        // ========================================
        // DASHBOARDS
        // ========================================
        .route(
            "/api/d100/bsc-scorecard",
            get(handlers::d100_bsc_scorecard::get_scorecard),
        )
        .route(
            "/api/d100/bsc-scorecard/export.csv",
            get(handlers::d100_bsc_scorecard::export_csv),
        )
        .route("/api/d101/mpm", get(handlers::d101_mpm::get_mpm))
        .route(
            "/api/d102/ipm-cascade",
            get(handlers::d102_ipm_cascade::get_company_cascade),
        )
        .route(
            "/api/d102/ipm-cascade/:kpi_id",
            get(handlers::d102_ipm_cascade::get_cascade),
        )
        .route("/api/testdata", post(handlers::testdata::insert_test_data))
        .layer(middleware::from_fn(system::auth::middleware::require_auth))
}

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    system::routes::configure_system_routes().merge(business_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::auth::jwt::{cache_secret, encode_claims, new_claims};
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Method, Request, StatusCode},
    };
    use contracts::system::auth::Role;
    use tower::ServiceExt;

    fn bearer(role: Role) -> String {
        let secret = cache_secret("route-test-secret".into());
        let token = encode_claims(&new_claims("u-1", "alex", role), &secret).unwrap();
        format!("Bearer {}", token)
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        configure_routes().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_business_routes_require_token() {
        let request = Request::get("/api/a001/kpi").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);

        let request = Request::get("/api/d100/bsc-scorecard")
            .header(AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_staff_cannot_delete_kpi() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/a001/kpi/{}", uuid::Uuid::new_v4()))
            .header(AUTHORIZATION, bearer(Role::Staff))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_users_admin_only() {
        let request = Request::get("/api/system/users")
            .header(AUTHORIZATION, bearer(Role::Manager))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::FORBIDDEN);
    }
}
