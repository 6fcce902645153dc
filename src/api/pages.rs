use axum::{
    extract::{Path, Query},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CallerSession, SignedIn};
use crate::core::state::AppState;
use crate::schemas::session::{
    DashboardResponse, NavigationQuery, NavigationResponse, PlaceholderResponse,
};
use crate::services::navigation::{self, Route};
use crate::services::role_resolver::AuthState;

const COMING_SOON: &str = "Coming soon";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(session))
        .route("/navigation", get(navigation))
        .route("/dashboard", get(dashboard))
        .route("/test/:test_id", get(test_page))
        .route("/result/:test_id", get(result_page))
}

async fn session(CallerSession { auth, .. }: CallerSession) -> Json<AuthState> {
    Json(auth)
}

async fn navigation(
    Query(query): Query<NavigationQuery>,
    CallerSession { auth, .. }: CallerSession,
) -> Result<Json<NavigationResponse>, ApiError> {
    let route = Route::parse(&query.path)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown page '{}'", query.path)))?;
    let access = navigation::guard(route.requirement(), &auth);

    Ok(Json(NavigationResponse { path: query.path, access }))
}

async fn dashboard(SignedIn { identity, auth }: SignedIn) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        principal_id: identity.principal().to_string(),
        is_admin: auth.is_admin(),
    })
}

async fn test_page(Path(test_id): Path<String>) -> Json<PlaceholderResponse> {
    Json(PlaceholderResponse { page: "test", id: Some(test_id), message: COMING_SOON })
}

async fn result_page(Path(test_id): Path<String>) -> Json<PlaceholderResponse> {
    Json(PlaceholderResponse { page: "result", id: Some(test_id), message: COMING_SOON })
}

#[cfg(test)]
mod tests {
    use axum::http::{header, Method, StatusCode};
    use tower::ServiceExt;

    use crate::test_support::{self, ADMIN_PRINCIPAL, STUDENT_PRINCIPAL};

    #[tokio::test]
    async fn session_without_token_is_unauthenticated_student() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/session", None, None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["is_authenticated"], false);
        assert_eq!(body["principal_id"], serde_json::Value::Null);
        assert_eq!(body["role"], "student");
    }

    #[tokio::test]
    async fn session_resolves_admin_from_allow_list() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::bearer_token(ADMIN_PRINCIPAL, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/session", Some(&token), None))
            .await
            .expect("response");

        let body = test_support::read_json(response).await;
        assert_eq!(body["is_authenticated"], true);
        assert_eq!(body["principal_id"], ADMIN_PRINCIPAL);
        assert_eq!(body["role"], "admin");
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/session", Some("garbage"), None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn anonymous_principal_token_is_not_a_session() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::bearer_token("2vxsx-fae", ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/dashboard", Some(&token), None))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn navigation_reports_decision_for_path() {
        let ctx = test_support::setup_test_context().await;
        let token = test_support::bearer_token(STUDENT_PRINCIPAL, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/navigation?path=/admin/create-test",
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        let body = test_support::read_json(response).await;
        assert_eq!(body["access"], "redirect");
        assert_eq!(body["to"], "/dashboard");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/navigation?path=/dashboard",
                Some(&token),
                None,
            ))
            .await
            .expect("response");
        let body = test_support::read_json(response).await;
        assert_eq!(body["access"], "allow");
    }

    #[tokio::test]
    async fn placeholder_pages_are_served_where_navigation_points() {
        let ctx = test_support::setup_test_context().await;

        for (path, page) in [("/test/test-1", "test"), ("/result/test-1", "result")] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::GET,
                    &format!("/api/v1/navigation?path={path}"),
                    None,
                    None,
                ))
                .await
                .expect("response");
            assert_eq!(test_support::read_json(response).await["access"], "allow");

            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(Method::GET, &format!("/api/v1{path}"), None, None))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
            let body = test_support::read_json(response).await;
            assert_eq!(body["page"], page);
            assert_eq!(body["id"], "test-1");
            assert_eq!(body["message"], "Coming soon");
        }
    }
}
