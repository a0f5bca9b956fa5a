use std::net::SocketAddr;

use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    attendance,
    auth::{
        self,
        middleware::{authenticate, require_roles, RoleSet},
    },
    state::AppState,
    students,
};

async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Attendance System API is running",
    }))
}

pub fn build_app(state: AppState) -> Router {
    let admin = Router::new()
        .merge(students::handlers::admin_routes())
        .route_layer(middleware::from_fn_with_state(RoleSet::ADMIN, require_roles));

    let super_admin = Router::new()
        .merge(auth::handlers::super_admin_routes())
        .merge(students::handlers::super_admin_routes())
        .route_layer(middleware::from_fn_with_state(RoleSet::SUPER_ADMIN, require_roles));

    let protected = Router::new()
        .merge(auth::handlers::profile_routes())
        .merge(attendance::handlers::routes())
        .nest("/admin", admin)
        .nest("/super-admin", super_admin)
        .route_layer(middleware::from_fn_with_state(state.keys.clone(), authenticate));

    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .route("/health", get(health))
                .merge(auth::handlers::auth_routes())
                .merge(protected),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
