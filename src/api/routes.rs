/*
 * Responsibility
 * - URL 構造を定義 (/health, /auth/login, /api/...)
 * - 未マッチ route は fallback で NOT_FOUND (認証より前に決まる)
 * - 認証・認可は middleware::apply で route_layer として掛ける
 *   (access stage が full path を見るため nest は使わない)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{auth, demo, health::health, me::me, ping};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/api/me", get(me))
        .route("/api/public/ping", get(ping::public_ping))
        .route("/api/public/json", get(ping::public_json))
        .route("/api/user/ping", get(ping::user_ping))
        .route("/api/admin/ping", get(ping::admin_ping))
        .merge(demo())
        .fallback(not_found)
}

fn demo() -> Router<AppState> {
    Router::new()
        .route("/api/demo/ok", get(demo::ok))
        .route("/api/demo/entity", get(demo::entity))
        .route("/api/demo/integrity", post(demo::integrity))
        .route("/api/demo/server-error", get(demo::server_error))
        .route("/api/demo/panic", get(demo::panics))
        .route("/api/demo/echo", post(demo::echo))
        .route("/api/demo/items/{id}", get(demo::item))
        .route("/api/demo/reports/{owner}", get(demo::report))
        .route("/api/demo/page", get(demo::page))
        .route("/api/demo/download", get(demo::download))
        .route("/api/demo/created", post(demo::created))
}

async fn not_found() -> AppError {
    AppError::RouteNotFound
}
