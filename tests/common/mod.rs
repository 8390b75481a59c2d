#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use guarded_api::app::{build_router, build_state};
use guarded_api::config::Config;
use guarded_api::services::auth::TokenService;
use guarded_api::services::users::InMemoryUserDirectory;

// base64 of SECRET
pub const SECRET_B64: &str = "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=";
pub const SECRET: &[u8] = b"01234567890123456789012345678901";
pub const ISSUER: &str = "guarded-api-test";

pub fn config_with(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("AUTH_JWT_SECRET".to_string(), SECRET_B64.to_string()),
        ("AUTH_ISSUER".to_string(), ISSUER.to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn app() -> Router {
    app_with(&[])
}

pub fn app_with(extra: &[(&str, &str)]) -> Router {
    app_with_users(extra, InMemoryUserDirectory::seeded())
}

pub fn app_with_users(extra: &[(&str, &str)], users: InMemoryUserDirectory) -> Router {
    let config = config_with(extra);
    let state = build_state(&config, Arc::new(users)).unwrap();
    build_router(state, &config)
}

pub fn tokens() -> TokenService {
    TokenService::new(SECRET, ISSUER, 3600).unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn get_as(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(res: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

pub fn request_id(res: &Response<Body>) -> String {
    res.headers()["x-request-id"].to_str().unwrap().to_string()
}

/// Logs in through the HTTP endpoint and returns the access token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let res = send(
        app,
        post_json(
            "/auth/login",
            &serde_json::json!({ "username": username, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(res.status(), 200, "login as {username} failed");
    let body = body_json(res).await;
    body["data"]["accessToken"].as_str().unwrap().to_string()
}
