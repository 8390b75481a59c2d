/*
 * Responsibility
 * - error taxonomy / envelope の各経路を実際に通すための endpoint
 * - ok / entity-not-found / data-integrity / internal / panic / validation / typed path
 * - handler 内部からの認可拒否 (所有者か ADMIN 以外は ACCESS_DENIED)
 * - HTML・バイナリ (wrap されない) と 201 + Location (header 保持)
 */
use axum::{
    Json,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};

use crate::api::dto::demo::{EchoRequest, EchoResponse, ItemResponse, ReportResponse};
use crate::api::extractors::{ApiJson, ApiPath, CurrentPrincipal};
use crate::error::AppError;

const MAX_ITEM_ID: u64 = 1000;

pub async fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "fine" }))
}

pub async fn entity() -> Result<Json<ItemResponse>, AppError> {
    Err(AppError::EntityNotFound("Item 42 does not exist.".into()))
}

pub async fn integrity() -> Result<StatusCode, AppError> {
    Err(AppError::DataIntegrity(
        "duplicate key value violates unique constraint \"items_name_key\"".into(),
    ))
}

pub async fn server_error() -> Result<StatusCode, AppError> {
    Err(AppError::internal(
        "connection reset by peer while talking to inventory backend",
    ))
}

pub async fn panics() -> &'static str {
    panic!("demo panic")
}

pub async fn echo(ApiJson(req): ApiJson<EchoRequest>) -> Json<EchoResponse> {
    Json(EchoResponse {
        user_name: req.user_name,
        age: req.age,
    })
}

pub async fn item(ApiPath(id): ApiPath<u64>) -> Result<Json<ItemResponse>, AppError> {
    if id == 0 || id > MAX_ITEM_ID {
        return Err(AppError::EntityNotFound(format!("Item {id} does not exist.")));
    }
    Ok(Json(ItemResponse {
        id,
        name: format!("item-{id}"),
    }))
}

// Owner or ADMIN only.
pub async fn report(
    CurrentPrincipal(principal): CurrentPrincipal,
    ApiPath(owner): ApiPath<String>,
) -> Result<Json<ReportResponse>, AppError> {
    if principal.subject != owner && !principal.roles.contains("ADMIN") {
        tracing::warn!(subject = %principal.subject, owner = %owner, "report access denied");
        return Err(AppError::AccessDenied);
    }
    Ok(Json(ReportResponse {
        owner,
        viewed_by: principal.subject,
    }))
}

pub async fn page() -> Html<&'static str> {
    Html("<!doctype html><html><body><h1>demo</h1></body></html>")
}

pub async fn download() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"demo.bin\""),
        ],
        vec![0xde_u8, 0xad, 0xbe, 0xef],
    )
}

pub async fn created() -> impl IntoResponse {
    (
        StatusCode::CREATED,
        [(header::LOCATION, "/api/demo/items/7")],
        Json(ItemResponse {
            id: 7,
            name: "item-7".into(),
        }),
    )
}
