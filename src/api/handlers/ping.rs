/*
 * Responsibility
 * - ロール表の確認用 endpoint
 *   - /api/public/ping : 誰でも
 *   - /api/user/ping   : USER or ADMIN
 *   - /api/admin/ping  : ADMIN
 */
use axum::Json;

use crate::api::dto::demo::PublicJson;

pub async fn public_ping() -> &'static str {
    "public ok"
}

pub async fn public_json() -> Json<PublicJson> {
    Json(PublicJson {
        user_name: "guest",
        visibility: "public",
    })
}

pub async fn user_ping() -> &'static str {
    "user ok"
}

pub async fn admin_ping() -> &'static str {
    "admin ok"
}
