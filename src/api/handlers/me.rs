use axum::Json;

use crate::api::dto::demo::MeResponse;
use crate::api::extractors::CurrentPrincipal;

/// Current principal as seen by handlers, supplemental roles included.
pub async fn me(CurrentPrincipal(principal): CurrentPrincipal) -> Json<MeResponse> {
    let roles = principal.role_list();
    Json(MeResponse {
        username: principal.subject,
        roles,
    })
}
