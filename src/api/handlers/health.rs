/*
 * Responsibility
 * - 死活確認 (public)
 */
pub async fn health() -> &'static str {
    "ok"
}
