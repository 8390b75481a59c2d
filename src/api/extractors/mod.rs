/*!
 * Request extractors
 *
 * Responsibility:
 * - rejection を AppError に揃える (JSON / path / 認証主体)
 * - handler はここの型だけを受け取る
 */

mod json;
mod path;
mod principal;

pub use json::ApiJson;
pub use path::ApiPath;
pub use principal::CurrentPrincipal;
