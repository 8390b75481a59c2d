/*
 * Responsibility
 * - API の公開点 (routes() の re-export)
 * - handler / DTO / extractor / validation をまとめる
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;
pub mod validation;

pub use routes::routes;
