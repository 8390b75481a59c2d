/*
 * Responsibility
 * - デモ endpoint の request / response DTO
 */
use serde::{Deserialize, Serialize};

use crate::api::validation::{Validate, Violations};
use crate::error::FieldError;

#[derive(Debug, Deserialize)]
pub struct EchoRequest {
    pub user_name: String,
    pub age: Option<i64>,
}

impl Validate for EchoRequest {
    fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Violations::new();
        v.check(
            !self.user_name.trim().is_empty(),
            "user_name",
            "must not be blank",
            self.user_name.as_str(),
        );
        v.check(
            self.user_name.chars().count() <= 32,
            "user_name",
            "must be <= 32 chars",
            self.user_name.as_str(),
        );
        if let Some(age) = self.age {
            v.check((0..=150).contains(&age), "age", "must be between 0 and 150", age);
        }
        v.finish()
    }
}

#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub user_name: String,
    pub age: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PublicJson {
    pub user_name: &'static str,
    pub visibility: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub owner: String,
    pub viewed_by: String,
}
