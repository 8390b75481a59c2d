/*
 * Responsibility
 * - DTO の宣言的な形式チェック (validate) の共通 trait
 * - 失敗は FieldError の一覧として返し、ApiJson が VALIDATION_ERROR に変換する
 */
use serde_json::Value;

use crate::error::FieldError;

pub trait Validate {
    fn validate(&self) -> Result<(), Vec<FieldError>>;
}

/// Collects field errors while checking a DTO.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure echoing `rejected`. A JSON null is treated as no value.
    pub fn check(&mut self, ok: bool, field: &str, reason: &str, rejected: impl Into<Value>) {
        if !ok {
            let rejected = Some(rejected.into()).filter(|v| !v.is_null());
            self.0.push(FieldError::new(field, reason, rejected));
        }
    }

    /// Records a failure without echoing the value (secrets).
    pub fn require(&mut self, ok: bool, field: &str, reason: &str) {
        if !ok {
            self.0.push(FieldError::new(field, reason, None));
        }
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() { Ok(()) } else { Err(self.0) }
    }
}
