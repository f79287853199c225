use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::{ExecutedStatement, ObjectKind};

/// One warehouse object touched by a request
#[derive(Debug, Serialize, ToSchema)]
pub struct StatementResponse {
    pub kind: ObjectKind,
    pub name: String,
    /// Executed SQL, secret values masked
    pub sql: String,
    /// Status row reported by the warehouse
    pub status: Option<String>,
    pub message: String,
}

impl StatementResponse {
    /// `verb` completes the confirmation, e.g. "created" or "dropped"
    pub fn from_executed(executed: ExecutedStatement, verb: &str) -> Self {
        let message = format!(
            "{} '{}' {} successfully",
            executed.kind.label(),
            executed.name,
            verb
        );

        Self {
            kind: executed.kind,
            name: executed.name,
            sql: executed.sql,
            status: executed.status,
            message,
        }
    }
}

/// Reject empty (or whitespace-only) form fields before anything reaches the warehouse
pub fn validate_required(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Missing {}", field)));
    }
    Ok(())
}

/// Optional fields count as absent when empty
pub fn validate_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
