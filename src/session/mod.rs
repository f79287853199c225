pub mod dry_run;
pub mod memory_session;
pub mod sql_api;

pub use dry_run::DryRunSession;
pub use memory_session::InMemorySession;
pub use sql_api::SqlApiSession;

use async_trait::async_trait;

use crate::error::AppResult;

/// Rows returned by the warehouse; every cell arrives as a nullable string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    /// Single-column result, the shape DDL statements report their status in
    pub fn status(message: &str) -> Self {
        Self {
            columns: vec!["status".to_string()],
            rows: vec![vec![Some(message.to_string())]],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column lookup is case-insensitive, unquoted identifiers come back upper-cased
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// First cell of the first row
    pub fn first_value(&self) -> Option<&str> {
        self.rows.first()?.first()?.as_deref()
    }
}

/// Session gateway to the warehouse.
///
/// Implementations execute one statement per call and fail with
/// `AppError::RemoteExecution` on any warehouse-side error.
#[async_trait]
pub trait WarehouseSession: Send + Sync {
    async fn execute(&self, sql: &str) -> AppResult<ResultSet>;
}
