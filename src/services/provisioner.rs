use serde::Serialize;

use crate::error::AppResult;
use crate::models::{ApiDefinition, ExecutedStatement, HttpMethod, ObjectNames, TestInput};
use crate::services::execute_statement;
use crate::services::template::{render_create_statements, render_test_query, Statement, TEST_COLUMN};
use crate::session::WarehouseSession;

/// Result of calling a generated UDF once
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub function: String,
    pub sql: String,
    /// One entry per returned row, decoded from the VARIANT the UDF returns
    pub responses: Vec<serde_json::Value>,
}

/// Create and test buttons of the catalog
pub struct ProvisionService;

impl ProvisionService {
    /// Statements the create button would run, in order
    pub fn plan(definition: &ApiDefinition) -> AppResult<Vec<Statement>> {
        render_create_statements(definition)
    }

    /// Render every statement first, then run them one after the other.
    ///
    /// Stops at the first failing statement; objects created before it are
    /// left in place.
    pub async fn create(
        session: &dyn WarehouseSession,
        definition: &ApiDefinition,
    ) -> AppResult<Vec<ExecutedStatement>> {
        let statements = Self::plan(definition)?;

        let mut executed = Vec::with_capacity(statements.len());
        for statement in &statements {
            executed.push(execute_statement(session, statement).await?);
        }

        tracing::info!(
            function = %definition.names().function,
            objects = executed.len(),
            "API function created"
        );

        Ok(executed)
    }

    /// Call `API_<base>` with the test inputs and decode what it returns
    pub async fn test(
        session: &dyn WarehouseSession,
        base_name: &str,
        method: HttpMethod,
        has_param: bool,
        input: &TestInput,
    ) -> AppResult<TestOutcome> {
        let function = ObjectNames::from_base(base_name, false).function;
        let statement = render_test_query(&function, method, has_param, input)?;
        let sql = statement.to_string();

        let result = session.execute(&sql).await?;

        let responses = match result.column_index(TEST_COLUMN) {
            Some(index) => result
                .rows
                .iter()
                .map(|row| decode_variant(row.get(index).and_then(|cell| cell.as_deref())))
                .collect(),
            None => Vec::new(),
        };

        tracing::info!(function = %function, rows = responses.len(), "API function tested");

        Ok(TestOutcome {
            function,
            sql,
            responses,
        })
    }
}

/// VARIANT cells arrive as JSON text; anything else is kept as a plain string
fn decode_variant(cell: Option<&str>) -> serde_json::Value {
    match cell {
        None => serde_json::Value::Null,
        Some(text) => serde_json::from_str(text)
            .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
    }
}
