pub mod catalog;
pub mod dropper;
pub mod provisioner;
pub mod script;
pub mod template;

pub use catalog::CatalogService;
pub use dropper::DropService;
pub use provisioner::{ProvisionService, TestOutcome};
pub use script::{parse_key_values, substitute_param, HandlerScript};
pub use template::{FunctionSignature, Ident, Statement};

use crate::error::AppResult;
use crate::models::ExecutedStatement;
use crate::session::WarehouseSession;

/// Run one statement and keep the status the warehouse reported for it
pub async fn execute_statement(
    session: &dyn WarehouseSession,
    statement: &Statement,
) -> AppResult<ExecutedStatement> {
    let sql = statement.to_string();
    let kind = statement.kind();
    let name = statement.object_name();

    tracing::info!(kind = kind.label(), name = %name, "Executing statement");
    let result = session.execute(&sql).await?;

    Ok(ExecutedStatement {
        kind,
        name,
        sql: statement.redacted(),
        status: result.first_value().map(str::to_string),
    })
}
