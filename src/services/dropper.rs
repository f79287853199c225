use crate::error::{AppError, AppResult};
use crate::models::{ExecutedStatement, ObjectNames, FUNCTION_PREFIX};
use crate::services::execute_statement;
use crate::services::template::{FunctionSignature, Ident, Statement};
use crate::session::WarehouseSession;

pub struct DropService;

impl DropService {
    /// `DROP FUNCTION` for the signature, followed by the network rule, secret
    /// and integration when `clean_dependencies` is set.
    ///
    /// Dependent names are rebuilt from the function name alone; nothing checks
    /// that those objects were created for this function.
    pub fn plan(signature: &str, clean_dependencies: bool) -> AppResult<Vec<Statement>> {
        let signature = FunctionSignature::parse(signature)?;
        let function = signature.name.as_str();

        if !function.to_ascii_uppercase().starts_with(FUNCTION_PREFIX) {
            tracing::warn!(function, "Function name lacks the API_ prefix");
        }

        let names = ObjectNames::from_function_name(function).ok_or_else(|| {
            AppError::Validation(format!(
                "Function name '{}' is too short to derive its dependencies",
                function
            ))
        })?;

        let mut statements = vec![Statement::DropFunction(signature)];

        if clean_dependencies {
            statements.push(Statement::DropNetworkRule(Ident::new(&names.network_rule)?));
            if let Some(secret) = &names.secret {
                statements.push(Statement::DropSecret(Ident::new(secret)?));
            }
            statements.push(Statement::DropIntegration(Ident::new(&names.integration)?));
        }

        Ok(statements)
    }

    pub async fn drop_api(
        session: &dyn WarehouseSession,
        signature: &str,
        clean_dependencies: bool,
    ) -> AppResult<Vec<ExecutedStatement>> {
        let statements = Self::plan(signature, clean_dependencies)?;

        let mut executed = Vec::with_capacity(statements.len());
        for statement in &statements {
            executed.push(execute_statement(session, statement).await?);
        }

        tracing::info!(signature, dropped = executed.len(), "API function dropped");
        Ok(executed)
    }
}
