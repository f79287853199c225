use serde::Serialize;
use utoipa::ToSchema;

/// Kind of warehouse object a statement creates, drops or queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    NetworkRule,
    Secret,
    Integration,
    Function,
    Query,
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::NetworkRule => "Network Rule",
            ObjectKind::Secret => "Secret",
            ObjectKind::Integration => "External Integration",
            ObjectKind::Function => "Function",
            ObjectKind::Query => "Query",
        }
    }
}

/// One statement sent to the warehouse, with the status it reported back
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedStatement {
    pub kind: ObjectKind,
    pub name: String,
    pub sql: String,
    pub status: Option<String>,
}
