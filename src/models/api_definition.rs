use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Prefix of every generated UDF; the catalog lister filters on it
pub const FUNCTION_PREFIX: &str = "API_";
pub const NETWORK_RULE_PREFIX: &str = "network_";
pub const SECRET_PREFIX: &str = "secret_";
pub const INTEGRATION_PREFIX: &str = "integration_";

/// Placeholder a parametrized URL carries (at most one)
pub const URL_PARAM_PLACEHOLDER: &str = "{param}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// User-described HTTP API, built from the create form
#[derive(Debug, Clone)]
pub struct ApiDefinition {
    /// Base identifier, without the `API_` prefix
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    /// Bearer token; present only when the API needs a secret
    pub secret: Option<String>,
    pub has_url_param: bool,
}

impl ApiDefinition {
    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub fn names(&self) -> ObjectNames {
        ObjectNames::from_base(&self.name, self.has_secret())
    }
}

/// Inputs of the test button: the arguments passed to the generated UDF
#[derive(Debug, Clone, Default)]
pub struct TestInput {
    pub parameter: String,
    pub header: String,
    pub body: String,
}

/// Names of the warehouse objects generated for one API.
///
/// Every name derives from the same base identifier, so the dropper can
/// rebuild the dependent names from the function name alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    pub network_rule: String,
    pub secret: Option<String>,
    pub integration: String,
    pub function: String,
}

impl ObjectNames {
    pub fn from_base(base: &str, has_secret: bool) -> Self {
        Self {
            network_rule: format!("{NETWORK_RULE_PREFIX}{base}"),
            secret: has_secret.then(|| format!("{SECRET_PREFIX}{base}")),
            integration: format!("{INTEGRATION_PREFIX}{base}"),
            function: format!("{FUNCTION_PREFIX}{base}"),
        }
    }

    /// Rebuild the names from a generated function name by removing its
    /// 4-character prefix. Returns `None` when nothing is left afterwards.
    pub fn from_function_name(function: &str) -> Option<Self> {
        let (_, base) = function.split_at_checked(FUNCTION_PREFIX.len())?;
        if base.is_empty() {
            return None;
        }

        Some(Self {
            function: function.to_string(),
            ..Self::from_base(base, true)
        })
    }
}
