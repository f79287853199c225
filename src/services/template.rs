use std::fmt;

use crate::error::{AppError, AppResult};
use crate::models::{
    ApiDefinition, HttpMethod, ObjectKind, TestInput, FUNCTION_PREFIX, URL_PARAM_PLACEHOLDER,
};
use crate::services::script::HandlerScript;

/// Column the test query aliases the UDF result to
pub const TEST_COLUMN: &str = "TEST";

/// Name of the secret binding inside the UDF body
pub const SECRET_BINDING: &str = "secret_variable";

const RUNTIME_VERSION: &str = "3.10";
const PACKAGES: &[&str] = &["snowflake-snowpark-python", "requests"];

/// Unquoted SQL identifier that is also a valid Python identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    pub fn new(raw: &str) -> AppResult<Self> {
        let mut chars = raw.chars();
        let valid = match chars.next() {
            Some(first) => {
                (first.is_ascii_alphabetic() || first == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };

        if !valid {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid identifier (letters, digits and underscores, not starting with a digit)",
                raw
            )));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single-quoted SQL string literal
pub struct Literal<'a>(pub &'a str);

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for c in self.0.chars() {
            match c {
                '\'' => f.write_str("''")?,
                '\\' => f.write_str("\\\\")?,
                _ => write!(f, "{}", c)?,
            }
        }
        f.write_str("'")
    }
}

/// `DROP FUNCTION` target: name plus argument types, e.g. `API_X(VARCHAR)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: Ident,
    pub arguments: String,
}

impl FunctionSignature {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim().trim_end_matches(';').trim_end();
        let invalid = || {
            AppError::Validation(format!(
                "'{}' is not a function signature such as API_TEST(VARCHAR)",
                raw
            ))
        };

        let (name, rest) = raw.split_once('(').ok_or_else(invalid)?;
        let arguments = rest.strip_suffix(')').ok_or_else(invalid)?;

        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | ' ' | '(' | ')');
        if !arguments.chars().all(allowed) || !balanced(arguments) {
            return Err(invalid());
        }

        Ok(Self {
            name: Ident::new(name.trim())?,
            arguments: arguments.trim().to_string(),
        })
    }
}

/// Nested parentheses only, e.g. `NUMBER(38, 0)`
fn balanced(arguments: &str) -> bool {
    let mut depth = 0usize;
    for c in arguments.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Parameter of the generated UDF, always a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param(pub &'static str);

/// Parameters for each shape of API: none, the URL parameter, or header and body text
pub fn function_params(method: HttpMethod, has_param: bool) -> Vec<Param> {
    match (method, has_param) {
        (HttpMethod::Get, false) => vec![],
        (HttpMethod::Get, true) => vec![Param("parameter")],
        (HttpMethod::Post, _) => vec![Param("headerParam"), Param("bodyParam")],
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDefinition {
    pub name: Ident,
    pub params: Vec<Param>,
    pub integration: Ident,
    pub secret: Option<Ident>,
    pub script: HandlerScript,
}

/// Every statement this service sends to the warehouse
#[derive(Debug, Clone)]
pub enum Statement {
    CreateNetworkRule { name: Ident, host: String },
    CreateSecret { name: Ident, token: String },
    CreateIntegration {
        name: Ident,
        network_rule: Ident,
        secret: Option<Ident>,
    },
    CreateFunction(Box<FunctionDefinition>),
    CallFunction { name: Ident, args: Vec<String> },
    ListFunctions { prefix: &'static str },
    DropFunction(FunctionSignature),
    DropNetworkRule(Ident),
    DropSecret(Ident),
    DropIntegration(Ident),
}

impl Statement {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Statement::CreateNetworkRule { .. } | Statement::DropNetworkRule(_) => {
                ObjectKind::NetworkRule
            }
            Statement::CreateSecret { .. } | Statement::DropSecret(_) => ObjectKind::Secret,
            Statement::CreateIntegration { .. } | Statement::DropIntegration(_) => {
                ObjectKind::Integration
            }
            Statement::CreateFunction(_) | Statement::DropFunction(_) => ObjectKind::Function,
            Statement::CallFunction { .. } | Statement::ListFunctions { .. } => ObjectKind::Query,
        }
    }

    /// Name of the object the statement targets
    pub fn object_name(&self) -> String {
        match self {
            Statement::CreateNetworkRule { name, .. }
            | Statement::CreateSecret { name, .. }
            | Statement::CreateIntegration { name, .. }
            | Statement::CallFunction { name, .. }
            | Statement::DropNetworkRule(name)
            | Statement::DropSecret(name)
            | Statement::DropIntegration(name) => name.to_string(),
            Statement::CreateFunction(function) => function.name.to_string(),
            Statement::DropFunction(signature) => signature.to_string(),
            Statement::ListFunctions { .. } => "INFORMATION_SCHEMA.FUNCTIONS".to_string(),
        }
    }

    /// SQL text safe to echo back or log: secret values are masked
    pub fn redacted(&self) -> String {
        match self {
            Statement::CreateSecret { name, .. } => Statement::CreateSecret {
                name: name.clone(),
                token: "********".to_string(),
            }
            .to_string(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateNetworkRule { name, host } => write!(
                f,
                "CREATE OR REPLACE NETWORK RULE {} MODE = EGRESS TYPE = HOST_PORT VALUE_LIST = ({})",
                name,
                Literal(host)
            ),
            Statement::CreateSecret { name, token } => write!(
                f,
                "CREATE OR REPLACE SECRET {} TYPE = GENERIC_STRING SECRET_STRING = {}",
                name,
                Literal(token)
            ),
            Statement::CreateIntegration {
                name,
                network_rule,
                secret,
            } => {
                writeln!(f, "CREATE OR REPLACE EXTERNAL ACCESS INTEGRATION {}", name)?;
                writeln!(f, "  ALLOWED_NETWORK_RULES = ({})", network_rule)?;
                match secret {
                    Some(secret) => writeln!(f, "  ALLOWED_AUTHENTICATION_SECRETS = ({})", secret)?,
                    None => writeln!(f, "  ALLOWED_AUTHENTICATION_SECRETS = ()")?,
                }
                write!(f, "  ENABLED = TRUE")
            }
            Statement::CreateFunction(function) => write_function(f, function),
            Statement::CallFunction { name, args } => {
                let args: Vec<String> = args.iter().map(|a| Literal(a).to_string()).collect();
                write!(f, "SELECT {}({}) AS {}", name, args.join(", "), TEST_COLUMN)
            }
            Statement::ListFunctions { prefix } => write!(
                f,
                "SELECT FUNCTION_NAME, ARGUMENT_SIGNATURE, TO_DATE(CREATED) AS CREATION_DATE \
                 FROM INFORMATION_SCHEMA.FUNCTIONS WHERE FUNCTION_NAME LIKE {}",
                Literal(&format!("{}%", prefix))
            ),
            Statement::DropFunction(signature) => {
                write!(f, "DROP FUNCTION IF EXISTS {}", signature)
            }
            Statement::DropNetworkRule(name) => write!(f, "DROP NETWORK RULE IF EXISTS {}", name),
            Statement::DropSecret(name) => write!(f, "DROP SECRET IF EXISTS {}", name),
            Statement::DropIntegration(name) => {
                write!(f, "DROP EXTERNAL ACCESS INTEGRATION IF EXISTS {}", name)
            }
        }
    }
}

fn write_function(f: &mut fmt::Formatter<'_>, function: &FunctionDefinition) -> fmt::Result {
    let params: Vec<String> = function
        .params
        .iter()
        .map(|Param(name)| format!("{} STRING", name))
        .collect();
    let packages: Vec<String> = PACKAGES.iter().map(|p| Literal(p).to_string()).collect();

    writeln!(
        f,
        "CREATE OR REPLACE FUNCTION {}({})",
        function.name,
        params.join(", ")
    )?;
    writeln!(f, "  RETURNS VARIANT")?;
    writeln!(f, "  LANGUAGE PYTHON")?;
    writeln!(f, "  RUNTIME_VERSION = {}", RUNTIME_VERSION)?;
    writeln!(f, "  HANDLER = {}", Literal(function.name.as_str()))?;
    writeln!(
        f,
        "  EXTERNAL_ACCESS_INTEGRATIONS = ({})",
        function.integration
    )?;
    if let Some(secret) = &function.secret {
        writeln!(f, "  SECRETS = ({} = {})", Literal(SECRET_BINDING), secret)?;
    }
    writeln!(f, "  PACKAGES = ({})", packages.join(", "))?;
    writeln!(f, "AS")?;
    writeln!(f, "$$")?;
    write!(f, "{}", function.script)?;
    write!(f, "$$")
}

// ============ Renderers ============

pub fn render_network_rule(rule_name: &str, hostname: &str) -> AppResult<Statement> {
    if hostname.is_empty() {
        return Err(AppError::Validation("URL has no host".to_string()));
    }

    Ok(Statement::CreateNetworkRule {
        name: Ident::new(rule_name)?,
        host: hostname.to_string(),
    })
}

pub fn render_secret(secret_name: &str, token_value: &str) -> AppResult<Statement> {
    Ok(Statement::CreateSecret {
        name: Ident::new(secret_name)?,
        token: token_value.to_string(),
    })
}

pub fn render_integration(
    integration_name: &str,
    rule_name: &str,
    secret_name: Option<&str>,
) -> AppResult<Statement> {
    Ok(Statement::CreateIntegration {
        name: Ident::new(integration_name)?,
        network_rule: Ident::new(rule_name)?,
        secret: secret_name.map(Ident::new).transpose()?,
    })
}

pub fn render_function(
    function_name: &str,
    integration_name: &str,
    secret_name: Option<&str>,
    url: &str,
    method: HttpMethod,
    has_param: bool,
) -> AppResult<Statement> {
    if method == HttpMethod::Post && has_param {
        return Err(AppError::Validation(
            "URL parameters are only supported for GET APIs".to_string(),
        ));
    }

    let name = Ident::new(function_name)?;
    let params = function_params(method, has_param);
    let script = HandlerScript {
        handler: name.clone(),
        params: params.clone(),
        method,
        url: url.to_string(),
        has_secret: secret_name.is_some(),
    };
    script.validate()?;

    Ok(Statement::CreateFunction(Box::new(FunctionDefinition {
        name,
        params,
        integration: Ident::new(integration_name)?,
        secret: secret_name.map(Ident::new).transpose()?,
        script,
    })))
}

/// `SELECT API_x(...) AS TEST` with the arguments matching the UDF signature
pub fn render_test_query(
    function_name: &str,
    method: HttpMethod,
    has_param: bool,
    input: &TestInput,
) -> AppResult<Statement> {
    let args = match (method, has_param) {
        (HttpMethod::Get, false) => vec![],
        (HttpMethod::Get, true) => vec![input.parameter.clone()],
        (HttpMethod::Post, _) => vec![input.header.clone(), input.body.clone()],
    };

    Ok(Statement::CallFunction {
        name: Ident::new(function_name)?,
        args,
    })
}

pub fn render_catalog_query() -> Statement {
    Statement::ListFunctions {
        prefix: FUNCTION_PREFIX,
    }
}

/// Full creation sequence: network rule, optional secret, integration, function
pub fn render_create_statements(definition: &ApiDefinition) -> AppResult<Vec<Statement>> {
    let names = definition.names();
    let host = hostname(&definition.url)?;

    let mut statements = vec![render_network_rule(&names.network_rule, &host)?];
    if let (Some(secret_name), Some(token)) = (&names.secret, &definition.secret) {
        statements.push(render_secret(secret_name, token)?);
    }
    statements.push(render_integration(
        &names.integration,
        &names.network_rule,
        names.secret.as_deref(),
    )?);
    statements.push(render_function(
        &names.function,
        &names.integration,
        names.secret.as_deref(),
        &definition.url,
        definition.method,
        definition.has_url_param,
    )?);

    Ok(statements)
}

/// Authority of the URL (`host` or `host:port`), the egress target of the network rule
pub fn hostname(url: &str) -> AppResult<String> {
    // The placeholder is not valid in a URL; it never sits in the authority anyway
    let probe = url.replace(URL_PARAM_PLACEHOLDER, "param");
    let parsed = reqwest::Url::parse(&probe)
        .map_err(|e| AppError::Validation(format!("Invalid URL '{}': {}", url, e)))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::Validation(format!("URL '{}' has no host", url)))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(method: HttpMethod, secret: Option<&str>, has_url_param: bool) -> ApiDefinition {
        ApiDefinition {
            name: "get_id".to_string(),
            url: if has_url_param {
                "https://api.example.com/{param}/info".to_string()
            } else {
                "https://x.com/id".to_string()
            },
            method,
            secret: secret.map(str::to_string),
            has_url_param,
        }
    }

    fn signature_line(statement: &Statement) -> String {
        statement.to_string().lines().next().unwrap().to_string()
    }

    #[test]
    fn test_ident_validation() {
        assert!(Ident::new("API_get_id").is_ok());
        assert!(Ident::new("_x1").is_ok());
        assert!(Ident::new("").is_err());
        assert!(Ident::new("1abc").is_err());
        assert!(Ident::new("a; DROP TABLE t").is_err());
        assert!(Ident::new("my-api").is_err());
    }

    #[test]
    fn test_literal_escaping() {
        assert_eq!(Literal("plain").to_string(), "'plain'");
        assert_eq!(Literal("it's").to_string(), "'it''s'");
        assert_eq!(Literal("a\\b").to_string(), "'a\\\\b'");
    }

    #[test]
    fn test_network_rule() {
        let statement = render_network_rule("network_get_id", "x.com").unwrap();
        assert_eq!(
            statement.to_string(),
            "CREATE OR REPLACE NETWORK RULE network_get_id MODE = EGRESS TYPE = HOST_PORT VALUE_LIST = ('x.com')"
        );
        assert_eq!(statement.kind(), ObjectKind::NetworkRule);
    }

    #[test]
    fn test_secret_escapes_token() {
        let statement = render_secret("secret_get_id", "ab'cd").unwrap();
        assert_eq!(
            statement.to_string(),
            "CREATE OR REPLACE SECRET secret_get_id TYPE = GENERIC_STRING SECRET_STRING = 'ab''cd'"
        );
    }

    #[test]
    fn test_secret_redacted() {
        let statement = render_secret("secret_get_id", "1234-5678").unwrap();
        let redacted = statement.redacted();
        assert!(!redacted.contains("1234-5678"));
        assert!(redacted.ends_with("SECRET_STRING = '********'"));
    }

    #[test]
    fn test_integration_references_secret_only_when_present() {
        let with_secret =
            render_integration("integration_x", "network_x", Some("secret_x")).unwrap();
        assert!(with_secret
            .to_string()
            .contains("ALLOWED_AUTHENTICATION_SECRETS = (secret_x)"));

        let without_secret = render_integration("integration_x", "network_x", None).unwrap();
        let sql = without_secret.to_string();
        assert!(sql.contains("ALLOWED_AUTHENTICATION_SECRETS = ()"));
        assert!(!sql.contains("secret_"));
        assert!(sql.contains("ALLOWED_NETWORK_RULES = (network_x)"));
        assert!(sql.ends_with("ENABLED = TRUE"));
    }

    #[test]
    fn test_function_arity() {
        let cases = [
            (HttpMethod::Get, false, "CREATE OR REPLACE FUNCTION API_x()"),
            (
                HttpMethod::Get,
                true,
                "CREATE OR REPLACE FUNCTION API_x(parameter STRING)",
            ),
            (
                HttpMethod::Post,
                false,
                "CREATE OR REPLACE FUNCTION API_x(headerParam STRING, bodyParam STRING)",
            ),
        ];

        for (method, has_param, expected) in cases {
            let url = if has_param {
                "https://api.example.com/{param}/info"
            } else {
                "https://api.example.com/info"
            };
            for secret in [None, Some("secret_x")] {
                let statement = render_function(
                    "API_x",
                    "integration_x",
                    secret,
                    url,
                    method,
                    has_param,
                )
                .unwrap();
                assert_eq!(signature_line(&statement), expected);
            }
        }
    }

    #[test]
    fn test_function_secret_binding() {
        let statement = render_function(
            "API_x",
            "integration_x",
            Some("secret_x"),
            "https://x.com/id",
            HttpMethod::Get,
            false,
        )
        .unwrap();
        let sql = statement.to_string();
        assert!(sql.contains("SECRETS = ('secret_variable' = secret_x)"));
        assert!(sql.contains("_snowflake.get_generic_secret_string('secret_variable')"));

        let statement = render_function(
            "API_x",
            "integration_x",
            None,
            "https://x.com/id",
            HttpMethod::Get,
            false,
        )
        .unwrap();
        let sql = statement.to_string();
        assert!(!sql.contains("SECRETS = ("));
        assert!(!sql.contains("get_generic_secret_string"));
    }

    #[test]
    fn test_function_header() {
        let statement = render_function(
            "API_x",
            "integration_x",
            None,
            "https://x.com/id",
            HttpMethod::Get,
            false,
        )
        .unwrap();
        let sql = statement.to_string();
        assert!(sql.contains("RETURNS VARIANT"));
        assert!(sql.contains("LANGUAGE PYTHON"));
        assert!(sql.contains("RUNTIME_VERSION = 3.10"));
        assert!(sql.contains("HANDLER = 'API_x'"));
        assert!(sql.contains("EXTERNAL_ACCESS_INTEGRATIONS = (integration_x)"));
        assert!(sql.contains("PACKAGES = ('snowflake-snowpark-python', 'requests')"));
        assert!(sql.contains("AS\n$$\n"));
        assert!(sql.ends_with("$$"));
    }

    #[test]
    fn test_post_with_param_rejected() {
        let result = render_function(
            "API_x",
            "integration_x",
            None,
            "https://x.com/{param}",
            HttpMethod::Post,
            true,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_get_id_sequence_has_no_secret() {
        let statements =
            render_create_statements(&definition(HttpMethod::Get, None, false)).unwrap();

        let kinds: Vec<ObjectKind> = statements.iter().map(Statement::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectKind::NetworkRule,
                ObjectKind::Integration,
                ObjectKind::Function
            ]
        );
        assert!(statements[0].to_string().contains("VALUE_LIST = ('x.com')"));
        assert!(statements[1]
            .to_string()
            .contains("ALLOWED_AUTHENTICATION_SECRETS = ()"));
        assert_eq!(statements[2].object_name(), "API_get_id");
    }

    #[test]
    fn test_sequence_with_secret() {
        let statements =
            render_create_statements(&definition(HttpMethod::Post, Some("tok"), false)).unwrap();

        let names: Vec<String> = statements.iter().map(Statement::object_name).collect();
        assert_eq!(
            names,
            vec![
                "network_get_id",
                "secret_get_id",
                "integration_get_id",
                "API_get_id"
            ]
        );
        assert!(statements[2]
            .to_string()
            .contains("ALLOWED_AUTHENTICATION_SECRETS = (secret_get_id)"));
    }

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("https://x.com/id").unwrap(), "x.com");
        assert_eq!(
            hostname("https://api.example.com/{param}/info").unwrap(),
            "api.example.com"
        );
        assert_eq!(hostname("http://localhost:8080/a").unwrap(), "localhost:8080");
        assert!(hostname("not a url").is_err());
    }

    #[test]
    fn test_query_for_each_shape() {
        let input = TestInput {
            parameter: "42".to_string(),
            header: "X-Env: 'test'".to_string(),
            body: "id: 1".to_string(),
        };

        let get = render_test_query("API_x", HttpMethod::Get, false, &input).unwrap();
        assert_eq!(get.to_string(), "SELECT API_x() AS TEST");

        let param = render_test_query("API_x", HttpMethod::Get, true, &input).unwrap();
        assert_eq!(param.to_string(), "SELECT API_x('42') AS TEST");

        let post = render_test_query("API_x", HttpMethod::Post, false, &input).unwrap();
        assert_eq!(
            post.to_string(),
            "SELECT API_x('X-Env: ''test''', 'id: 1') AS TEST"
        );
    }

    #[test]
    fn test_catalog_query() {
        assert_eq!(
            render_catalog_query().to_string(),
            "SELECT FUNCTION_NAME, ARGUMENT_SIGNATURE, TO_DATE(CREATED) AS CREATION_DATE \
             FROM INFORMATION_SCHEMA.FUNCTIONS WHERE FUNCTION_NAME LIKE 'API_%'"
        );
    }

    #[test]
    fn test_signature_parse() {
        let signature = FunctionSignature::parse("api_test(number)").unwrap();
        assert_eq!(signature.name.as_str(), "api_test");
        assert_eq!(signature.to_string(), "api_test(number)");

        let signature = FunctionSignature::parse(" API_X(VARCHAR, VARCHAR); ").unwrap();
        assert_eq!(signature.to_string(), "API_X(VARCHAR, VARCHAR)");

        assert!(FunctionSignature::parse("api_test").is_err());
        assert!(FunctionSignature::parse("api_test(number) ; DROP DATABASE x").is_err());
        assert!(FunctionSignature::parse("api_test(x'y)").is_err());
        assert!(FunctionSignature::parse("api_test(number) DROP x()").is_err());
        assert!(FunctionSignature::parse("API_X(NUMBER(38,0))").is_ok());
    }

    #[test]
    fn test_drop_statements() {
        let signature = FunctionSignature::parse("api_test(number)").unwrap();
        assert_eq!(
            Statement::DropFunction(signature).to_string(),
            "DROP FUNCTION IF EXISTS api_test(number)"
        );
        let name = Ident::new("integration_test").unwrap();
        assert_eq!(
            Statement::DropIntegration(name).to_string(),
            "DROP EXTERNAL ACCESS INTEGRATION IF EXISTS integration_test"
        );
    }
}
