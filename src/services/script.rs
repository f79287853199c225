//! Python handler embedded in the generated UDF.
//!
//! The script is assembled from the API shape instead of branching at call
//! time: only the header/body parsing, secret lookup and request verb the
//! definition needs are emitted.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AppError, AppResult};
use crate::models::{HttpMethod, URL_PARAM_PLACEHOLDER};
use crate::services::template::{Ident, Param, SECRET_BINDING};

const INDENT: &str = "    ";

#[derive(Debug, Clone)]
pub struct HandlerScript {
    pub handler: Ident,
    pub params: Vec<Param>,
    pub method: HttpMethod,
    /// URL template, possibly with one `{param}` placeholder
    pub url: String,
    pub has_secret: bool,
}

impl HandlerScript {
    pub fn validate(&self) -> AppResult<()> {
        // The body is dollar-quoted; `$$` in the URL would terminate it
        if self.url.contains("$$") {
            return Err(AppError::Validation(
                "URL must not contain '$$'".to_string(),
            ));
        }
        if self.url.contains(['\n', '\r']) {
            return Err(AppError::Validation(
                "URL must be a single line".to_string(),
            ));
        }

        let placeholders = self.url.matches(URL_PARAM_PLACEHOLDER).count();
        match (self.takes_url_param(), placeholders) {
            (true, 1) | (false, 0) => Ok(()),
            (true, 0) => Err(AppError::Validation(format!(
                "Parametrized URL must contain the {} placeholder",
                URL_PARAM_PLACEHOLDER
            ))),
            (true, _) => Err(AppError::Validation(format!(
                "URL may contain at most one {} placeholder",
                URL_PARAM_PLACEHOLDER
            ))),
            (false, _) => Err(AppError::Validation(format!(
                "URL contains {} but the API is not parametrized",
                URL_PARAM_PLACEHOLDER
            ))),
        }
    }

    fn takes_url_param(&self) -> bool {
        self.method == HttpMethod::Get && !self.params.is_empty()
    }
}

impl fmt::Display for HandlerScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.params.iter().map(|Param(name)| *name).collect();

        writeln!(f, "import _snowflake")?;
        writeln!(f, "import requests")?;
        writeln!(f, "import json")?;
        writeln!(f)?;
        writeln!(f, "def {}({}):", self.handler, params.join(", "))?;
        writeln!(f, "{INDENT}headers = {{'content-type': 'application/json'}}")?;

        if self.method == HttpMethod::Post {
            writeln!(f, "{INDENT}body = {{}}")?;
            write_line_parser(f, "headerParam", "headers")?;
            write_line_parser(f, "bodyParam", "body")?;
        }

        if self.has_secret {
            writeln!(
                f,
                "{INDENT}bearer_token = _snowflake.get_generic_secret_string({})",
                PyLiteral(SECRET_BINDING)
            )?;
            writeln!(f, "{INDENT}headers['Authorization'] = 'Bearer ' + bearer_token")?;
        }

        if self.takes_url_param() {
            writeln!(
                f,
                "{INDENT}api_url = {}.replace({}, parameter)",
                PyLiteral(&self.url),
                PyLiteral(URL_PARAM_PLACEHOLDER)
            )?;
        } else {
            writeln!(f, "{INDENT}api_url = {}", PyLiteral(&self.url))?;
        }

        match self.method {
            HttpMethod::Get => writeln!(
                f,
                "{INDENT}response = requests.get(api_url, headers=headers)"
            )?,
            HttpMethod::Post => writeln!(
                f,
                "{INDENT}response = requests.post(api_url, headers=headers, data=json.dumps(body))"
            )?,
        }

        writeln!(f, "{INDENT}if response.status_code == 200:")?;
        writeln!(f, "{INDENT}{INDENT}return response.json()")?;
        writeln!(
            f,
            "{INDENT}return api_url + 'Error Code:' + str(response.status_code) + ' Message: ' + response.text"
        )
    }
}

/// `key: value` lines of `source` into the `target` dict; lines without a colon are skipped
fn write_line_parser(f: &mut fmt::Formatter<'_>, source: &str, target: &str) -> fmt::Result {
    writeln!(f, "{INDENT}for line in {source}.split('\\n'):")?;
    writeln!(f, "{INDENT}{INDENT}if ':' in line:")?;
    writeln!(f, "{INDENT}{INDENT}{INDENT}key, value = line.split(':', 1)")?;
    writeln!(f, "{INDENT}{INDENT}{INDENT}{target}[key.strip()] = value.strip()")
}

/// Single-quoted Python string literal
struct PyLiteral<'a>(&'a str);

impl fmt::Display for PyLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("'")?;
        for c in self.0.chars() {
            match c {
                '\'' => f.write_str("\\'")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                _ => write!(f, "{}", c)?,
            }
        }
        f.write_str("'")
    }
}

/// URL the handler calls for a given parameter value
pub fn substitute_param(url_template: &str, value: &str) -> String {
    url_template.replace(URL_PARAM_PLACEHOLDER, value)
}

/// Header/body text as the handler parses it at call time
pub fn parse_key_values(text: &str) -> BTreeMap<String, String> {
    text.split('\n')
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}
