use serde::Serialize;
use time::Date;

/// A generated UDF as reported by `INFORMATION_SCHEMA.FUNCTIONS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub function_name: String,
    /// As reported by the warehouse, e.g. `(PARAMETER VARCHAR)`
    pub argument_signature: String,
    pub creation_date: Option<Date>,
}

impl CatalogRow {
    /// Signature accepted by `DROP FUNCTION`: argument types only, no names.
    ///
    /// `(HEADERPARAM VARCHAR, BODYPARAM VARCHAR)` becomes
    /// `API_X(VARCHAR, VARCHAR)`.
    pub fn drop_signature(&self) -> String {
        let signature = self.argument_signature.trim();
        let inner = signature
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(signature);

        let types: Vec<&str> = split_arguments(inner)
            .into_iter()
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(|arg| match arg.split_once(char::is_whitespace) {
                Some((_, ty)) => ty.trim(),
                None => arg,
            })
            .collect();

        format!("{}({})", self.function_name, types.join(", "))
    }
}

/// Split on commas outside parentheses, so `NUMBER(38, 0)` stays one argument
fn split_arguments(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in args.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);

    parts
}
