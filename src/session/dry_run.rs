use async_trait::async_trait;

use crate::error::AppResult;
use crate::session::{ResultSet, WarehouseSession};

/// Words of a statement worth logging before any literal starts
const SUMMARY_WORDS: usize = 6;

/// Session used when `DRY_RUN` is set.
///
/// Nothing leaves the process and nothing is retained: each statement is
/// logged by its leading keywords only, then answered with a status row.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSession;

impl DryRunSession {
    pub fn new() -> Self {
        Self
    }
}

/// Leading keywords and object name, stopping at the first quoted literal
pub fn summary(sql: &str) -> String {
    sql.split_whitespace()
        .take_while(|word| !word.contains('\'') && !word.contains("$$"))
        .take(SUMMARY_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl WarehouseSession for DryRunSession {
    async fn execute(&self, sql: &str) -> AppResult<ResultSet> {
        tracing::info!(statement = %summary(sql), "Dry run, statement not executed");
        Ok(ResultSet::status("Statement executed successfully."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::template::render_secret;

    #[test]
    fn test_summary_stops_before_literals() {
        let secret = render_secret("secret_get_id", "TOPSECRET-TOKEN")
            .unwrap()
            .to_string();
        let logged = summary(&secret);

        assert_eq!(logged, "CREATE OR REPLACE SECRET secret_get_id TYPE");
        assert!(!logged.contains("TOPSECRET"));

        assert_eq!(
            summary("SELECT API_get_user('42') AS TEST"),
            "SELECT"
        );
        assert_eq!(
            summary("DROP FUNCTION IF EXISTS API_GET_ID()"),
            "DROP FUNCTION IF EXISTS API_GET_ID()"
        );
    }

    #[tokio::test]
    async fn test_dry_run_answers_with_status() {
        let session = DryRunSession::new();

        let result = session
            .execute("CREATE OR REPLACE SECRET s TYPE = GENERIC_STRING SECRET_STRING = 'tok'")
            .await
            .unwrap();

        assert_eq!(result.first_value(), Some("Statement executed successfully."));
    }
}
