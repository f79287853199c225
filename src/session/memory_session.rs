use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::session::{ResultSet, WarehouseSession};

/// In-memory session for testing.
///
/// Records every statement it receives and answers from a list of scripted
/// rules; statements matching no rule succeed with a generic status row.
#[derive(Clone)]
pub struct InMemorySession {
    inner: Arc<Mutex<InMemorySessionInner>>,
}

struct InMemorySessionInner {
    executed: Vec<String>,
    rules: Vec<Rule>,
}

struct Rule {
    needle: String,
    outcome: Result<ResultSet, String>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemorySessionInner {
                executed: Vec::new(),
                rules: Vec::new(),
            })),
        }
    }

    /// Answer statements containing `needle` with `result`
    pub async fn respond_to(&self, needle: &str, result: ResultSet) {
        let mut inner = self.inner.lock().await;
        inner.rules.push(Rule {
            needle: needle.to_string(),
            outcome: Ok(result),
        });
    }

    /// Fail statements containing `needle` with a warehouse error
    pub async fn fail_on(&self, needle: &str, message: &str) {
        let mut inner = self.inner.lock().await;
        inner.rules.push(Rule {
            needle: needle.to_string(),
            outcome: Err(message.to_string()),
        });
    }

    /// Statements received so far, in order
    pub async fn executed(&self) -> Vec<String> {
        self.inner.lock().await.executed.clone()
    }
}

impl Default for InMemorySession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WarehouseSession for InMemorySession {
    async fn execute(&self, sql: &str) -> AppResult<ResultSet> {
        let mut inner = self.inner.lock().await;
        inner.executed.push(sql.to_string());

        // First matching rule wins
        let outcome = inner
            .rules
            .iter()
            .find(|rule| sql.contains(&rule.needle))
            .map(|rule| rule.outcome.clone());

        tracing::debug!(statement = %sql, "Recorded statement");

        match outcome {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(AppError::RemoteExecution(message)),
            None => Ok(ResultSet::status("Statement executed successfully.")),
        }
    }
}
