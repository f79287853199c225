use std::sync::Arc;

use axum_test::TestServer;
use snowbees::build_router;
use snowbees::config::Config;
use snowbees::session::{InMemorySession, ResultSet};
use snowbees::state::AppState;

/// Test configuration
pub fn test_config() -> Config {
    Config {
        account_url: "https://test-account.snowflakecomputing.com".to_string(),
        token: "test-token".to_string(),
        token_type: "OAUTH".to_string(),
        database: Some("SNOWBEES_TEST".to_string()),
        schema: Some("PUBLIC".to_string()),
        warehouse: None,
        role: None,
        statement_timeout_seconds: 60,
        poll_interval_ms: 10,
        max_polls: 3,
        dry_run: true,
        host: "127.0.0.1".to_string(),
        port: 0,
    }
}

/// Test application wrapper
pub struct TestApp {
    pub server: TestServer,
    /// Same session the router uses; inspect it to see what was executed
    pub session: InMemorySession,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        // Use InMemorySession for testing (avoids a live warehouse in tests)
        let session = InMemorySession::new();
        let state = AppState::with_session(test_config(), Arc::new(session.clone()));

        let router = build_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, session }
    }
}

/// Catalog rows shaped like the warehouse's INFORMATION_SCHEMA.FUNCTIONS answer
#[allow(dead_code)]
pub fn catalog_result(rows: &[(&str, &str, &str)]) -> ResultSet {
    ResultSet {
        columns: vec![
            "FUNCTION_NAME".to_string(),
            "ARGUMENT_SIGNATURE".to_string(),
            "CREATION_DATE".to_string(),
        ],
        rows: rows
            .iter()
            .map(|(name, signature, date)| {
                vec![
                    Some(name.to_string()),
                    Some(signature.to_string()),
                    Some(date.to_string()),
                ]
            })
            .collect(),
    }
}
