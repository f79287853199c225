use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Instant;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::session::{ResultSet, WarehouseSession};

/// SQL API endpoints:
/// - POST {account}/api/v2/statements?requestId={uuid}     - submit one statement
/// - GET  {account}/api/v2/statements/{handle}             - status / first partition
/// - GET  {account}/api/v2/statements/{handle}?partition=N - further partitions
const STATEMENTS_PATH: &str = "/api/v2/statements";

/// Session backed by the warehouse SQL REST API
#[derive(Clone)]
pub struct SqlApiSession {
    client: Client,
    config: Config,
}

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    statement_handle: Option<String>,
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<RowType>,
    #[serde(default)]
    partition_info: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingResponse {
    statement_handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    sql_state: Option<String>,
}

#[derive(Debug)]
enum Outcome {
    Done(StatementResponse),
    Pending(String),
}

impl Outcome {
    /// Interpret one SQL API reply from its status code and body
    fn from_reply(status: StatusCode, body: &str) -> AppResult<Self> {
        match status {
            StatusCode::OK => serde_json::from_str(body).map(Outcome::Done).map_err(|e| {
                AppError::Internal(format!("Malformed statement response: {}", e))
            }),
            StatusCode::ACCEPTED => serde_json::from_str::<PendingResponse>(body)
                .map(|pending| Outcome::Pending(pending.statement_handle))
                .map_err(|e| AppError::Internal(format!("Malformed pending response: {}", e))),
            _ => Err(AppError::RemoteExecution(SqlApiSession::error_message(
                status, body,
            ))),
        }
    }
}

/// First partition of a completed statement
#[derive(Debug)]
struct FirstPartition {
    result: ResultSet,
    /// Statement handle and the partition numbers still to fetch
    remaining: Option<(String, Range<usize>)>,
}

impl FirstPartition {
    fn from_response(response: StatementResponse) -> AppResult<Self> {
        let (columns, partitions) = match response.result_set_meta_data {
            Some(meta) => (
                meta.row_type.into_iter().map(|column| column.name).collect(),
                meta.partition_info.len(),
            ),
            None => (Vec::new(), 0),
        };

        let remaining = if partitions > 1 {
            let handle = response.statement_handle.ok_or_else(|| {
                AppError::Internal("Partitioned result without statement handle".to_string())
            })?;
            Some((handle, 1..partitions))
        } else {
            None
        };

        Ok(Self {
            result: ResultSet {
                columns,
                rows: response.data,
            },
            remaining,
        })
    }
}

impl SqlApiSession {
    pub fn new(config: Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn statements_url(&self) -> String {
        format!("{}{}", self.config.account_url, STATEMENTS_PATH)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header(
                "X-Snowflake-Authorization-Token-Type",
                self.config.token_type.as_str(),
            )
            .header("Accept", "application/json")
    }

    async fn submit(&self, sql: &str) -> AppResult<Outcome> {
        let body = StatementRequest {
            statement: sql,
            timeout: self.config.statement_timeout_seconds,
            database: self.config.database.as_deref(),
            schema: self.config.schema.as_deref(),
            warehouse: self.config.warehouse.as_deref(),
            role: self.config.role.as_deref(),
        };

        // The request id makes a resubmission of the same statement idempotent
        let url = format!("{}?requestId={}", self.statements_url(), Uuid::new_v4());
        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn fetch(&self, handle: &str, partition: Option<usize>) -> AppResult<Outcome> {
        let url = match partition {
            Some(partition) => format!("{}/{}?partition={}", self.statements_url(), handle, partition),
            None => format!("{}/{}", self.statements_url(), handle),
        };
        let response = self.authorized(self.client.get(&url)).send().await?;

        Self::decode(response).await
    }

    async fn decode(response: Response) -> AppResult<Outcome> {
        let status = response.status();
        let body = response.text().await?;

        Outcome::from_reply(status, &body)
    }

    fn error_message(status: StatusCode, text: &str) -> String {
        match serde_json::from_str::<ErrorBody>(text) {
            Ok(ErrorBody {
                message: Some(message),
                code,
                sql_state,
            }) => {
                let mut out = message;
                if let Some(code) = code {
                    out.push_str(&format!(" (code {}", code));
                    if let Some(sql_state) = sql_state {
                        out.push_str(&format!(", SQL state {}", sql_state));
                    }
                    out.push(')');
                }
                out
            }
            _ if text.is_empty() => format!("Warehouse returned HTTP {}", status.as_u16()),
            _ => format!("Warehouse returned HTTP {}: {}", status.as_u16(), text),
        }
    }

    /// Poll a running statement until it completes or the poll budget is spent
    async fn wait_for(&self, handle: String) -> AppResult<StatementResponse> {
        for attempt in 1..=self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval()).await;

            match self.fetch(&handle, None).await? {
                Outcome::Done(response) => return Ok(response),
                Outcome::Pending(_) => {
                    tracing::debug!(statement_handle = %handle, attempt, "Statement still running")
                }
            }
        }

        Err(AppError::RemoteExecution(format!(
            "Statement {} still running after {} polls",
            handle, self.config.max_polls
        )))
    }

    /// Collect the remaining partitions of a multi-partition result
    async fn into_result_set(&self, response: StatementResponse) -> AppResult<ResultSet> {
        let FirstPartition { mut result, remaining } = FirstPartition::from_response(response)?;

        if let Some((handle, partitions)) = remaining {
            for partition in partitions {
                match self.fetch(&handle, Some(partition)).await? {
                    Outcome::Done(page) => result.rows.extend(page.data),
                    Outcome::Pending(_) => {
                        return Err(AppError::Internal(format!(
                            "Partition {} of statement {} is not ready",
                            partition, handle
                        )))
                    }
                }
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl WarehouseSession for SqlApiSession {
    async fn execute(&self, sql: &str) -> AppResult<ResultSet> {
        let start = Instant::now();

        let response = match self.submit(sql).await? {
            Outcome::Done(response) => response,
            Outcome::Pending(handle) => self.wait_for(handle).await?,
        };
        let handle = response.statement_handle.clone().unwrap_or_default();
        let result = self.into_result_set(response).await?;

        tracing::info!(
            statement_handle = %handle,
            rows = result.rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement executed"
        );

        Ok(result)
    }
}
