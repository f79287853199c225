use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::handlers::common::{validate_optional, validate_required, StatementResponse};
use crate::models::{ApiDefinition, HttpMethod, ObjectKind, TestInput};
use crate::services::{parse_key_values, substitute_param, ProvisionService};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBeeRequest {
    /// Function name without the `API_` prefix, e.g. `get_id`
    pub function_name: String,
    /// API URL; parametrized URLs carry one `{param}` placeholder
    pub url: String,
    #[serde(default)]
    pub http_method: HttpMethod,
    #[serde(default)]
    pub has_secret: bool,
    /// Bearer token, required when `has_secret` is set
    pub secret_value: Option<String>,
    /// GET only
    #[serde(default)]
    pub has_url_param: bool,
}

impl CreateBeeRequest {
    fn into_definition(self) -> AppResult<ApiDefinition> {
        validate_required("function name", &self.function_name)?;
        validate_required("URL", &self.url)?;

        let secret = if self.has_secret {
            let token = validate_optional(self.secret_value).ok_or_else(|| {
                AppError::Validation("Missing secret bearer token".to_string())
            })?;
            Some(token)
        } else {
            None
        };

        Ok(ApiDefinition {
            name: self.function_name.trim().to_string(),
            url: self.url.trim().to_string(),
            method: self.http_method,
            secret,
            has_url_param: self.has_url_param,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateBeeResponse {
    pub function: String,
    pub objects: Vec<StatementResponse>,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewBeeRequest {
    #[serde(flatten)]
    pub api: CreateBeeRequest,
    /// Sample value for the `{param}` placeholder
    pub parameter: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlannedStatement {
    pub kind: ObjectKind,
    pub name: String,
    pub sql: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewBeeResponse {
    pub function: String,
    pub statements: Vec<PlannedStatement>,
    /// URL the function would call for `parameter`
    pub resolved_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TestBeeRequest {
    /// Function name without the `API_` prefix
    pub function_name: String,
    #[serde(default)]
    pub http_method: HttpMethod,
    #[serde(default)]
    pub has_url_param: bool,
    /// Replaces `{param}` in the URL
    pub parameter: Option<String>,
    /// POST headers, one `key: value` per line
    pub header: Option<String>,
    /// POST body, one `key: value` per line
    pub body: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TestBeeResponse {
    pub function: String,
    pub sql: String,
    pub responses: Vec<serde_json::Value>,
    /// Headers the function will send on top of its defaults (POST only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_header: Option<BTreeMap<String, String>>,
    /// Body fields the function will send (POST only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_body: Option<BTreeMap<String, String>>,
}

// ============ Handlers ============

/// Create the network rule, secret, integration and function for an API
#[utoipa::path(
    post,
    path = "/api/bees",
    request_body = CreateBeeRequest,
    responses(
        (status = 200, description = "Function created successfully", body = CreateBeeResponse),
        (status = 400, description = "Validation error"),
        (status = 502, description = "The warehouse rejected one of the statements")
    ),
    tag = "Create New Bee"
)]
pub async fn create_bee(
    State(state): State<AppState>,
    Json(payload): Json<CreateBeeRequest>,
) -> AppResult<Json<CreateBeeResponse>> {
    let definition = payload.into_definition()?;
    let function = definition.names().function;

    let executed = ProvisionService::create(state.session.as_ref(), &definition).await?;

    Ok(Json(CreateBeeResponse {
        function,
        objects: executed
            .into_iter()
            .map(|e| StatementResponse::from_executed(e, "created"))
            .collect(),
        message: "Function Created Successfully".to_string(),
    }))
}

/// Render the statements of an API without executing them
#[utoipa::path(
    post,
    path = "/api/bees/preview",
    request_body = PreviewBeeRequest,
    responses(
        (status = 200, description = "Statements the create endpoint would run", body = PreviewBeeResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "Create New Bee"
)]
pub async fn preview_bee(Json(payload): Json<PreviewBeeRequest>) -> AppResult<Json<PreviewBeeResponse>> {
    let parameter = payload.parameter.unwrap_or_default();
    let definition = payload.api.into_definition()?;

    let statements = ProvisionService::plan(&definition)?
        .iter()
        .map(|statement| PlannedStatement {
            kind: statement.kind(),
            name: statement.object_name(),
            sql: statement.redacted(),
        })
        .collect();

    Ok(Json(PreviewBeeResponse {
        function: definition.names().function,
        statements,
        resolved_url: substitute_param(&definition.url, &parameter),
    }))
}

/// Call a generated function with test inputs
#[utoipa::path(
    post,
    path = "/api/bees/test",
    request_body = TestBeeRequest,
    responses(
        (status = 200, description = "API response returned by the function", body = TestBeeResponse),
        (status = 400, description = "Validation error"),
        (status = 502, description = "The function failed or does not exist")
    ),
    tag = "Create New Bee"
)]
pub async fn test_bee(
    State(state): State<AppState>,
    Json(payload): Json<TestBeeRequest>,
) -> AppResult<Json<TestBeeResponse>> {
    validate_required("function name", &payload.function_name)?;

    let input = TestInput {
        parameter: payload.parameter.unwrap_or_default(),
        header: payload.header.unwrap_or_default(),
        body: payload.body.unwrap_or_default(),
    };

    let outcome = ProvisionService::test(
        state.session.as_ref(),
        payload.function_name.trim(),
        payload.http_method,
        payload.has_url_param,
        &input,
    )
    .await?;

    let is_post = payload.http_method == HttpMethod::Post;

    Ok(Json(TestBeeResponse {
        function: outcome.function,
        sql: outcome.sql,
        responses: outcome.responses,
        parsed_header: is_post.then(|| parse_key_values(&input.header)),
        parsed_body: is_post.then(|| parse_key_values(&input.body)),
    }))
}
