use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::handlers::common::{validate_required, StatementResponse};
use crate::models::CatalogRow;
use crate::services::{CatalogService, DropService};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogRowResponse {
    pub function_name: String,
    pub argument_signature: String,
    /// `YYYY-MM-DD`
    pub creation_date: Option<String>,
    /// Value to pass to the drop endpoint
    pub drop_signature: String,
}

impl From<CatalogRow> for CatalogRowResponse {
    fn from(row: CatalogRow) -> Self {
        let drop_signature = row.drop_signature();
        let creation_date = row
            .creation_date
            .and_then(|d| d.format(format_description!("[year]-[month]-[day]")).ok());

        Self {
            function_name: row.function_name,
            argument_signature: row.argument_signature,
            creation_date,
            drop_signature,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogListResponse {
    pub data: Vec<CatalogRowResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DropBeeRequest {
    /// Function name and argument types, e.g. `API_TEST(NUMBER, NUMBER)`
    pub signature: String,
    /// Also drop the network rule, secret and integration (default: true)
    #[serde(default = "default_clean_dependencies")]
    pub clean_dependencies: bool,
}

fn default_clean_dependencies() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DropBeeResponse {
    pub dropped: Vec<StatementResponse>,
}

// ============ Handlers ============

/// List the API functions in the current schema
#[utoipa::path(
    get,
    path = "/api/bees",
    responses(
        (status = 200, description = "API functions created via SnowBees", body = CatalogListResponse),
        (status = 502, description = "Catalog query failed")
    ),
    tag = "List All Bees"
)]
pub async fn list_bees(State(state): State<AppState>) -> AppResult<Json<CatalogListResponse>> {
    let rows = CatalogService::list_api_functions(state.session.as_ref()).await?;

    Ok(Json(CatalogListResponse {
        total: rows.len(),
        data: rows.into_iter().map(|r| r.into()).collect(),
    }))
}

/// Drop a function and, optionally, the objects created alongside it
#[utoipa::path(
    post,
    path = "/api/bees/drop",
    request_body = DropBeeRequest,
    responses(
        (status = 200, description = "Objects dropped (if they existed)", body = DropBeeResponse),
        (status = 400, description = "Validation error"),
        (status = 502, description = "The warehouse rejected one of the statements")
    ),
    tag = "List All Bees"
)]
pub async fn drop_bee(
    State(state): State<AppState>,
    Json(payload): Json<DropBeeRequest>,
) -> AppResult<Json<DropBeeResponse>> {
    validate_required("function signature", &payload.signature)?;

    let dropped = DropService::drop_api(
        state.session.as_ref(),
        &payload.signature,
        payload.clean_dependencies,
    )
    .await?;

    Ok(Json(DropBeeResponse {
        dropped: dropped
            .into_iter()
            .map(|e| StatementResponse::from_executed(e, "dropped"))
            .collect(),
    }))
}
