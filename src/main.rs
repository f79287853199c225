use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use snowbees::config::Config;
use snowbees::handlers::{
    CatalogListResponse, CatalogRowResponse, CreateBeeRequest, CreateBeeResponse, DropBeeRequest,
    DropBeeResponse, PlannedStatement, PreviewBeeRequest, PreviewBeeResponse, StatementResponse,
    TestBeeRequest, TestBeeResponse,
};
use snowbees::models::{HttpMethod, ObjectKind};
use snowbees::state::AppState;
use snowbees::{build_router, handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::bee::create_bee,
        handlers::bee::preview_bee,
        handlers::bee::test_bee,
        handlers::catalog::list_bees,
        handlers::catalog::drop_bee,
    ),
    components(schemas(
        HttpMethod,
        ObjectKind,
        StatementResponse,
        CreateBeeRequest,
        CreateBeeResponse,
        PreviewBeeRequest,
        PreviewBeeResponse,
        PlannedStatement,
        TestBeeRequest,
        TestBeeResponse,
        CatalogListResponse,
        CatalogRowResponse,
        DropBeeRequest,
        DropBeeResponse,
    )),
    tags(
        (name = "Create New Bee", description = "Define an API and generate its warehouse function"),
        (name = "List All Bees", description = "Browse and drop generated API functions")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    let addr = config.server_addr();

    let state = AppState::new(config).expect("Failed to initialize application state");
    tracing::info!(dry_run = state.config.dry_run, "Warehouse session ready");

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(listener, app).await.unwrap();
}
