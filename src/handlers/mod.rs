pub mod bee;
pub mod catalog;
pub mod common;

pub use bee::{
    create_bee, preview_bee, test_bee, CreateBeeRequest, CreateBeeResponse, PlannedStatement,
    PreviewBeeRequest, PreviewBeeResponse, TestBeeRequest, TestBeeResponse,
};
pub use catalog::{
    drop_bee, list_bees, CatalogListResponse, CatalogRowResponse, DropBeeRequest,
    DropBeeResponse,
};
pub use common::{validate_optional, validate_required, StatementResponse};
