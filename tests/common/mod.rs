pub mod app;

#[allow(unused_imports)]
pub use app::{catalog_result, test_config, TestApp};
