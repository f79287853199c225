pub mod api_definition;
pub mod catalog;
pub mod object;

pub use api_definition::*;
pub use catalog::*;
pub use object::*;
