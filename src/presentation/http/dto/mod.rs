pub mod query_dto;
pub mod response_dto;
pub mod schema_dto;

pub use query_dto::*;
pub use response_dto::*;
pub use schema_dto::*;
