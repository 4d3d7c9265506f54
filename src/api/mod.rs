//! Success envelope shared by the JSON routes.

pub mod response;

pub use response::ApiResponse;
