//! Custom extractors that reject with structured `ApiError` bodies.

mod json_body;
mod query_params;

pub use json_body::JsonBody;
pub use query_params::QueryParams;
