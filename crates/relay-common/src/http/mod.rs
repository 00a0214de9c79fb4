//! HTTP plumbing shared by the hub and the proxy
//!
//! Identity extraction, CORS and the handler error type.

mod api_error;
mod cors;
mod identity;

pub use api_error::{ApiError, ApiResult};
pub use cors::cors_layer;
pub use identity::{ClientIdentity, USER_ID_HEADER};
