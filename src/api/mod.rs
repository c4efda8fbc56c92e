//! HTTP access to the task API: error normalization, the transport seam and
//! the client with its interceptor chain.

pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

pub use client::{ApiClient, ApiClientBuilder, BearerAuth, Interceptor, RequestLog};
pub use error::ApiError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, Transport};
