//! HTTP surface of the client: the raw fetch wrapper, its error taxonomy,
//! shared wire types and the session-bound [`AuthedClient`].

pub mod authed;
pub mod error;
pub mod fetch;
pub mod types;

pub use authed::AuthedClient;
pub use error::FetchError;
pub use fetch::{ApiClient, RequestBody, RequestOptions};
