//! Client onboarding approval service
//!
//! A commercial agent submits a new-customer request, which then passes the
//! director, order management and administration gates before it is
//! completed and archived. Any gate may reject it instead.

pub mod archive;
pub mod config;
pub mod documents;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod workflow;

pub use error::{ApiError, ApiResult};
pub use state::AppState;
