//! crossize-client - Async client for the crossize analysis backend
//!
//! The backend is an HTTP/JSON service that lists samples, serves per-sample
//! FCS and NTA results, and runs the cross-validation, population-shift,
//! gated-analysis, and axis-recommendation computations.
//!
//! Responses are folded into the core state as actions:
//!
//! ```no_run
//! # async fn demo(state: crossize_core::AppState) -> crossize_core::AppState {
//! use crossize_client::{comparison_action, BackendClient, CrossValidateRequest, RequestGuard};
//!
//! let client = BackendClient::new(&state.settings().backend).unwrap();
//! let guard = RequestGuard::new();
//! let request = CrossValidateRequest {
//!     fcs_sample_id: "F1".into(),
//!     nta_sample_id: "N1".into(),
//! };
//! match guard.run(client.cross_validate(&request)).await {
//!     Some(result) => crossize_core::reduce(state, comparison_action(result)),
//!     None => state,
//! }
//! # }
//! ```

pub mod client;
pub mod error;
pub mod guard;
pub mod models;

pub use client::BackendClient;
pub use error::*;
pub use guard::{RequestGuard, RequestTicket};
pub use models::*;

use crossize_core::{Action, ComparisonResult};

/// `ComparisonLoaded` on success, `RequestFailed` otherwise
pub fn comparison_action(result: ClientResult<ComparisonResult>) -> Action {
    match result {
        Ok(comparison) => Action::ComparisonLoaded(comparison),
        Err(e) => Action::RequestFailed(e.to_string()),
    }
}
