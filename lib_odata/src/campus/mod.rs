//! # Campus Queries Module
//!
//! Business queries against the campus OData service, layered on the
//! generic retrieval engine. Each function builds one of the integration
//! queries (students for the health-services feed, active students for the
//! bookstore feed, term/section data for schedule generation) and runs it
//! through paged or chunked retrieval.
//!
//! ## Contained Modules:
//!
//! - **`filters`**: Status-category filter builders and enrollment ranking
//!   helpers shared by the integrations.
//! - **`students`**: Student-record extraction queries.
//! - **`sections`**: Term and class-section extraction queries.

use serde_json::Value;

use crate::retrieve::odata_http::ODataClient;

/// Status filters and enrollment selection helpers.
pub mod filters;
/// Term and class-section queries.
pub mod sections;
/// Student extraction queries.
pub mod students;

/// # Campus API
///
/// A client for the campus OData endpoints, pre-configured with the
/// integration base URI. Wraps an [`ODataClient`] the way the individual
/// integrations use it.
pub struct CampusApi {
    /// The underlying retrieval engine.
    client: ODataClient,
    /// Base URI of the integration endpoint, with a trailing slash.
    integration_uri: String,
}

impl CampusApi {
    /// Creates a campus API handle over an already-authenticated client.
    pub fn new(client: ODataClient, integration_uri: &str) -> Self {
        Self {
            client,
            integration_uri: format!("{}/", integration_uri.trim_end_matches('/')),
        }
    }

    /// The underlying retrieval engine, for ad-hoc queries.
    pub fn client(&self) -> &ODataClient {
        &self.client
    }

    /// Mutable access to the engine, e.g. to toggle request caching.
    pub fn client_mut(&mut self) -> &mut ODataClient {
        &mut self.client
    }
}

/// Unwraps the `value` record list out of a retrieval envelope, carrying
/// absence through.
pub(crate) fn extract_value_list(response: Option<Value>) -> Option<Vec<Value>> {
    response.and_then(|body| body.get("value").and_then(Value::as_array).cloned())
}
