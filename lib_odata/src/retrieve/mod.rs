//! # Data Retrieval Module
//!
//! This module provides a centralized location for the OData retrieval
//! clients and utilities used by the extraction integrations.
//!
//! ## Purpose:
//! The goal of the `retrieve` module is to offer a consistent and robust way
//! to pull record sets out of the campus OData service, encapsulating common
//! concerns such as HTTP request building, retry-on-failure, response
//! caching, pagination and filter chunking. This prevents duplication of
//! networking logic across the individual integrations.
//!
//! ## Contained Modules:
//!
//! - **`odata_http`**: The `ODataClient` built on `reqwest`, owning one
//!   authenticated session and performing single GET/POST operations with
//!   bounded retry, failure classification and optional response caching.
//! - **`paging`**: Paged (`$top`/`$skip`/`$count`) and chunked
//!   (`$filter` disjunction batches) retrieval built on top of the client.
//! - **`query_string`**: A small ordered query-string codec with the exact
//!   split-on-`&` semantics the OData endpoints expect.
//!
//! By using the components within this module, the integrations can focus on
//! data shaping and business logic, delegating the complexities of network
//! communication to this layer.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// The OData HTTP client with retry, caching and failure classification.
pub mod odata_http;
/// Paged and chunked retrieval on top of the client.
pub mod paging;
/// Ordered query-string parsing and reassembly.
pub mod query_string;

#[cfg(test)]
pub(crate) mod mock_server;
