//! # Paged and Chunked Retrieval
//!
//! Large result sets come out of the OData service in two shapes:
//!
//! - **Paged**: repeated `$top`/`$skip`/`$count` requests against a listing
//!   endpoint until the server-reported total is reached.
//! - **Chunked**: an oversized filter-by-list query split into bounded
//!   `$filter` disjunction batches, one request per batch, with the results
//!   reassembled in order.
//!
//! Both run strictly sequentially, one outstanding request at a time, since
//! the running totals and accumulated lists are not safe to build out of
//! order. Both inherit the retry/caching behavior of the underlying
//! [`ODataClient`](super::odata_http::ODataClient) and collapse to the
//! absence result if any individual request fails, so callers never see a
//! silently truncated list.

use std::fmt::Display;

use serde_json::{json, Value};

use super::odata_http::{ODataClient, ODataError};
use super::query_string::QueryString;

/// Records requested per page when the caller does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 100;
/// Values per `$filter` disjunction batch when the caller does not say
/// otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 20;

impl ODataClient {
    /// Get results from the service using paged queries to retrieve large
    /// result sets.
    ///
    /// `url` must not already carry `$top`, `$skip` or `$count`: the engine
    /// generates those itself, and mixing caller-supplied and generated
    /// paging parameters would corrupt the query, so that is reported
    /// immediately as [`ODataError::PagingParams`] without touching the
    /// network.
    ///
    /// The server-reported `@odata.count` from the first page is the
    /// termination target. An empty page stops the loop early, which covers
    /// totals that shrink mid-retrieval (concurrent deletes, or a stale
    /// cached count). If any individual page comes back without a usable
    /// response, the whole operation returns `Ok(None)` and the partial
    /// accumulation is discarded.
    ///
    /// Returns the accumulated records wrapped as `{"value": [...]}` to stay
    /// consistent with the plain `get` envelope.
    pub async fn get_paged(
        &self,
        url: &str,
        page_size: Option<u64>,
        use_cache: Option<bool>,
    ) -> Result<Option<Value>, ODataError> {
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        // The paging parameters extend an existing query string with '&',
        // otherwise they become the query string themselves.
        let raw_query = match url.split_once('?') {
            Some((_, query)) => query,
            None => "",
        };
        let query_separator = if raw_query.is_empty() { '?' } else { '&' };

        let query = QueryString::parse(raw_query);
        if query.contains_key("$top") || query.contains_key("$skip") || query.contains_key("$count")
        {
            let error_message = format!(
                "URL cannot include $top, $skip, or $count in the query string when using get_paged() - called with \"{}\"",
                url
            );
            self.logger().error(&error_message, None).await;
            return Err(ODataError::PagingParams {
                url: url.to_string(),
            });
        }

        let mut results: Vec<Value> = Vec::new();
        let mut total_records: Option<u64> = None;

        // Continue making requests until all records have been retrieved.
        while total_records.map_or(true, |total| (results.len() as u64) < total) {
            let page_url = format!(
                "{}{}$top={}&$skip={}&$count=true",
                url,
                query_separator,
                page_size,
                results.len()
            );

            // If any individual request comes back without a successful
            // response, exit and return the absence result.
            let Some(response) = self.get(&page_url, use_cache).await else {
                return Ok(None);
            };

            let Some(page) = response.get("value").and_then(Value::as_array).cloned() else {
                self.logger()
                    .error(
                        &format!("Response is missing the 'value' field for paged GET {}", page_url),
                        None,
                    )
                    .await;
                return Ok(None);
            };

            // An empty page means the total shrank after the initial
            // request; stop with what has been accumulated so far.
            if page.is_empty() {
                break;
            }

            if total_records.is_none() {
                let Some(count) = response.get("@odata.count").and_then(Value::as_u64) else {
                    self.logger()
                        .error(
                            &format!(
                                "Response is missing the '@odata.count' field for paged GET {}",
                                page_url
                            ),
                            None,
                        )
                        .await;
                    return Ok(None);
                };
                total_records = Some(count);
            }

            results.extend(page);
            self.logger()
                .debug(
                    &format!(
                        "Retrieved {}/{} records",
                        results.len(),
                        total_records.unwrap_or(0)
                    ),
                    None,
                )
                .await;
        }

        Ok(Some(json!({ "value": results })))
    }

    /// Gathers records for a large list of candidate values by splitting the
    /// list into bounded `$filter` disjunction batches.
    ///
    /// Each value in `to_chunk_list` is substituted into the `{}`
    /// placeholder of `filter`, e.g. `"Id eq {}"` or
    /// `"contains(Code, '{}')"`; the per-value clauses of one batch are
    /// joined with ` or ` and merged into the URL's existing `$filter` (if
    /// any). One plain `get` is issued per batch; the batches are never
    /// paged.
    ///
    /// Returns the concatenation of every batch's record list in batch
    /// order, or `None` as soon as any batch fails — no partial list is
    /// ever returned.
    pub async fn get_chunked<T: Display>(
        &self,
        url: &str,
        filter: &str,
        to_chunk_list: &[T],
        chunk_size: Option<usize>,
    ) -> Option<Vec<Value>> {
        let chunk_size = chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1);

        let (base_url, raw_query) = match url.split_once('?') {
            Some((base, query)) => (base, query),
            None => (url, ""),
        };
        let query = QueryString::parse(raw_query);

        let total_chunks = to_chunk_list.len().div_ceil(chunk_size);
        let mut response_list: Vec<Value> = Vec::new();

        for (index, list_chunk) in to_chunk_list.chunks(chunk_size).enumerate() {
            let clauses: Vec<String> = list_chunk
                .iter()
                .map(|value| filter.replace("{}", &value.to_string()))
                .collect();

            let mut chunk_query = query.clone();
            chunk_query.merge_filter(&clauses.join(" or "));

            let chunk_url = format!("{}?{}", base_url, chunk_query);
            let response = self.get(&chunk_url, None).await?;

            let Some(records) = response.get("value").and_then(Value::as_array) else {
                self.logger()
                    .error(
                        &format!("Response is missing the 'value' field for chunked GET {}", chunk_url),
                        None,
                    )
                    .await;
                return None;
            };

            response_list.extend(records.iter().cloned());
            self.logger()
                .debug(
                    &format!("Gathering data chunks: {}/{}", index + 1, total_chunks),
                    None,
                )
                .await;
        }

        Some(response_list)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::loggers::loggerlocal::{LoggerLocal, LoggerLocalOptions};
    use crate::retrieve::mock_server::MockServer;

    fn test_client() -> ODataClient {
        let logger = Arc::new(LoggerLocal::new(
            "test".to_string(),
            Some(LoggerLocalOptions::default()),
        ));
        let mut client = ODataClient::new("svc_user", "secret", logger).unwrap();
        client.retries = 0;
        client.retry_sleep = Duration::from_millis(1);
        client
    }

    fn page(count: u64, records: &[u64]) -> String {
        json!({ "@odata.count": count, "value": records }).to_string()
    }

    #[tokio::test]
    async fn get_paged_accumulates_until_the_reported_total() {
        let server = MockServer::serve(vec![
            (200, page(5, &[1, 2])),
            (200, page(5, &[3, 4])),
            (200, page(5, &[5])),
        ]);
        let client = test_client();

        let url = format!("{}/odata/Students", server.url);
        let result = client.get_paged(&url, Some(2), None).await.unwrap();

        assert_eq!(result, Some(json!({"value": [1, 2, 3, 4, 5]})));

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].contains("$top=2&$skip=0&$count=true"));
        assert!(requests[1].contains("$top=2&$skip=2&$count=true"));
        assert!(requests[2].contains("$top=2&$skip=4&$count=true"));
        server.join();
    }

    #[tokio::test]
    async fn get_paged_appends_to_an_existing_query_string() {
        let server = MockServer::serve(vec![(200, page(1, &[9]))]);
        let client = test_client();

        let url = format!("{}/odata/Students?$select=Id", server.url);
        let result = client.get_paged(&url, Some(100), None).await.unwrap();

        assert_eq!(result, Some(json!({"value": [9]})));
        assert!(server.requests()[0].contains("$select=Id&$top=100&$skip=0&$count=true"));
        server.join();
    }

    #[tokio::test]
    async fn get_paged_rejects_caller_supplied_paging_parameters() {
        let client = test_client();

        for query in ["$top=5", "$skip=10", "$count=true"] {
            let outcome = client
                .get_paged(&format!("http://127.0.0.1:1/odata/Students?{}", query), None, None)
                .await;
            assert!(matches!(outcome, Err(ODataError::PagingParams { .. })));
        }
    }

    #[tokio::test]
    async fn get_paged_discards_partial_results_when_a_page_fails() {
        let server = MockServer::serve(vec![
            (200, page(4, &[1, 2])),
            (500, r#"{"error": "boom"}"#.to_string()),
        ]);
        let client = test_client();

        let url = format!("{}/odata/Students", server.url);
        let result = client.get_paged(&url, Some(2), None).await.unwrap();

        assert!(result.is_none());
        assert_eq!(server.requests().len(), 2);
        server.join();
    }

    #[tokio::test]
    async fn get_paged_stops_on_an_empty_page() {
        // The server reported 5 records up front but only delivers 2.
        let server = MockServer::serve(vec![
            (200, page(5, &[1, 2])),
            (200, page(5, &[])),
        ]);
        let client = test_client();

        let url = format!("{}/odata/Students", server.url);
        let result = client.get_paged(&url, Some(2), None).await.unwrap();

        assert_eq!(result, Some(json!({"value": [1, 2]})));
        server.join();
    }

    #[tokio::test]
    async fn get_paged_treats_a_missing_value_field_as_a_failure() {
        let server = MockServer::serve(vec![(200, r#"{"unexpected": true}"#.to_string())]);
        let client = test_client();

        let url = format!("{}/odata/Students", server.url);
        let result = client.get_paged(&url, None, None).await.unwrap();

        assert!(result.is_none());
        server.join();
    }

    #[tokio::test]
    async fn get_chunked_batches_filters_and_concatenates_in_order() {
        let server = MockServer::serve(vec![
            (200, json!({"value": [{"Id": 1}, {"Id": 2}]}).to_string()),
            (200, json!({"value": [{"Id": 3}, {"Id": 4}]}).to_string()),
            (200, json!({"value": [{"Id": 5}]}).to_string()),
        ]);
        let client = test_client();

        let url = format!("{}/odata/Students", server.url);
        let result = client
            .get_chunked(&url, "Id eq {}", &[1, 2, 3, 4, 5], Some(2))
            .await;

        let records = result.unwrap();
        let ids: Vec<u64> = records.iter().filter_map(|r| r["Id"].as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].ends_with("$filter=Id eq 1 or Id eq 2"));
        assert!(requests[1].ends_with("$filter=Id eq 3 or Id eq 4"));
        assert!(requests[2].ends_with("$filter=Id eq 5"));
        server.join();
    }

    #[tokio::test]
    async fn get_chunked_merges_into_an_existing_filter() {
        let server = MockServer::serve(vec![(200, json!({"value": []}).to_string())]);
        let client = test_client();

        let url = format!("{}/odata/Students?$select=Id&$filter=IsActive", server.url);
        let result = client.get_chunked(&url, "Id eq {}", &[7], None).await;

        assert_eq!(result, Some(vec![]));
        assert!(server.requests()[0]
            .ends_with("$select=Id&$filter=(IsActive) and (Id eq 7)"));
        server.join();
    }

    #[tokio::test]
    async fn get_chunked_returns_none_when_a_batch_fails() {
        let server = MockServer::serve(vec![
            (200, json!({"value": [{"Id": 1}]}).to_string()),
            (500, r#"{"error": "boom"}"#.to_string()),
        ]);
        let client = test_client();

        let url = format!("{}/odata/Students", server.url);
        let result = client.get_chunked(&url, "Id eq {}", &[1, 2, 3, 4], Some(1)).await;

        assert!(result.is_none());
        server.join();
    }
}
