//! # OData Client Integration Tests
//!
//! This runner exercises the `lib_odata::ODataClient` end-to-end: plain
//! GETs, response caching, paged retrieval, chunked retrieval, and the
//! forbidden-status policy (soft on GET, fatal on POST).
//!
//! ## Purpose:
//! Instead of depending on an external service, the runner starts a small
//! in-process HTTP listener per scenario that serves scripted responses and
//! records every request line, so the assertions can check both the data
//! that came back and the requests that were issued.
//!
//! These tests are executed asynchronously using `tokio::main`.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

use lib_odata::{LoggerLocal, LoggerLocalOptions, ODataClient, ODataError, QueryCache};

/// Starts a listener that answers the given `(status, body)` responses in
/// order, recording the request line of each connection it serves.
fn spawn_endpoint(
    responses: Vec<(u16, String)>,
) -> (String, Arc<Mutex<Vec<String>>>, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    let handle = thread::spawn(move || {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                break;
            };
            let mut reader = BufReader::new(&mut stream);

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let path = request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or("")
                .replace("%20", " ");
            seen.lock().unwrap().push(path);

            // Drain headers and any request body before answering.
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = line.trim_end();
                        if line.is_empty() {
                            break;
                        }
                        if let Some(value) = line
                            .to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(str::trim)
                            .and_then(|v| v.parse::<usize>().ok())
                        {
                            content_length = value;
                        }
                    }
                    Err(_) => break,
                }
            }
            if content_length > 0 {
                let mut body_buf = vec![0u8; content_length];
                let _ = reader.read_exact(&mut body_buf);
            }

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    (format!("http://127.0.0.1:{}", port), requests, handle)
}

/// In-memory stand-in for the shared redis cache.
struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl QueryCache for MemoryCache {
    fn retrieve(&self, key: &str) -> Option<Value> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn store(&self, key: &str, value: &Value, _ttl_hours: u64) {
        self.entries.lock().unwrap().insert(key.to_string(), value.clone());
    }
}

fn quiet_client() -> ODataClient {
    let logger = Arc::new(LoggerLocal::new(
        "test_odata_http".to_string(),
        Some(LoggerLocalOptions::default()),
    ));
    let mut client = ODataClient::new("svc_test", "secret", logger).expect("client construction");
    client.retries = 0;
    client.retry_sleep = Duration::from_millis(1);
    client
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("--- Starting OData Client Tests ---");

    // --- TEST 1: Plain GET & JSON decoding ---
    println!("\n[Test 1] Testing plain GET...");
    let (url, requests, handle) =
        spawn_endpoint(vec![(200, json!({"value": [1, 2]}).to_string())]);
    let client = quiet_client();
    let body = client.get(&format!("{url}/odata/Terms"), None).await;
    assert_eq!(body, Some(json!({"value": [1, 2]})));
    assert_eq!(requests.lock().unwrap().len(), 1);
    handle.join().unwrap();
    println!("✅ GET decoded the response body");

    // --- TEST 2: Response caching ---
    println!("\n[Test 2] Testing cached GET (one network call for two requests)...");
    let (url, requests, handle) =
        spawn_endpoint(vec![(200, json!({"value": []}).to_string())]);
    let cache = Arc::new(MemoryCache {
        entries: Mutex::new(HashMap::new()),
    });
    let client = quiet_client().with_cache(cache);
    let uri = format!("{url}/odata/Students");
    let first = client.get(&uri, Some(true)).await;
    let second = client.get(&uri, Some(true)).await;
    assert_eq!(first, second);
    assert_eq!(requests.lock().unwrap().len(), 1);
    handle.join().unwrap();
    println!("✅ Second call was served from the cache");

    // --- TEST 3: Paged retrieval ---
    println!("\n[Test 3] Testing paged retrieval across three pages...");
    let page = |records: &[u64]| json!({"@odata.count": 5, "value": records}).to_string();
    let (url, requests, handle) = spawn_endpoint(vec![
        (200, page(&[1, 2])),
        (200, page(&[3, 4])),
        (200, page(&[5])),
    ]);
    let client = quiet_client();
    let result = client
        .get_paged(&format!("{url}/odata/Students"), Some(2), None)
        .await?;
    assert_eq!(result, Some(json!({"value": [1, 2, 3, 4, 5]})));
    {
        let seen = requests.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[2].contains("$skip=4"));
    }
    handle.join().unwrap();
    println!("✅ Accumulated all 5 records in order");

    // --- TEST 4: Paging precondition ---
    println!("\n[Test 4] Testing the $top/$skip/$count usage error...");
    let client = quiet_client();
    let outcome = client
        .get_paged("http://127.0.0.1:1/odata/Students?$top=5", None, None)
        .await;
    assert!(matches!(outcome, Err(ODataError::PagingParams { .. })));
    println!("✅ Usage error raised without a network call");

    // --- TEST 5: Chunked retrieval ---
    println!("\n[Test 5] Testing chunked retrieval filters...");
    let (url, requests, handle) = spawn_endpoint(vec![
        (200, json!({"value": [{"Id": 1}]}).to_string()),
        (200, json!({"value": [{"Id": 3}]}).to_string()),
    ]);
    let client = quiet_client();
    let records = client
        .get_chunked(&format!("{url}/odata/Students"), "Id eq {}", &[1, 3], Some(1))
        .await;
    assert_eq!(records.map(|r| r.len()), Some(2));
    {
        let seen = requests.lock().unwrap();
        assert!(seen[0].ends_with("$filter=Id eq 1"));
        assert!(seen[1].ends_with("$filter=Id eq 3"));
    }
    handle.join().unwrap();
    println!("✅ One request per chunk with the expected filters");

    // --- TEST 6: Forbidden policy ---
    println!("\n[Test 6] Testing GET-403 (soft) vs POST-403 (fatal)...");
    let (url, _requests, handle) =
        spawn_endpoint(vec![(403, json!({"error": "denied"}).to_string())]);
    let client = quiet_client();
    let body = client.get(&format!("{url}/odata/Students"), None).await;
    assert!(body.is_none());
    handle.join().unwrap();

    let (url, _requests, handle) =
        spawn_endpoint(vec![(403, json!({"error": "denied"}).to_string())]);
    let client = quiet_client();
    let payload = json!({"id": 1});
    let outcome = client
        .post(&url, Some("commands/reenroll"), Some(&payload), None)
        .await;
    assert!(matches!(outcome, Err(ODataError::AccessDenied { .. })));
    handle.join().unwrap();
    println!("✅ GET stayed soft, POST escalated");

    println!("\n--- All Tests Passed Successfully ---");
    Ok(())
}
