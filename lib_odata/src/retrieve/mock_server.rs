//! Test-only scripted HTTP endpoint.
//!
//! Serves a fixed sequence of canned responses on an ephemeral local port,
//! one connection per response, and records the request line of every
//! request it answers so tests can assert on call counts and query
//! parameters.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

pub(crate) struct MockServer {
    /// Base URL of the listener, e.g. `http://127.0.0.1:49152`.
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: thread::JoinHandle<()>,
}

impl MockServer {
    /// Starts a listener that answers the given `(status, body)` responses
    /// in order, then exits.
    pub fn serve(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    break;
                };
                Self::answer(stream, &seen, status, &body);
            }
        });

        Self {
            url: format!("http://127.0.0.1:{}", port),
            requests,
            handle,
        }
    }

    /// Request paths answered so far, in arrival order, with `%20` unescaped
    /// for readable assertions.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|line| line.replace("%20", " "))
            .collect()
    }

    /// Waits for the listener thread to finish its script.
    pub fn join(self) {
        let _ = self.handle.join();
    }

    fn answer(
        mut stream: std::net::TcpStream,
        seen: &Arc<Mutex<Vec<String>>>,
        status: u16,
        body: &str,
    ) {
        let mut reader = BufReader::new(&mut stream);

        // Request line: "GET /path?query HTTP/1.1"
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        let path = request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or("")
            .to_string();
        seen.lock().unwrap().push(path);

        // Drain the headers, remembering the body length for POSTs.
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
                Err(_) => return,
            }
        }
        if content_length > 0 {
            let mut request_body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut request_body);
        }

        let reason = match status {
            200 => "OK",
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            500 => "Internal Server Error",
            _ => "Status",
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    }
}
