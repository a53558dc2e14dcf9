//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves canned replies keyed by request path and records every GET path, so
//! tests can assert how many round trips a fetch made. Every response closes
//! the connection.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One canned response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    /// 200 with `application/octet-stream` and a correct `Content-Length`.
    pub fn raw(body: &[u8]) -> Self {
        Self {
            status: "200 OK",
            headers: vec![
                ("Content-Type".into(), "application/octet-stream".into()),
                ("Content-Length".into(), body.len().to_string()),
            ],
            body: body.to_vec(),
        }
    }

    /// 200 metadata document.
    pub fn metadata(doc: &str) -> Self {
        Self {
            status: "200 OK",
            headers: vec![
                ("Content-Type".into(), "application/vnd.git-media+json".into()),
                ("Content-Length".into(), doc.len().to_string()),
            ],
            body: doc.as_bytes().to_vec(),
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: "302 Found",
            headers: vec![
                ("Location".into(), location.into()),
                ("Content-Length".into(), "0".into()),
            ],
            body: Vec::new(),
        }
    }

    pub fn status(status: &'static str, body: &str) -> Self {
        Self {
            status,
            headers: vec![
                ("Content-Type".into(), "text/plain".into()),
                ("Content-Length".into(), body.len().to_string()),
            ],
            body: body.as_bytes().to_vec(),
        }
    }

    /// Replaces (or adds) a header, e.g. a `Content-Length` larger than the body.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Drops a header (e.g. to simulate a missing `Content-Length`).
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }
}

/// Handle to a running server.
#[derive(Clone)]
pub struct ObjectServer {
    base: String,
    hits: Arc<Mutex<Vec<String>>>,
    seen_headers: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl ObjectServer {
    /// Starts a server; `routes` receives the base URL (`http://127.0.0.1:PORT`)
    /// so replies can point back at the server.
    pub fn start<F>(routes: F) -> Self
    where
        F: FnOnce(&str) -> HashMap<String, Reply>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let base = format!("http://127.0.0.1:{}", port);
        let routes = Arc::new(routes(&base));
        let server = Self {
            base,
            hits: Arc::default(),
            seen_headers: Arc::default(),
        };
        let handle = server.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let handle = handle.clone();
                thread::spawn(move || handle.serve(stream, &routes));
            }
        });
        server
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// GET paths received so far, in order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    /// Raw header lines of the requests received for `path`.
    pub fn headers_for(&self, path: &str) -> Vec<String> {
        self.seen_headers
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .flat_map(|(_, h)| h.clone())
            .collect()
    }

    fn serve(&self, mut stream: TcpStream, routes: &HashMap<String, Reply>) {
        let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
        let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
        let request = match read_request(&mut stream) {
            Some(r) => r,
            None => return,
        };
        let mut lines = request.lines();
        let request_line = lines.next().unwrap_or("");
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or("");
        let path = parts.next().unwrap_or("").to_string();
        let headers: Vec<String> = lines
            .take_while(|l| !l.trim().is_empty())
            .map(|l| l.trim().to_string())
            .collect();

        if !method.eq_ignore_ascii_case("GET") {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        self.hits.lock().unwrap().push(path.clone());
        self.seen_headers.lock().unwrap().push((path.clone(), headers));

        let reply = routes
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Reply::status("404 Not Found", "not found"));
        let mut head = format!("HTTP/1.1 {}\r\n", reply.status);
        for (name, value) in &reply.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("Connection: close\r\n\r\n");
        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&reply.body);
        let _ = stream.flush();
    }
}

/// Reads until the end of the request head.
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
    }
    String::from_utf8(data).ok()
}

/// Route table helper: `routes(&[("/media/objects/oid", reply)])`.
pub fn routes(entries: Vec<(&str, Reply)>) -> HashMap<String, Reply> {
    entries
        .into_iter()
        .map(|(path, reply)| (path.to_string(), reply))
        .collect()
}

/// A local URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/media", port)
}
