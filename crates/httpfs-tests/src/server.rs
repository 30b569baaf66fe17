//! Deterministic in-process HTTP server.
//!
//! Serves canned responses over real sockets and records every request
//! so tests can assert on the traffic the filesystem generated.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use httpfs_core::percent_encode;

/// A canned response for one request target.
#[derive(Debug, Clone)]
pub enum Response {
    /// File content; `Range` headers are honored with a 206 slice.
    File(Vec<u8>),
    /// Body served verbatim, any `Range` header ignored.
    Raw(Vec<u8>),
}

impl Response {
    /// Convenience for JSON listings.
    pub fn listing(json: &str) -> Self {
        Self::Raw(json.as_bytes().to_vec())
    }
}

/// One observed request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request target exactly as sent (percent-encoded)
    pub target: String,
    /// `Range` header value, if any
    pub range: Option<String>,
}

struct ServerState {
    routes: Mutex<HashMap<String, Response>>,
    requests: Mutex<Vec<RecordedRequest>>,
    done: AtomicBool,
}

/// In-process HTTP server bound to an ephemeral loopback port.
///
/// Routes hang off the `/fs` prefix so that percent-encoded filesystem
/// paths appended to [`base_url`](Self::base_url) always form a valid
/// URL.
pub struct TestServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    accept_loop: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Starts a server.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let addr = listener.local_addr().expect("test server address");

        let state = Arc::new(ServerState {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            done: AtomicBool::new(false),
        });

        let accept_state = Arc::clone(&state);
        let accept_loop = thread::spawn(move || {
            for stream in listener.incoming() {
                if accept_state.done.load(Ordering::SeqCst) {
                    break;
                }
                if let Ok(stream) = stream {
                    let state = Arc::clone(&accept_state);
                    thread::spawn(move || serve_connection(stream, state));
                }
            }
        });

        Self {
            addr,
            state,
            accept_loop: Some(accept_loop),
        }
    }

    /// The socket address the server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL the filesystem façade should be configured with.
    pub fn base_url(&self) -> String {
        format!("http://{}/fs", self.addr)
    }

    /// Registers a response for a raw request target.
    pub fn route(&self, target: impl Into<String>, response: Response) {
        self.state.routes.lock().insert(target.into(), response);
    }

    /// Registers a response for an absolute filesystem path, encoded the
    /// way the façade encodes it.
    pub fn route_path(&self, path: &str, response: Response) {
        self.route(format!("/fs{}", percent_encode(path)), response);
    }

    /// All requests observed so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Number of requests observed so far.
    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.state.done.store(true, Ordering::SeqCst);
        // Unblock the accept loop.
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.accept_loop.take() {
            let _ = handle.join();
        }
    }
}

fn serve_connection(mut stream: TcpStream, state: Arc<ServerState>) {
    let Ok(cloned) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(cloned);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let Some(target) = request_line.split_whitespace().nth(1).map(str::to_string) else {
        return;
    };

    let mut range = None;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("range") {
                        range = Some(value.trim().to_string());
                    }
                }
            }
            Err(_) => return,
        }
    }

    state.requests.lock().push(RecordedRequest {
        target: target.clone(),
        range: range.clone(),
    });

    let route = state.routes.lock().get(&target).cloned();
    let (status, body) = match route {
        Some(Response::File(body)) => match range.as_deref().and_then(parse_range) {
            Some((start, end)) => {
                let len = body.len() as u64;
                let from = start.min(len) as usize;
                let to = (end + 1).min(len) as usize;
                ("206 Partial Content", body[from..to.max(from)].to_vec())
            }
            None => ("200 OK", body),
        },
        Some(Response::Raw(body)) => ("200 OK", body),
        None => ("404 Not Found", b"not found".to_vec()),
    };

    let header = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

/// Parses a `bytes=a-b` range value.
fn parse_range(value: &str) -> Option<(u64, u64)> {
    let window = value.strip_prefix("bytes=")?;
    let (start, end) = window.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()?))
}
