//! httpfs Client - asynchronous HTTP fetching for the remote filesystem.
//!
//! One dedicated worker thread drives every request; submissions arrive
//! from any thread through a channel that doubles as the worker's wakeup
//! signal, so a new request never waits out an idle period. Each request
//! carries a chunk sink and a one-shot completion sink; completions fire
//! exactly once per delivered request.

#![warn(missing_docs, rust_2018_idioms)]

mod request;
mod worker;

pub use request::{DoneSink, WriteSink};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::request::Submission;

/// Default connection establishment timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default whole-transfer timeout.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client tuning.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Optional proxy URL applied to every request. Environment proxy
    /// variables are honored either way.
    pub proxy: Option<String>,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Whole-transfer timeout
    pub transfer_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout: CONNECT_TIMEOUT,
            transfer_timeout: TRANSFER_TIMEOUT,
        }
    }
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Building the transport failed
    #[error("Transport setup failed: {0}")]
    Setup(String),

    /// The request failed at the transport level
    #[error("Transfer failed")]
    Transfer,

    /// The worker is gone; the client has shut down
    #[error("Client is shut down")]
    Shutdown,
}

/// Asynchronous HTTP client.
///
/// All requests are GETs, optionally windowed by a byte range. Dropping
/// the client shuts the worker down; requests still pending at that
/// point are discarded and their completion sinks never fire.
pub struct HttpClient {
    queue: Option<mpsc::UnboundedSender<Submission>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl HttpClient {
    /// Creates a client and starts its worker thread.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = worker::build_transport(&config)?;
        let (queue, submissions) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&shutdown);
        let worker = thread::Builder::new()
            .name("httpfs-http".to_string())
            .spawn(move || worker::run(transport, submissions, flag))
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self {
            queue: Some(queue),
            shutdown,
            worker: Some(worker),
        })
    }

    /// Enqueues an asynchronous GET. Never blocks.
    ///
    /// `write` receives each body chunk as it arrives; returning `false`
    /// aborts the transfer. `done` fires exactly once with the transport
    /// outcome. A request `[offset, offset + size)` with a nonzero
    /// window is sent with a `Range` header.
    ///
    /// Submitting against a client that is shutting down drops both
    /// sinks uninvoked.
    pub fn submit(&self, url: &str, offset: u64, size: u64, write: WriteSink, done: DoneSink) {
        let submission = Submission {
            url: url.to_string(),
            offset,
            size,
            write,
            done,
        };

        if let Some(queue) = &self.queue {
            if queue.send(submission).is_ok() {
                return;
            }
        }
        debug!(url = url, "Submission dropped, client is shutting down");
    }

    /// Performs a GET and blocks until it completes.
    ///
    /// The body is returned on transport success whatever its HTTP
    /// status was; content-level validation is the caller's concern.
    pub fn get(&self, url: &str, offset: u64, size: u64) -> Result<Vec<u8>, ClientError> {
        let body = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&body);
        let (done_tx, done_rx) = std_mpsc::channel();

        self.submit(
            url,
            offset,
            size,
            Box::new(move |chunk: &[u8]| {
                sink.lock().extend_from_slice(chunk);
                true
            }),
            Box::new(move |ok| {
                let _ = done_tx.send(ok);
            }),
        );

        match done_rx.recv() {
            Ok(true) => Ok(std::mem::take(&mut *body.lock())),
            Ok(false) => Err(ClientError::Transfer),
            Err(_) => Err(ClientError::Shutdown),
        }
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        // The flag goes up before the queue closes, so submissions the
        // worker has yet to receive are discarded unstarted; anything
        // already in flight is dropped when the loop exits. Neither
        // fires its completion sink.
        self.shutdown.store(true, Ordering::SeqCst);
        self.queue.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
