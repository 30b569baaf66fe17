//! The request-driving worker loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use reqwest::header::RANGE;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, trace};

use crate::request::{Submission, WriteSink};
use crate::{ClientConfig, ClientError};

/// Redirect chains longer than this are treated as transport failures.
const MAX_REDIRECTS: usize = 5;

/// Upper bound on a single idle wait of the worker.
const IDLE_WAIT: Duration = Duration::from_secs(10);

pub(crate) fn build_transport(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .referer(true)
        .connect_timeout(config.connect_timeout)
        .timeout(config.transfer_timeout);

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::Setup(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| ClientError::Setup(e.to_string()))
}

/// Worker thread entry point.
pub(crate) fn run(
    transport: reqwest::Client,
    queue: UnboundedReceiver<Submission>,
    shutdown: Arc<AtomicBool>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            // Waiting callers observe the closed queue and fail.
            error!(error = %e, "Could not start the request worker runtime");
            return;
        }
    };

    runtime.block_on(drive_requests(transport, queue, shutdown));
}

/// Multiplexes every in-flight request on the worker.
///
/// A submission-channel send doubles as the wakeup: the `select!` below
/// resumes as soon as new work arrives, a request makes progress, or the
/// idle bound elapses.
async fn drive_requests(
    transport: reqwest::Client,
    mut queue: UnboundedReceiver<Submission>,
    shutdown: Arc<AtomicBool>,
) {
    let mut in_flight = FuturesUnordered::new();

    loop {
        tokio::select! {
            submission = queue.recv() => match submission {
                // A submission still buffered when shutdown began is
                // discarded unstarted; its sinks drop uninvoked.
                Some(submission) if shutdown.load(Ordering::SeqCst) => drop(submission),
                Some(submission) => in_flight.push(perform(transport.clone(), submission)),
                // Queue closed and drained: exit. In-flight requests are
                // dropped without firing their completion sinks; the
                // owner has abandoned them.
                None => break,
            },
            Some(()) = in_flight.next() => {}
            _ = tokio::time::sleep(IDLE_WAIT) => {
                trace!(in_flight = in_flight.len(), "Idle wait elapsed");
            }
        }
    }
}

/// Drives one request to completion and fires its completion sink.
async fn perform(transport: reqwest::Client, submission: Submission) {
    let range = submission.range_header();
    let Submission {
        url,
        mut write,
        done,
        ..
    } = submission;

    let ok = transfer(&transport, &url, range, &mut write).await;
    debug!(url = %url, ok = ok, "Request finished");
    done(ok);
}

/// Streams the response body into the write sink.
///
/// Only transport-level outcomes count: an HTTP error status whose body
/// arrives intact still reports success, and the sink receives whatever
/// body the server sent. Callers that care about content reject it when
/// parsing.
async fn transfer(
    transport: &reqwest::Client,
    url: &str,
    range: Option<String>,
    write: &mut WriteSink,
) -> bool {
    let mut request = transport.get(url);
    if let Some(range) = range {
        request = request.header(RANGE, range);
    }

    let mut response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url = url, error = %e, "Request failed");
            return false;
        }
    };

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if !write(&chunk) {
                    debug!(url = url, "Transfer aborted by sink");
                    return false;
                }
            }
            Ok(None) => return true,
            Err(e) => {
                debug!(url = url, error = %e, "Body transfer failed");
                return false;
            }
        }
    }
}
