//! Request state handed to the worker.

/// Sink receiving response-body chunks as they arrive.
///
/// Returning `false` aborts the transfer; the request then completes
/// with a failure outcome.
pub type WriteSink = Box<dyn FnMut(&[u8]) -> bool + Send>;

/// One-shot completion sink; `true` means the transfer succeeded at the
/// transport level.
pub type DoneSink = Box<dyn FnOnce(bool) + Send>;

/// A submitted GET waiting for the worker to pick it up.
pub(crate) struct Submission {
    pub(crate) url: String,
    pub(crate) offset: u64,
    pub(crate) size: u64,
    pub(crate) write: WriteSink,
    pub(crate) done: DoneSink,
}

impl Submission {
    /// The `Range` header value, present iff a nonzero window was asked
    /// for.
    pub(crate) fn range_header(&self) -> Option<String> {
        if self.offset == 0 && self.size == 0 {
            None
        } else {
            Some(format!(
                "bytes={}-{}",
                self.offset,
                self.offset + self.size - 1
            ))
        }
    }
}
