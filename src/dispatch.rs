use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::Error;

/// How often the drain loop re-checks the cancellation flag while waiting
/// for attempt outcomes.
const CANCEL_POLL: Duration = Duration::from_millis(25);

/// The verdict of a completed send call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendStatus {
    /// Every recipient attempt completed without error.
    Delivered,
    /// The caller's cancellation fired before all attempts had reported.
    /// Attempts still in flight were abandoned and their results discarded.
    Cancelled,
}

struct AttemptOutcome {
    recipient: String,
    result: Result<(), Error>,
}

/// Attempt delivery to every recipient concurrently and aggregate the
/// outcomes into one verdict.
///
/// One worker thread is launched per recipient (duplicates included), all of
/// them before any outcome is drained, so a slow or failing address cannot
/// delay the others. The drain loop is the single synchronization point: it
/// holds the caller until every attempt has reported, or returns
/// `Cancelled` as soon as the token fires. If one or more attempts failed,
/// the first error received is returned once all attempts are in; the rest
/// are logged.
pub(crate) fn dispatch<F>(
    cancel: &CancelToken,
    recipients: &[String],
    attempt: F,
) -> Result<SendStatus, Error>
where
    F: Fn(&str) -> Result<(), Error> + Send + Sync + 'static,
{
    if recipients.is_empty() {
        return Ok(SendStatus::Delivered);
    }

    let attempt = Arc::new(attempt);
    let (tx, rx) = mpsc::channel();

    for recipient in recipients {
        let attempt = Arc::clone(&attempt);
        let tx = tx.clone();
        let recipient = recipient.clone();
        thread::spawn(move || {
            let result = attempt(&recipient);
            // The receiver is gone if the dispatch was cancelled.
            let _ = tx.send(AttemptOutcome { recipient, result });
        });
    }
    drop(tx);

    let mut first_error: Option<Error> = None;
    let mut remaining = recipients.len();
    while remaining > 0 {
        if cancel.is_cancelled() {
            debug!(
                "dispatch cancelled with {} attempt(s) still in flight",
                remaining
            );
            return Ok(SendStatus::Cancelled);
        }
        match rx.recv_timeout(CANCEL_POLL) {
            Ok(outcome) => {
                remaining -= 1;
                if let Err(e) = outcome.result {
                    warn!("delivery to {} failed: {}", outcome.recipient, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(SendStatus::Delivered),
    }
}
