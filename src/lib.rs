//! Mailfan sends one message to many recipients at once, through a
//! pluggable delivery backend.
//!
//! Three backends implement the [`Mailer`] capability:
//!
//! * [`SmtpMailer`] delivers through an authenticated SMTP relay.
//! * [`ElasticEmailMailer`] does the same, but keeps senders and recipients
//!   registered in a remote Elastic Email contact list.
//! * [`UnisenderMailer`] submits through Unisender's form API and polls the
//!   status endpoint to confirm each submission was actually sent.
//!
//! Every send call fans out one concurrent delivery attempt per recipient
//! and reports a single aggregated verdict: `Ok(SendStatus::Delivered)` when
//! every attempt succeeded, `Ok(SendStatus::Cancelled)` when the caller's
//! [`CancelToken`] fired first, or the first attempt error observed.
//!
//! Mailfan does not queue, retry or persist anything; a failed send is the
//! caller's problem to handle.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod message;

mod dispatch;

#[cfg(test)]
mod tests;

use std::path::Path;

pub use crate::backend::elastic_email::ElasticEmailMailer;
pub use crate::backend::smtp::SmtpMailer;
pub use crate::backend::unisender::UnisenderMailer;
pub use crate::cancel::CancelToken;
pub use crate::config::{ElasticEmailConfig, SmtpConfig, UnisenderConfig};
pub use crate::dispatch::SendStatus;
pub use crate::error::Error;
pub use crate::message::{Attachment, BodyKind};

/// The capability every delivery backend implements.
///
/// Given N recipients, exactly N independent delivery attempts are made,
/// concurrently. The call blocks until every attempt has reported or the
/// cancellation token fires, whichever comes first. An empty recipient list
/// is a successful no-op with no network activity.
pub trait Mailer {
    /// Send a plain-text or HTML message to every recipient.
    fn send_simple(
        &self,
        cancel: &CancelToken,
        to: &[String],
        subject: &str,
        body: &str,
        kind: BodyKind,
    ) -> Result<SendStatus, Error>;

    /// Send a message carrying the file at `file_path` as its attachment
    /// instead of a body.
    fn send_with_file(
        &self,
        cancel: &CancelToken,
        to: &[String],
        subject: &str,
        file_path: &Path,
    ) -> Result<SendStatus, Error>;
}
