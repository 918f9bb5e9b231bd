use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while sending.
///
/// A send call surfaces the first attempt error observed; nothing here is
/// retried by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// SMTP dial or send failure, surfaced verbatim.
    #[error(transparent)]
    Smtp(#[from] lettre::smtp::error::Error),

    /// Message construction failure (bad address, unreadable attachment).
    #[error(transparent)]
    EmailBuilder(#[from] lettre_email::error::Error),

    #[error(transparent)]
    Tls(#[from] native_tls::Error),

    /// HTTP transport failure reaching a provider endpoint, or a response
    /// body that did not decode.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("no socket address for {host}:{port}")]
    SmtpAddress { host: String, port: u16 },

    #[error("attachment path {0:?} has no file name")]
    BadAttachmentPath(PathBuf),

    /// Rejection parsed out of a provider error body; the provider's
    /// message, verbatim.
    #[error("{0}")]
    Provider(String),

    /// Non-success HTTP status whose body did not carry a parsable error.
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    /// The polling provider accepted the submission but never reported it
    /// sent.
    #[error("email was not sent successfully")]
    NotConfirmed,
}
