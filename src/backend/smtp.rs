use std::net::ToSocketAddrs;
use std::path::Path;
use std::time::Duration;

use lettre::smtp::authentication::Credentials;
use lettre::smtp::client::net::ClientTlsParameters;
use lettre::smtp::response::Severity;
use lettre::smtp::{ClientSecurity, SmtpClient};
use lettre::Transport;
use lettre_email::{Email, EmailBuilder};
use native_tls::{Protocol, TlsConnector};

use crate::cancel::CancelToken;
use crate::config::SmtpConfig;
use crate::dispatch::{dispatch, SendStatus};
use crate::error::Error;
use crate::message::BodyKind;
use crate::Mailer;

/// Delivers through a single authenticated SMTP relay, one connection per
/// recipient.
#[derive(Clone, Debug)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> SmtpMailer {
        SmtpMailer { config }
    }
}

impl Mailer for SmtpMailer {
    fn send_simple(
        &self,
        cancel: &CancelToken,
        to: &[String],
        subject: &str,
        body: &str,
        kind: BodyKind,
    ) -> Result<SendStatus, Error> {
        let mailer = self.clone();
        let subject = subject.to_owned();
        let body = body.to_owned();
        dispatch(cancel, to, move |recipient| {
            let email = build_simple(&mailer.config, recipient, &subject, &body, kind)?;
            deliver(&mailer.config, email)
        })
    }

    fn send_with_file(
        &self,
        cancel: &CancelToken,
        to: &[String],
        subject: &str,
        file_path: &Path,
    ) -> Result<SendStatus, Error> {
        let mailer = self.clone();
        let subject = subject.to_owned();
        let file_path = file_path.to_owned();
        dispatch(cancel, to, move |recipient| {
            let email = build_with_file(&mailer.config, recipient, &subject, &file_path)?;
            deliver(&mailer.config, email)
        })
    }
}

pub(crate) fn build_simple(
    config: &SmtpConfig,
    recipient: &str,
    subject: &str,
    body: &str,
    kind: BodyKind,
) -> Result<Email, Error> {
    let builder = EmailBuilder::new()
        .from(config.from_email.as_str())
        .to(recipient)
        .subject(subject);
    let builder = match kind {
        BodyKind::Plain => builder.text(body),
        BodyKind::Html => builder.html(body),
    };
    builder.build().map_err(Error::from)
}

pub(crate) fn build_with_file(
    config: &SmtpConfig,
    recipient: &str,
    subject: &str,
    path: &Path,
) -> Result<Email, Error> {
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    EmailBuilder::new()
        .from(config.from_email.as_str())
        .to(recipient)
        .subject(subject)
        .attachment_from_file(path, None, &content_type)?
        .build()
        .map_err(Error::from)
}

/// Hand one built message to the relay. Dial and send failures surface
/// verbatim as the attempt's error.
pub(crate) fn deliver(config: &SmtpConfig, email: Email) -> Result<(), Error> {
    // The relay is trusted by configuration; certificate validation is
    // deliberately relaxed so self-signed relays keep working.
    let tls = TlsConnector::builder()
        .min_protocol_version(Some(Protocol::Tlsv12))
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()?;
    let tls_parameters = ClientTlsParameters::new(config.host.clone(), tls);

    let sockaddr = match (config.host.as_str(), config.port).to_socket_addrs()?.next() {
        Some(sa) => sa,
        None => {
            return Err(Error::SmtpAddress {
                host: config.host.clone(),
                port: config.port,
            });
        }
    };

    let client = SmtpClient::new(sockaddr, ClientSecurity::Required(tls_parameters))?
        .credentials(Credentials::new(
            config.from_email.clone(),
            config.password.clone(),
        ))
        .smtp_utf8(true)
        .timeout(Some(Duration::from_secs(config.timeout_secs)));

    let mut mailer = client.transport();
    let result = mailer.send(email.into());
    mailer.close();

    let response = result?;
    match response.code.severity {
        Severity::PositiveCompletion | Severity::PositiveIntermediate => {
            debug!("delivered via {}: {:?}", config.host, response);
            Ok(())
        }
        _ => Err(Error::Provider(format!("{:?}", response))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            from_email: "sender@example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn builds_plain_and_html_messages() {
        let config = config();
        build_simple(&config, "user@example.com", "Hi", "Body", BodyKind::Plain).unwrap();
        build_simple(
            &config,
            "user@example.com",
            "Hi",
            "<b>Body</b>",
            BodyKind::Html,
        )
        .unwrap();
    }

    #[test]
    fn missing_attachment_fails_the_build() {
        let result = build_with_file(
            &config(),
            "user@example.com",
            "Hi",
            Path::new("/no/such/file.pdf"),
        );
        assert!(result.is_err());
    }
}
