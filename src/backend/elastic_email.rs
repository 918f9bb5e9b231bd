use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_LANGUAGE, CONNECTION};
use reqwest::StatusCode;

use crate::backend::smtp;
use crate::cancel::CancelToken;
use crate::config::ElasticEmailConfig;
use crate::dispatch::{dispatch, SendStatus};
use crate::error::Error;
use crate::message::BodyKind;
use crate::Mailer;

/// The provider's duplicate-list rejection message. Matching it
/// (case-insensitively) keeps list creation idempotent.
const DUPLICATE_LIST: &str = "A list with the given name already exists.";

/// Locale preference pinned on every API request.
const LOCALE: &str = "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7,zh-TW;q=0.6,zh-CN;q=0.5,zh;q=0.4";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct CreateList<'a> {
    #[serde(rename = "ListName")]
    list_name: &'a str,
}

#[derive(Serialize)]
struct AddContacts<'a> {
    #[serde(rename = "Emails")]
    emails: [&'a str; 1],
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "Error")]
    error: String,
}

/// Sends over SMTP like [`crate::SmtpMailer`], but keeps the sender and
/// every recipient registered in a remote Elastic Email contact list.
#[derive(Clone, Debug)]
pub struct ElasticEmailMailer {
    config: ElasticEmailConfig,
    http: Client,
}

impl ElasticEmailMailer {
    /// Build the backend. Remote setup happens in [`initialize`], not here,
    /// so construction problems and provider rejections stay
    /// distinguishable.
    ///
    /// [`initialize`]: ElasticEmailMailer::initialize
    pub fn new(config: ElasticEmailConfig) -> Result<ElasticEmailMailer, Error> {
        // Same relaxed transport policy as the SMTP path.
        let http = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(ElasticEmailMailer { config, http })
    }

    /// Idempotent remote setup: create the configured contact list and
    /// register the sender address in it.
    pub fn initialize(&self) -> Result<(), Error> {
        self.create_list()?;
        self.add_contact(&self.config.smtp.from_email)
    }

    /// Create the contact list. An already-existing list is success.
    pub fn create_list(&self) -> Result<(), Error> {
        let url = format!("{}/v4/lists", self.config.api_base);
        let response = self
            .http
            .post(&url)
            .header("X-ElasticEmail-ApiKey", &self.config.api_key)
            .header(ACCEPT_LANGUAGE, LOCALE)
            .header(CONNECTION, "keep-alive")
            .json(&CreateList {
                list_name: &self.config.list_name,
            })
            .send()?;
        if response.status() == StatusCode::CREATED {
            debug!("contact list {} created", self.config.list_name);
            return Ok(());
        }
        let err = rejection(response);
        if let Error::Provider(ref msg) = err {
            if msg.eq_ignore_ascii_case(DUPLICATE_LIST) {
                debug!("contact list {} already exists", self.config.list_name);
                return Ok(());
            }
        }
        Err(err)
    }

    /// Register `email` in the contact list. Re-adding an existing contact
    /// is not an error on the provider side.
    pub fn add_contact(&self, email: &str) -> Result<(), Error> {
        let url = format!(
            "{}/v4/lists/{}/contacts",
            self.config.api_base, self.config.list_name
        );
        let response = self
            .http
            .post(&url)
            .header("X-ElasticEmail-ApiKey", &self.config.api_key)
            .header(ACCEPT_LANGUAGE, LOCALE)
            .header(CONNECTION, "keep-alive")
            .json(&AddContacts { emails: [email] })
            .send()?;
        if response.status().as_u16() <= 300 {
            return Ok(());
        }
        Err(rejection(response))
    }

    // Best effort: a registration failure must not abort the delivery
    // attempt, which may still succeed.
    fn register(&self, recipient: &str) {
        if let Err(e) = self.add_contact(recipient) {
            warn!(
                "could not register {} in list {}: {}",
                recipient, self.config.list_name, e
            );
        }
    }
}

/// Map a non-success response to a provider rejection if its body parses,
/// or the generic unexpected-status error if it does not.
fn rejection(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = match response.text() {
        Ok(body) => body,
        Err(e) => return Error::Http(e),
    };
    match serde_json::from_str::<ApiError>(&body) {
        Ok(api) => Error::Provider(api.error),
        Err(_) => Error::UnexpectedStatus(status),
    }
}

impl Mailer for ElasticEmailMailer {
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
            mailer.register(recipient);
            let email = smtp::build_simple(&mailer.config.smtp, recipient, &subject, &body, kind)?;
            smtp::deliver(&mailer.config.smtp, email)
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
            mailer.register(recipient);
            let email =
                smtp::build_with_file(&mailer.config.smtp, recipient, &subject, &file_path)?;
            smtp::deliver(&mailer.config.smtp, email)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;

    fn mailer(api_base: String) -> ElasticEmailMailer {
        ElasticEmailMailer::new(ElasticEmailConfig {
            smtp: SmtpConfig {
                from_email: "sender@example.com".to_string(),
                ..Default::default()
            },
            api_key: "test-key".to_string(),
            list_name: "customers".to_string(),
            api_base,
        })
        .unwrap()
    }

    #[test]
    fn create_list_treats_duplicate_as_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v4/lists")
            .match_header("X-ElasticEmail-ApiKey", "test-key")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Error":"A list with the given name already exists."}"#)
            .expect(2)
            .create();

        let mailer = mailer(server.url());
        mailer.create_list().unwrap();
        // Repeating the create for the same name succeeds as well.
        mailer.create_list().unwrap();
        mock.assert();
    }

    #[test]
    fn create_list_accepts_created_status() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/v4/lists").with_status(201).create();
        mailer(server.url()).create_list().unwrap();
        mock.assert();
    }

    #[test]
    fn create_list_surfaces_provider_message() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v4/lists")
            .with_status(400)
            .with_body(r#"{"Error":"Invalid API key."}"#)
            .create();
        let err = mailer(server.url()).create_list().unwrap_err();
        assert_eq!(err.to_string(), "Invalid API key.");
    }

    #[test]
    fn unparsable_rejection_is_reported_generically() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v4/lists")
            .with_status(503)
            .with_body("<html>gateway timeout</html>")
            .create();
        let err = mailer(server.url()).create_list().unwrap_err();
        match err {
            Error::UnexpectedStatus(503) => {}
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[test]
    fn add_contact_posts_to_the_list() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v4/lists/customers/contacts")
            .match_body(mockito::Matcher::JsonString(
                r#"{"Emails":["user@example.com"]}"#.to_string(),
            ))
            .with_status(200)
            .create();
        mailer(server.url()).add_contact("user@example.com").unwrap();
        mock.assert();
    }

    #[test]
    fn initialize_creates_list_and_registers_sender() {
        let mut server = mockito::Server::new();
        let create = server.mock("POST", "/v4/lists").with_status(201).create();
        let add = server
            .mock("POST", "/v4/lists/customers/contacts")
            .match_body(mockito::Matcher::JsonString(
                r#"{"Emails":["sender@example.com"]}"#.to_string(),
            ))
            .with_status(200)
            .create();
        mailer(server.url()).initialize().unwrap();
        create.assert();
        add.assert();
    }
}
