use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::config::UnisenderConfig;
use crate::dispatch::{dispatch, SendStatus};
use crate::error::Error;
use crate::message::{Attachment, BodyKind};
use crate::Mailer;

/// Status string the provider reports for an accepted message.
const STATUS_SENT: &str = "ok_sent";

/// Highest HTTP status the send endpoint may return for an accepted
/// submission.
const MAX_ACCEPT_STATUS: u16 = 250;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    result: SubmitResult,
}

#[derive(Default, Deserialize)]
struct SubmitResult {
    #[serde(default)]
    email_id: Value,
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    result: CheckResult,
}

#[derive(Default, Deserialize)]
struct CheckResult {
    #[serde(default)]
    statuses: Vec<MessageStatus>,
}

#[derive(Debug, Deserialize)]
struct MessageStatus {
    #[allow(dead_code)]
    id: i64,
    status: String,
}

/// Sends through Unisender's form API. The provider's HTTP accept of a
/// submission does not guarantee delivery, so every attempt runs two
/// phases: submit, then poll the status endpoint until the submission is
/// confirmed sent or rejected.
#[derive(Clone, Debug)]
pub struct UnisenderMailer {
    config: UnisenderConfig,
    http: Client,
}

impl UnisenderMailer {
    pub fn new(config: UnisenderConfig) -> Result<UnisenderMailer, Error> {
        let http = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(UnisenderMailer { config, http })
    }

    fn base_form(&self, to: &str, subject: &str, body: &str) -> Vec<(String, String)> {
        vec![
            ("format".to_string(), "json".to_string()),
            ("api_key".to_string(), self.config.api_key.clone()),
            ("sender_name".to_string(), self.config.sender_name.clone()),
            ("email".to_string(), to.to_string()),
            ("sender_email".to_string(), self.config.sender_email.clone()),
            ("subject".to_string(), subject.to_string()),
            ("body".to_string(), body.to_string()),
            ("wrap_type".to_string(), "STRING".to_string()),
            ("list_id".to_string(), "1".to_string()),
        ]
    }

    /// Phase one: submit the message. Returns the submission id used to
    /// confirm delivery.
    fn submit(&self, form: &[(String, String)]) -> Result<String, Error> {
        let url = format!("{}/api/sendEmail", self.config.api_base);
        let response = self.http.post(&url).form(form).send()?;
        let status = response.status().as_u16();
        if status > MAX_ACCEPT_STATUS {
            return Err(Error::UnexpectedStatus(status));
        }
        // The provider is loose about this body; an undecodable one just
        // means we poll with an empty id.
        let decoded = response.json::<SubmitResponse>().unwrap_or_default();
        Ok(id_string(&decoded.result.email_id))
    }

    /// Phase two: confirm the submission was actually sent. Confirmed only
    /// if at least one status came back and every one of them is
    /// [`STATUS_SENT`].
    fn check_status(&self, id: &str) -> Result<(), Error> {
        let url = format!("{}/api/checkEmail", self.config.api_base);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("format", "json"),
                ("api_key", self.config.api_key.as_str()),
                ("email_id", id),
            ])
            .send()?;
        let decoded: CheckResponse = response.json()?;
        let statuses = decoded.result.statuses;
        if statuses.is_empty() || statuses.iter().any(|s| s.status != STATUS_SENT) {
            info!("submission {} not confirmed: {:?}", id, statuses);
            return Err(Error::NotConfirmed);
        }
        Ok(())
    }

    fn attempt(&self, form: Vec<(String, String)>) -> Result<(), Error> {
        let id = self.submit(&form)?;
        self.check_status(&id)
    }
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

impl Mailer for UnisenderMailer {
    // The content-type tag is not part of this provider's form API; the
    // body is wrapped by the provider itself.
    fn send_simple(
        &self,
        cancel: &CancelToken,
        to: &[String],
        subject: &str,
        body: &str,
        _kind: BodyKind,
    ) -> Result<SendStatus, Error> {
        let mailer = self.clone();
        let subject = subject.to_owned();
        let body = body.to_owned();
        dispatch(cancel, to, move |recipient| {
            let form = mailer.base_form(recipient, &subject, &body);
            mailer.attempt(form)
        })
    }

    fn send_with_file(
        &self,
        cancel: &CancelToken,
        to: &[String],
        subject: &str,
        file_path: &Path,
    ) -> Result<SendStatus, Error> {
        // Resolve the attachment once, before any network activity; a read
        // failure aborts the whole call.
        let attachment = Attachment::from_path(file_path)?;
        let mailer = self.clone();
        let subject = subject.to_owned();
        dispatch(cancel, to, move |recipient| {
            let mut form = mailer.base_form(recipient, &subject, &mailer.config.signature);
            form.push((
                format!("attachments[{}]", attachment.file_name),
                String::from_utf8_lossy(&attachment.content).into_owned(),
            ));
            mailer.attempt(form)
        })
    }
}
