/// Connection settings for an authenticated SMTP relay.
///
/// These are plain constructor parameters; the crate has no flag or
/// environment surface of its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Sender address, also used as the authentication username.
    pub from_email: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 465,
            from_email: String::new(),
            password: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Settings for the Elastic Email backend: SMTP delivery plus the v4 API
/// credentials used for contact-list management.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticEmailConfig {
    pub smtp: SmtpConfig,
    pub api_key: String,
    pub list_name: String,
    /// API base URL, overridable so tests can target a local server.
    pub api_base: String,
}

impl Default for ElasticEmailConfig {
    fn default() -> ElasticEmailConfig {
        ElasticEmailConfig {
            smtp: SmtpConfig::default(),
            api_key: String::new(),
            list_name: String::new(),
            api_base: "https://api.elasticemail.com".to_string(),
        }
    }
}

/// Settings for the Unisender backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UnisenderConfig {
    pub sender_name: String,
    pub sender_email: String,
    pub api_key: String,
    /// Message body used for file sends; the form API always wants one.
    pub signature: String,
    /// API base URL, overridable so tests can target a local server.
    pub api_base: String,
}

impl Default for UnisenderConfig {
    fn default() -> UnisenderConfig {
        UnisenderConfig {
            sender_name: String::new(),
            sender_email: String::new(),
            api_key: String::new(),
            signature: String::new(),
            api_base: "https://api.unisender.com/ru".to_string(),
        }
    }
}
