use std::fmt;

use serde::{Deserialize, Serialize};

/// One-time code shown in the browser and dialed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationCode(pub u64);

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw phone number of a caller. Never sent to the opposing player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

/// Masked phone number that is safe to show to the opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnonymizedPhoneNumber(String);

const VISIBLE_SUFFIX: usize = 3;

impl PhoneNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Keeps a leading `+` and the last three digits, masking the rest.
    /// Numbers of three digits or fewer are masked entirely.
    pub fn anonymized(&self) -> AnonymizedPhoneNumber {
        let (prefix, digits) = match self.0.strip_prefix('+') {
            Some(rest) => ("+", rest),
            None => ("", self.0.as_str()),
        };
        let len = digits.chars().count();
        let visible_from = if len > VISIBLE_SUFFIX { len - VISIBLE_SUFFIX } else { len };

        let masked = digits
            .chars()
            .enumerate()
            .map(|(i, c)| if i >= visible_from { c } else { '*' });
        AnonymizedPhoneNumber(prefix.chars().chain(masked).collect())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AnonymizedPhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnonymizedPhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute URL of a webhook exposed by the phone side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookUrl(reqwest::Url);

#[derive(Debug, thiserror::Error)]
#[error("invalid webhook url {url:?}: {source}")]
pub struct InvalidWebhookUrl {
    url: String,
    #[source]
    source: url::ParseError,
}

impl WebhookUrl {
    pub fn parse(url: &str) -> Result<Self, InvalidWebhookUrl> {
        reqwest::Url::parse(url)
            .map(Self)
            .map_err(|source| InvalidWebhookUrl {
                url: url.to_string(),
                source,
            })
    }

    pub fn as_url(&self) -> &reqwest::Url {
        &self.0
    }
}

impl fmt::Display for WebhookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// The four webhooks a verified caller hands over at registration.
#[derive(Debug, Clone)]
pub struct WebhookSet {
    pub select_digit: WebhookUrl,
    pub heartbeat: WebhookUrl,
    pub game_start: WebhookUrl,
    pub game_done: WebhookUrl,
}
