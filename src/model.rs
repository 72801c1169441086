use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::Error;

/// Username and password of a Tick History account.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Request body of the token exchange, `{"Credentials": {"Username": .., "Password": ..}}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenRequest<'a> {
    pub(crate) credentials: &'a Credentials,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub(crate) value: String,
}

/// A session token as issued by the server.
///
/// The `Authorization` header value is the literal `Token` followed by the raw value, with no
/// separating space. The server expects exactly that, so it is not a `Bearer` scheme.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
}

impl Token {
    pub fn new(value: impl Into<String>) -> Token {
        Token { value: value.into() }
    }

    /// The raw token value without prefix, as used by the validation endpoint.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The value sent in the `Authorization` header of every privileged request.
    pub fn header_value(&self) -> String {
        format!("Token{}", self.value)
    }

    /// A short prefix of the value that is safe to put into logs.
    pub(crate) fn redacted(&self) -> String {
        let prefix: String = self.value.chars().take(6).collect();
        format!("{prefix}…")
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&self.redacted()).finish()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.header_value())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidateTokenResponse {
    pub(crate) is_valid: bool,
    pub(crate) expires: String,
}

/// Validity and expiry of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub token: Token,
    pub is_valid: bool,
    /// Expiry as reported by the server.
    pub expires: String,
}

impl TokenInfo {
    /// The expiry as a timestamp, if the server reported it in RFC 3339 form.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.expires, &Rfc3339).ok()
    }
}

impl Display for TokenInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let expires = self
            .expires_at()
            .and_then(|at| at.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.expires.clone());

        writeln!(f, "====================")?;
        writeln!(f, "Token={}", self.token.value())?;
        writeln!(f, "IsValid={}", self.is_valid)?;
        writeln!(f, "Expires={expires}")?;
        write!(f, "====================")
    }
}

/// The extraction request body. It is only checked to be JSON and is sent exactly as given.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    body: String,
}

impl ExtractionRequest {
    pub fn from_json(body: impl Into<String>) -> Result<ExtractionRequest, Error> {
        let body = body.into();
        serde_json::from_str::<serde::de::IgnoredAny>(&body)
            .map_err(|e| Error::Config(format!("Extraction request is not valid JSON: {e}")))?;
        Ok(ExtractionRequest { body })
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }
}

/// Final status of an extraction: the job identifier and the server's notes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ExtractionStatus {
    pub job_id: String,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// How the server answered the extraction request.
#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    /// `200`: the job finished right away, the body is the final status.
    Completed(ExtractionStatus),
    /// `202`: the job runs asynchronously, its status has to be polled at this location.
    Accepted(reqwest::Url),
}

/// Summary of a finished extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub status: ExtractionStatus,
    pub output: std::path::PathBuf,
    pub bytes_written: u64,
}
