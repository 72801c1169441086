use std::fmt::{Display, Formatter, Result};
use std::time::Duration;

use reqwest::StatusCode;

#[derive(Debug)]
pub enum Error {
  ReqwestError(reqwest::Error),
  JsonError(serde_json::Error),
  IoError(std::io::Error),
  /// A `Location` header could not be turned into a URL.
  InvalidLocation(String),
  HeaderError(http::header::InvalidHeaderValue),
  TemplateError(indicatif::style::TemplateError),
  /// Local input (credentials or request file) is missing or unusable. Raised before any
  /// request goes out.
  Config(String),
  /// The token exchange did not answer with a success status.
  Auth { status: StatusCode, reason: String },
  /// The token validation call could not be completed.
  Validation(String),
  /// The extraction request was rejected (anything but `200` or `202`).
  Submit { status: StatusCode, reason: String },
  /// The job never reported ready within the overall polling timeout.
  Timeout { elapsed: Duration, timeout: Duration },
  /// The result could not be retrieved (anything but `200` or a single redirect).
  Fetch { status: StatusCode, reason: String },
  /// The object storage answered with yet another redirect.
  UnexpectedRedirect(String),
}

impl std::error::Error for Error {}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter<'_>) -> Result {
    match self {
      Error::ReqwestError(e) => Display::fmt(e, f),
      Error::JsonError(e) => Display::fmt(e, f),
      Error::IoError(e) => Display::fmt(e, f),
      Error::InvalidLocation(e) => Display::fmt(e, f),
      Error::HeaderError(e) => Display::fmt(e, f),
      Error::TemplateError(e) => Display::fmt(e, f),
      Error::Config(e) => Display::fmt(e, f),
      Error::Auth { status, reason } => {
        write!(f, "Unable to login to Tick History server. Status code: {status}. Reason: {reason}")
      }
      Error::Validation(e) => Display::fmt(e, f),
      Error::Submit { status, reason } => {
        write!(f, "Extraction request failed. Status code: {status}. Reason: {reason}")
      }
      Error::Timeout { elapsed, timeout } => write!(
        f,
        "Extraction did not complete in time. Waited {elapsed}s of the allowed {timeout}s.",
        elapsed = elapsed.as_secs_f64(),
        timeout = timeout.as_secs_f64()
      ),
      Error::Fetch { status, reason } => {
        write!(f, "Unable to get data. Status code: {status}. Reason: {reason}")
      }
      Error::UnexpectedRedirect(location) => {
        write!(f, "Object storage redirected again to `{location}`, only one redirect is followed")
      }
    }
  }
}

impl Error {
  /// Builds an error variant from a failing response, using the reason phrase and the body.
  pub(crate) async fn from_response(
    response: reqwest::Response,
    variant: fn(StatusCode, String) -> Error,
  ) -> Error {
    let status = response.status();
    let phrase = status.canonical_reason().unwrap_or("Unknown");
    let reason = match response.text().await {
      Ok(body) if !body.trim().is_empty() => format!("{phrase}. Body: {body}"),
      _ => phrase.to_string(),
    };
    variant(status, reason)
  }

  pub(crate) fn auth(status: StatusCode, reason: String) -> Error {
    Error::Auth { status, reason }
  }

  pub(crate) fn submit(status: StatusCode, reason: String) -> Error {
    Error::Submit { status, reason }
  }

  pub(crate) fn fetch(status: StatusCode, reason: String) -> Error {
    Error::Fetch { status, reason }
  }
}

impl From<reqwest::Error> for Error {
  fn from(reqwest_error: reqwest::Error) -> Self {
    Error::ReqwestError(reqwest_error)
  }
}

impl From<serde_json::Error> for Error {
  fn from(serde_json_error: serde_json::Error) -> Self {
    Error::JsonError(serde_json_error)
  }
}

impl From<std::io::Error> for Error {
  fn from(io_error: std::io::Error) -> Self {
    Error::IoError(io_error)
  }
}

impl From<http::header::InvalidHeaderValue> for Error {
  fn from(header_error: http::header::InvalidHeaderValue) -> Self {
    Error::HeaderError(header_error)
  }
}

impl From<indicatif::style::TemplateError> for Error {
  fn from(template_error: indicatif::style::TemplateError) -> Self {
    Error::TemplateError(template_error)
  }
}
