//! Local inputs of an extraction run: credentials and the extraction request body.
//!
//! Everything here fails with [`Error::Config`] and runs before any request is sent.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::model::{Credentials, ExtractionRequest};

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialFile {
    credentials: Credentials,
}

/// Reads credentials from a file shaped like the token request,
/// `{"Credentials": {"Username": .., "Password": ..}}`.
pub fn credentials_from_file(path: &Path) -> Result<Credentials, Error> {
    let content = read(path)?;
    let CredentialFile { credentials } = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Unable to read credentials from {path}: {e}", path = path.display()))
    })?;
    non_empty(credentials)
}

/// Builds credentials from separately supplied username and password.
pub fn credentials_from_parts(
    username: Option<String>,
    password: Option<String>,
) -> Result<Credentials, Error> {
    match (username, password) {
        (Some(username), Some(password)) => non_empty(Credentials { username, password }),
        (None, _) => Err(Error::Config("Missing username".to_string())),
        (_, None) => Err(Error::Config("Missing password".to_string())),
    }
}

pub fn read_extraction_request(path: &Path) -> Result<ExtractionRequest, Error> {
    let content = read(path)?;
    ExtractionRequest::from_json(content).map_err(|e| {
        Error::Config(format!("{path}: {e}", path = path.display()))
    })
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Unable to find {path}: {e}", path = path.display())))
}

fn non_empty(credentials: Credentials) -> Result<Credentials, Error> {
    if credentials.username.trim().is_empty() {
        Err(Error::Config("Missing username".to_string()))
    } else if credentials.password.is_empty() {
        Err(Error::Config("Missing password".to_string()))
    } else {
        Ok(credentials)
    }
}
