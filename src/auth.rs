use reqwest::StatusCode;

use crate::error::Error;
use crate::model::{Credentials, Token, TokenInfo, TokenRequest, TokenResponse, ValidateTokenResponse};
use crate::service::{ExtractionService, PREFER, RESPOND_ASYNC};

const REQUEST_TOKEN_PATH: &str = "Authentication/RequestToken";

impl ExtractionService {
    /// Exchanges username and password for a session token.
    pub async fn request_token(&self, credentials: &Credentials) -> Result<Token, Error> {
        tracing::info!(username = %credentials.username, "Requesting token");

        let response = self
            .client
            .post(self.endpoint(REQUEST_TOKEN_PATH))
            .header(PREFER, RESPOND_ASYNC)
            .json(&TokenRequest { credentials })
            .send()
            .await?;

        if response.status().is_success() {
            let response_body = response.text().await?;
            let TokenResponse { value } = serde_json::from_str(&response_body)?;
            let token = Token::new(value);
            tracing::debug!(token = %token.redacted(), "Received token");
            Ok(token)
        } else {
            let error = Error::from_response(response, Error::auth).await;
            tracing::error!(error = %error, "Token request rejected");
            Err(error)
        }
    }

    /// Asks the server whether `token` is still valid and when it expires.
    pub async fn validate_token(&self, token: &Token) -> Result<TokenInfo, Error> {
        let validate_url = self.endpoint(&format!(
            "Authentication/ValidateToken(Token='{value}')",
            value = token.value()
        ));
        let response = self.client.get(&validate_url).send().await?;

        match response.status() {
            StatusCode::OK => {
                let response_body = response.text().await?;
                let ValidateTokenResponse { is_valid, expires } = serde_json::from_str(&response_body)
                    .map_err(|e| Error::Validation(format!("Unexpected token validation response: {e}")))?;
                tracing::debug!(is_valid, expires = %expires, "Validated token");

                Ok(TokenInfo {
                    token: token.clone(),
                    is_valid,
                    expires,
                })
            }
            status => Err(Error::Validation(format!(
                "Unable to validate token. Status code: {status}. Body: {body}",
                body = response.text().await?
            ))),
        }
    }
}
