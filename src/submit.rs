use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::Error;
use crate::model::{ExtractionRequest, ExtractionStatus, SubmitOutcome, Token};
use crate::service::{authorization, location, ExtractionService, PREFER, RESPOND_ASYNC};

const EXTRACT_RAW_PATH: &str = "Extractions/ExtractRaw";

impl ExtractionService {
    /// Sends the raw extraction request. The server either answers with the final status
    /// right away or accepts the job and points to a location to poll.
    pub async fn submit_extraction(
        &self,
        token: &Token,
        request: &ExtractionRequest,
    ) -> Result<SubmitOutcome, Error> {
        tracing::info!("Sending raw extraction request");

        let response = self
            .client
            .post(self.endpoint(EXTRACT_RAW_PATH))
            .header(PREFER, RESPOND_ASYNC)
            .header(AUTHORIZATION, authorization(token)?)
            .header(CONTENT_TYPE, "application/json")
            .body(request.as_str().to_owned())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let response_body = response.text().await?;
                let status = serde_json::from_str::<ExtractionStatus>(&response_body)?;
                tracing::info!(job_id = %status.job_id, "Extraction completed synchronously");
                Ok(SubmitOutcome::Completed(status))
            }
            StatusCode::ACCEPTED => match location(&response)? {
                Some(location) => {
                    tracing::info!(location = %location, "Extraction request accepted");
                    Ok(SubmitOutcome::Accepted(location))
                }
                None => Err(Error::Submit {
                    status: StatusCode::ACCEPTED,
                    reason: "Request accepted without a Location header to poll".to_string(),
                }),
            },
            _ => {
                let error = Error::from_response(response, Error::submit).await;
                tracing::error!(error = %error, "Extraction request rejected");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use crate::error::Error;
    use crate::model::{ExtractionRequest, ExtractionStatus, SubmitOutcome, Token};
    use crate::service::tests::extraction_service;

    const REQUEST: &str = r#"{"ExtractionRequest": {"IdentifierList": {"InstrumentIdentifiers": [{"Identifier": "CARR.PA", "IdentifierType": "Ric"}]}}}"#;

    #[tokio::test]
    async fn given_accepted_request_when_submit_then_location_returned_verbatim() {
        // Given
        let mut server = Server::new_async().await;
        let location = format!(
            "{url}/Extractions/ExtractRawResult(ExtractionId='0x05dc0d3cbd3b2f76')",
            url = server.url()
        );
        let m = server
            .mock("POST", "/Extractions/ExtractRaw")
            .match_header("authorization", "Tokenabc")
            .match_header("prefer", "respond-async")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Exact(REQUEST.to_string()))
            .with_status(202)
            .with_header("location", &location)
            .with_body("not a status payload")
            .create_async()
            .await;

        // When
        let outcome = extraction_service(&server.url())
            .submit_extraction(&Token::new("abc"), &ExtractionRequest::from_json(REQUEST).unwrap())
            .await
            .unwrap();

        // Then
        m.assert_async().await;
        assert_eq!(outcome, SubmitOutcome::Accepted(location.parse().unwrap()));
    }

    #[tokio::test]
    async fn given_synchronous_completion_when_submit_then_status_returned() {
        // Given
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/Extractions/ExtractRaw")
            .with_status(200)
            .with_body(r#"{"JobId": "0x05dc0d3cbd3b2f76", "Notes": ["Extraction Services Version 16.0"]}"#)
            .create_async()
            .await;

        // When
        let outcome = extraction_service(&server.url())
            .submit_extraction(&Token::new("abc"), &ExtractionRequest::from_json(REQUEST).unwrap())
            .await
            .unwrap();

        // Then
        assert_eq!(
            outcome,
            SubmitOutcome::Completed(ExtractionStatus {
                job_id: "0x05dc0d3cbd3b2f76".to_string(),
                notes: vec!["Extraction Services Version 16.0".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn given_rejected_request_when_submit_then_submit_error() {
        // Given
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/Extractions/ExtractRaw")
            .with_status(400)
            .with_body("Malformed request payload")
            .expect(1)
            .create_async()
            .await;

        // When
        let error = extraction_service(&server.url())
            .submit_extraction(&Token::new("abc"), &ExtractionRequest::from_json(REQUEST).unwrap())
            .await
            .unwrap_err();

        // Then
        m.assert_async().await;
        assert!(matches!(error, Error::Submit { status, .. } if status.as_u16() == 400));
        assert!(error.to_string().contains("Malformed request payload"));
    }

    #[tokio::test]
    async fn given_accepted_without_location_when_submit_then_submit_error() {
        // Given
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/Extractions/ExtractRaw")
            .with_status(202)
            .create_async()
            .await;

        // When
        let error = extraction_service(&server.url())
            .submit_extraction(&Token::new("abc"), &ExtractionRequest::from_json(REQUEST).unwrap())
            .await
            .unwrap_err();

        // Then
        assert!(matches!(error, Error::Submit { status, .. } if status.as_u16() == 202));
    }
}
