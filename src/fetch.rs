use futures::StreamExt;
use http::header::{ACCEPT_ENCODING, AUTHORIZATION};
use indicatif::{HumanBytes, ProgressBar};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Error;
use crate::model::Token;
use crate::service::{authorization, location, ExtractionService, PREFER, RESPOND_ASYNC};

const DIRECT_DOWNLOAD: &str = "X-Direct-Download";
const GZIP_DEFLATE: &str = "gzip, deflate";

impl ExtractionService {
    /// Downloads the result of job `job_id` into `sink` and returns the number of bytes written.
    ///
    /// A redirect to object storage is followed once, without the token. The sink is flushed
    /// whether or not the transfer succeeds.
    pub async fn fetch_result<W>(
        &self,
        token: &Token,
        job_id: &str,
        sink: &mut W,
        spinner: &ProgressBar,
    ) -> Result<u64, Error>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let retrieve_data_url = self.endpoint(&format!(
            "Extractions/RawExtractionResults('{job_id}')/$value"
        ));
        tracing::info!(url = %retrieve_data_url, "Retrieving data");

        let mut retrieve_data_request = self
            .client
            .get(&retrieve_data_url)
            .header(AUTHORIZATION, authorization(token)?);
        if self.fetch_options.direct_download {
            retrieve_data_request = retrieve_data_request.header(DIRECT_DOWNLOAD, "True");
        }
        let response = with_download_headers(retrieve_data_request).send().await?;

        match response.status() {
            StatusCode::OK => stream_to_sink(response, sink, spinner).await,
            status if status.is_redirection() => {
                let Some(storage_location) = location(&response)? else {
                    return Err(Error::Fetch {
                        status,
                        reason: "Redirect without a Location header".to_string(),
                    });
                };
                tracing::info!(location = %storage_location, "Retrieving data from object storage");
                spinner.set_message(format!("PROGRESS – retrieving data from {storage_location}"));

                // Object storage rejects the session token, so this request goes out without it.
                let storage_response = with_download_headers(self.client.get(storage_location.clone()))
                    .send()
                    .await?;

                match storage_response.status() {
                    StatusCode::OK => stream_to_sink(storage_response, sink, spinner).await,
                    status if status.is_redirection() => {
                        let next = location(&storage_response)?
                            .map(|url| url.to_string())
                            .unwrap_or_else(|| storage_location.to_string());
                        Err(Error::UnexpectedRedirect(next))
                    }
                    _ => Err(Error::from_response(storage_response, Error::fetch).await),
                }
            }
            _ => {
                let error = Error::from_response(response, Error::fetch).await;
                tracing::error!(job_id, error = %error, "Unable to get data");
                Err(error)
            }
        }
    }
}

fn with_download_headers(request: RequestBuilder) -> RequestBuilder {
    request
        .header(PREFER, RESPOND_ASYNC)
        .header(ACCEPT_ENCODING, GZIP_DEFLATE)
}

async fn stream_to_sink<W>(response: Response, sink: &mut W, spinner: &ProgressBar) -> Result<u64, Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let copied = copy_body(response, sink, spinner).await;
    let flushed = sink.flush().await;
    let bytes_written = copied?;
    flushed?;
    Ok(bytes_written)
}

async fn copy_body<W>(response: Response, sink: &mut W, spinner: &ProgressBar) -> Result<u64, Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut body = response.bytes_stream();
    let mut bytes_written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        sink.write_all(&chunk).await?;
        bytes_written += chunk.len() as u64;
        spinner.set_message(format!("PROGRESS – {} written", HumanBytes(bytes_written)));
    }
    tracing::debug!(bytes_written, "Result body written");
    Ok(bytes_written)
}
