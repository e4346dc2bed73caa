use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::ports::ServiceError;

const ERROR_BODY_LIMIT: usize = 512;

async fn send(service: &'static str, request: RequestBuilder) -> Result<Response, ServiceError> {
    let response = request
        .send()
        .await
        .map_err(|e| ServiceError::from_reqwest(service, e))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("Could not read {} error body: {}", service, e);
            String::new()
        }
    };
    if body.len() > ERROR_BODY_LIMIT {
        let mut cut = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    tracing::debug!("{} responded with {}: {}", service, status, body);
    Err(ServiceError::from_status(service, status, body))
}

/// Sends the request and decodes a JSON body, mapping HTTP failures onto [`ServiceError`].
pub async fn send_json<T: DeserializeOwned>(
    service: &'static str,
    request: RequestBuilder,
) -> Result<T, ServiceError> {
    send(service, request)
        .await?
        .json::<T>()
        .await
        .map_err(|e| ServiceError::transient(service, format!("invalid response body: {e}")))
}

/// Sends the request and ignores any response body.
pub async fn send_no_content(
    service: &'static str,
    request: RequestBuilder,
) -> Result<(), ServiceError> {
    send(service, request).await.map(|_| ())
}
