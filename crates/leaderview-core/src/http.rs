//! Request helpers shared by the game API clients.

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Joins `segments` onto `base`, escaping each, and appends `query`.
///
/// # Errors
///
/// Returns `ClientError::Network` if `base` is not a usable base URL.
pub fn build_url(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(base).map_err(|e| ClientError::Network(format!("invalid url {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ClientError::Network(format!("invalid base url {base}")))?
        .pop_if_empty()
        .extend(segments);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// Decodes the JSON body of a sent request. Non-success statuses become
/// `ClientError::Http` carrying the body text.
///
/// # Errors
///
/// Returns `ClientError::Network` if the request failed, `ClientError::Http`
/// on a non-success status and `ClientError::JsonParse` on a bad body.
pub async fn read_json<T: DeserializeOwned>(
    sent: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, ClientError> {
    let resp = sent.map_err(|e| ClientError::Network(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| ClientError::JsonParse(e.to_string()))
}
