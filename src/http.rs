//! Shared HTTP plumbing for the upstream JSON endpoints.
//!
//! Both the Open511 events client and the weather client go through
//! [`fetch_json`], which applies the same acceptance rules: a success status
//! and a JSON content type, otherwise the response is rejected with a
//! [`RequestError`].

use std::fmt;

use log::debug;
use mime::Mime;
use reqwest::{RequestBuilder, StatusCode, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;

/// Errors that can occur while requesting an upstream endpoint.
#[derive(Debug)]
pub enum RequestError {
    /// The request could not be sent or the connection failed.
    Transport(reqwest::Error),
    /// The server answered with a non-success HTTP status.
    Status(StatusCode),
    /// The response content type is missing or is not JSON.
    ContentType(Option<String>),
    /// The body could not be decoded into the expected structure.
    Decode(reqwest::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RequestError::Transport(e) => write!(f, "transport error: {}", e),
            RequestError::Status(status) => write!(f, "unexpected status {}", status),
            RequestError::ContentType(Some(content_type)) => {
                write!(f, "unexpected content type {}", content_type)
            }
            RequestError::ContentType(None) => write!(f, "missing content type"),
            RequestError::Decode(e) => write!(f, "invalid body: {}", e),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Transport(e) | RequestError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RequestError::Decode(e)
        } else {
            RequestError::Transport(e)
        }
    }
}

/// Returns `true` when the header value names a JSON media type.
///
/// Parameters such as `charset` are accepted.
pub fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.parse::<Mime>().ok())
        .is_some_and(|m| m.type_() == mime::APPLICATION && m.subtype() == mime::JSON)
}

/// Sends the request and decodes the JSON body.
///
/// # Errors
///
/// * [`RequestError::Transport`] if the request fails
/// * [`RequestError::Status`] on a non-2xx status
/// * [`RequestError::ContentType`] if the response is not `application/json`
/// * [`RequestError::Decode`] if the body does not match `T`
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RequestError> {
    let response = request.send().await.map_err(RequestError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(RequestError::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    if !is_json(content_type.as_deref()) {
        return Err(RequestError::ContentType(content_type));
    }

    debug!("response from {} -> {}", response.url(), status);

    response.json::<T>().await.map_err(RequestError::Decode)
}
