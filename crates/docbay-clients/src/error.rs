//! Mapping of transport failures onto the collaborator error surface.

use docbay_core::CollaboratorError;
use reqwest::StatusCode;

/// Translate a reqwest failure into the collaborator taxonomy.
///
/// Timeouts and connection failures become `Network`; a failure that still
/// carries a response status becomes `Api`.
pub(crate) fn from_reqwest(err: reqwest::Error) -> CollaboratorError {
    if err.is_timeout() || err.is_connect() {
        return CollaboratorError::Network(err.to_string());
    }
    match err.status() {
        Some(status) => CollaboratorError::Api {
            status: status.as_u16(),
            message: err.to_string(),
        },
        None => CollaboratorError::Network(err.to_string()),
    }
}

/// Turn a non-success response into a collaborator error, consuming the
/// body for the error message.
pub(crate) async fn from_response(response: reqwest::Response) -> CollaboratorError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return CollaboratorError::NotFound;
    }
    let message = response.text().await.unwrap_or_default();
    CollaboratorError::Api {
        status: status.as_u16(),
        message,
    }
}
