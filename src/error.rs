//! Typed errors for calls to external HTTP services.

/// Failure of a text-generation, embedding or catalog HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("empty response from {service}")]
    EmptyResponse { service: &'static str },
}

impl ApiError {
    /// Build an [`ApiError::Status`] from a non-success response.
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        ApiError::Status {
            service,
            status,
            body,
        }
    }
}
