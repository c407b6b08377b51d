// Upstream services: résumé crafting, document generation, and the S3 archive for
// generated documents. No request is retried automatically; failures surface as typed
// errors and the caller decides what to tell the user.

pub mod archive;
pub mod craft;
pub mod document;

use reqwest::StatusCode;
use thiserror::Error;

pub use archive::DocumentArchive;
pub use craft::CraftClient;
pub use document::{DocumentClient, GeneratedDocument};

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The service refused the request (auth required, forbidden, legal block).
    /// Retrying will not help; the user has to supply the content another way.
    #[error("Upstream refused the request (status {status})")]
    Blocked { status: u16 },

    #[error("Upstream failed (status {status}): {message}")]
    Failed { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Could not decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Document archive error: {0}")]
    Archive(String),
}

/// Maps a non-success status onto the blocked / failed split.
pub(crate) fn status_error(status: StatusCode, body: String) -> UpstreamError {
    match status.as_u16() {
        401 | 403 | 451 => UpstreamError::Blocked {
            status: status.as_u16(),
        },
        code => UpstreamError::Failed {
            status: code,
            message: body,
        },
    }
}

pub(crate) fn http_client() -> Result<reqwest::Client, UpstreamError> {
    Ok(reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Serves `router` on an ephemeral local port and returns its base URL.
#[cfg(test)]
pub(crate) async fn serve_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
    format!("http://{addr}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_and_legal_statuses_are_blocked() {
        for code in [401, 403, 451] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(matches!(
                status_error(status, String::new()),
                UpstreamError::Blocked { status } if status == code
            ));
        }
    }

    #[test]
    fn test_other_errors_are_failures() {
        let err = status_error(StatusCode::BAD_GATEWAY, "down".to_string());
        assert!(matches!(
            err,
            UpstreamError::Failed { status: 502, ref message } if message == "down"
        ));
    }
}
