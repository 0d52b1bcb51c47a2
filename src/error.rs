use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Encapsulates all errors possible when talking to Toggl
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller passed something the API can't be asked for, e.g. a `DELETE` method or an
    /// empty workspace id. Raised before any request is made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A non-success status from the server. `body` is the response text as received.
    #[error("server returned {status}: {}", .message.as_deref().unwrap_or(.body))]
    Server {
        status: StatusCode,
        body: String,
        message: Option<String>,
    },

    /// The per-request timeout from `Config::timeout` expired
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// When the network fails
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Couldn't parse server response
    #[error("couldn't parse response: {source}")]
    Parsing {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// Builds a `Server` error, pulling a readable message out of whichever error shape the
    /// body happens to have.
    pub(crate) fn server(status: StatusCode, body: String) -> Self {
        let message = extract_message(&body);
        ApiError::Server {
            status,
            body,
            message,
        }
    }

    /// Status code of a `Server` error
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(err) | ApiError::Timeout(err) => err.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err)
        } else {
            ApiError::Network(err)
        }
    }
}

#[derive(Deserialize, Debug)]
struct ReportsErrorDetail {
    message: String,
    #[serde(default)]
    tip: Option<String>,
}

/// https://github.com/toggl/toggl_api_docs/blob/master/reports.md#failed-requests
#[derive(Deserialize, Debug)]
struct ReportsErrorJson {
    error: ReportsErrorDetail,
}

/// The core API's error messages are always an array of strings.
type DefaultErrorJson = Vec<String>;

fn extract_message(body: &str) -> Option<String> {
    if let Ok(reports) = serde_json::from_str::<ReportsErrorJson>(body) {
        let detail = reports.error;
        return Some(match detail.tip {
            Some(tip) if !tip.is_empty() => format!("{} ({})", detail.message, tip),
            _ => detail.message,
        });
    }
    match serde_json::from_str::<DefaultErrorJson>(body) {
        Ok(messages) if !messages.is_empty() => Some(messages.join("; ")),
        _ => None,
    }
}
