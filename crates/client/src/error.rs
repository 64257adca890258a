use leadconsole_core::error::CoreError;
use leadconsole_core::status_update::FieldError;

/// Error type for every client action.
///
/// Wraps [`CoreError`] for failures detected before any request is sent and
/// adds transport and backend variants. The UI should show
/// [`ClientError::user_message`], never the `Display` text, which may
/// contain raw transport details.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A domain-level error from `leadconsole_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Lead API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend answered but refused the request (`result`/`success`
    /// false).
    #[error("Rejected by server: {message}")]
    Rejected {
        message: String,
        field_errors: Vec<FieldError>,
    },

    /// Reading a local file (import) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;

/// Coarse classification used by the UI to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response reached us.
    Transport,
    /// The payload was rejected (locally or by the backend).
    Validation,
    /// The action could never have succeeded with these inputs.
    Configuration,
    Unauthorized,
    /// Another submission of the same action is still in flight.
    Busy,
    Internal,
}

impl ClientError {
    /// Build a [`ClientError::Rejected`] with no field errors.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            field_errors: Vec::new(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Core(core) => match core {
                CoreError::Validation(_) => FailureKind::Validation,
                CoreError::Configuration(_) => FailureKind::Configuration,
                CoreError::Unauthorized(_) => FailureKind::Unauthorized,
                CoreError::Conflict(_) => FailureKind::Busy,
                CoreError::Internal(_) => FailureKind::Internal,
            },
            ClientError::Request(err) if err.is_decode() => FailureKind::Internal,
            ClientError::Request(_) => FailureKind::Transport,
            ClientError::Api { status, .. } => match *status {
                401 | 403 => FailureKind::Unauthorized,
                400..=499 => FailureKind::Validation,
                _ => FailureKind::Internal,
            },
            ClientError::Rejected { .. } => FailureKind::Validation,
            ClientError::Io(_) => FailureKind::Validation,
        }
    }

    /// Whether the request never got a response.
    pub fn is_transport(&self) -> bool {
        self.kind() == FailureKind::Transport
    }

    /// Per-field messages, when the backend supplied them.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Rejected { field_errors, .. } => field_errors,
            _ => &[],
        }
    }

    /// The single message shown to the operator.
    ///
    /// Domain and backend messages are passed through; transport and
    /// internal details are logged and replaced with a generic message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Core(core) => match core {
                CoreError::Validation(msg)
                | CoreError::Configuration(msg)
                | CoreError::Conflict(msg) => msg.clone(),
                CoreError::Unauthorized(_) => {
                    "Your session has expired. Please sign in again.".to_string()
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal client error");
                    "Something went wrong. Please try again.".to_string()
                }
            },
            ClientError::Request(err) => {
                tracing::error!(error = %err, "Lead API request failed");
                if err.is_decode() {
                    "The server sent an unexpected response. Please try again.".to_string()
                } else {
                    "Could not reach the server. Please check your connection and try again."
                        .to_string()
                }
            }
            ClientError::Api { status, body } => {
                tracing::warn!(status, body = %body, "Lead API returned an error status");
                match self.kind() {
                    FailureKind::Unauthorized => {
                        "Your session has expired. Please sign in again.".to_string()
                    }
                    FailureKind::Validation => message_from_body(body)
                        .unwrap_or_else(|| "The server rejected the request.".to_string()),
                    _ => "The server could not complete the request. Please try again."
                        .to_string(),
                }
            }
            ClientError::Rejected { message, .. } => message.clone(),
            ClientError::Io(err) => {
                tracing::warn!(error = %err, "Failed to read local file");
                "The selected file could not be read.".to_string()
            }
        }
    }
}

/// Pull a `message` (or `error`) string out of a JSON error body.
pub fn message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
