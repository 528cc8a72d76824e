use shared::error::{ApiErrorBody, FieldErrors};
use thiserror::Error;

/// Failure of a single call to the wallet API. Never retried.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The server rejected the bearer token (401/403 on an authenticated call).
    #[error("session rejected by {endpoint} (status {status})")]
    SessionInvalid {
        endpoint: &'static str,
        status: u16,
        body: ApiErrorBody,
    },
    #[error("{endpoint} answered with status {status}")]
    Rejected {
        endpoint: &'static str,
        status: u16,
        body: ApiErrorBody,
    },
    #[error("{endpoint} unreachable: {reason}")]
    Transport {
        endpoint: &'static str,
        reason: String,
    },
    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },
    #[error("no session token available for {endpoint}")]
    MissingSession { endpoint: &'static str },
}

impl RequestError {
    /// True when the stored session must be discarded and the user sent back to login.
    pub fn is_session_invalid(&self) -> bool {
        matches!(
            self,
            Self::SessionInvalid { .. } | Self::MissingSession { .. }
        )
    }

    /// Transport failures and unreadable bodies, as opposed to a server verdict.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Malformed { .. })
    }

    pub fn body(&self) -> Option<&ApiErrorBody> {
        match self {
            Self::SessionInvalid { body, .. } | Self::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionInvalid { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `message` or `error` from the response body, if the server sent one.
    pub fn server_message(&self) -> Option<&str> {
        self.body().and_then(ApiErrorBody::human_message)
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.body()
            .map(|body| &body.errors)
            .filter(|errors| !errors.is_empty())
    }

    /// Message to show the user: the server's own text, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}
