//! Auth provider error types.

use thiserror::Error;

/// Errors returned by the external auth provider client.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request failed (transport-level).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The provider rejected the credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailTaken,

    /// The provider returned a user record with a malformed email.
    #[error("invalid email in provider response: {0}")]
    InvalidEmail(#[from] velora_core::EmailError),

    /// The provider returned an unexpected status.
    #[error("auth provider error ({status}): {message}")]
    Provider { status: u16, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
        assert_eq!(
            AuthError::Provider {
                status: 503,
                message: "down".to_string()
            }
            .to_string(),
            "auth provider error (503): down"
        );
    }
}
