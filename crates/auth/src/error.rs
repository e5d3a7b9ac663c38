use thiserror::Error;

/// Failure of a credential operation (sign-in, sign-up, sign-out, refresh).
///
/// Callers never observe a panic from credential flows; every failure mode is
/// a value of this enum so the caller can branch on it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The provider rejected the email/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The provider rejected the request for another reason (rate limit,
    /// account state, weak password on sign-up).
    #[error("identity provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// No usable refresh grant was available for a refresh attempt.
    #[error("no refresh token held for the current session")]
    NoRefreshToken,

    /// The provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Network(String),

    /// The provider answered with a payload this client cannot interpret.
    #[error("malformed identity provider response: {0}")]
    Malformed(String),
}

impl CredentialError {
    /// True when retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CredentialError::Network(_))
    }
}

/// Failure of a role lookup against the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleFetchError {
    /// Non-success status from the role endpoint.
    #[error("role endpoint returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The backend could not be reached.
    #[error("role endpoint unreachable: {0}")]
    Network(String),

    /// The payload deserialized but violated the role contract, or did not
    /// deserialize at all. Carries the decoder's message for the log line.
    #[error("role payload violated the backend contract: {0}")]
    Contract(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_actionable_messages() {
        let err = CredentialError::Rejected {
            status: 422,
            message: "password too short".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "identity provider rejected the request (422): password too short"
        );

        let err = RoleFetchError::Contract("unknown variant `referee`".to_string());
        assert!(err.to_string().contains("referee"));
    }
}
