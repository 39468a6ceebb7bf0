//! Auth error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No account found for this email")]
    UserNotFound,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Email already in use")]
    EmailAlreadyInUse,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("User not authenticated")]
    Unauthenticated,

    #[error("Storage error: {0}")]
    Storage(#[from] rewear_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Stable discriminant surfaced to UI callers.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::UserNotFound => "auth/user-not-found",
            AuthError::WrongPassword => "auth/wrong-password",
            AuthError::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthError::WeakPassword => "auth/weak-password",
            AuthError::Unauthenticated => "auth/unauthenticated",
            AuthError::Storage(_) | AuthError::Json(_) => "auth/internal-error",
        }
    }

    pub fn user_message(&self) -> &'static str {
        message_for_code(self.code())
    }
}

/// User-facing message for an error code. Unknown codes get a generic message.
pub fn message_for_code(code: &str) -> &'static str {
    match code {
        "auth/user-not-found" => "No account found with this email address.",
        "auth/wrong-password" => "Incorrect password. Please try again.",
        "auth/email-already-in-use" => "An account with this email already exists.",
        "auth/weak-password" => "Password should be at least 6 characters long.",
        "auth/invalid-email" => "Please enter a valid email address.",
        "auth/too-many-requests" => "Too many failed attempts. Please try again later.",
        "auth/network-request-failed" => "Network error. Please check your connection.",
        _ => "An error occurred. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_codes_have_messages() {
        assert_eq!(
            AuthError::UserNotFound.user_message(),
            "No account found with this email address."
        );
        assert_eq!(
            AuthError::WrongPassword.user_message(),
            "Incorrect password. Please try again."
        );
        assert_eq!(
            AuthError::EmailAlreadyInUse.user_message(),
            "An account with this email already exists."
        );
        assert_eq!(
            AuthError::WeakPassword.user_message(),
            "Password should be at least 6 characters long."
        );
    }

    #[test]
    fn test_unknown_code_falls_back() {
        let fallback = "An error occurred. Please try again.";
        assert_eq!(message_for_code("auth/something-new"), fallback);
        assert_eq!(message_for_code(""), fallback);
        assert_eq!(AuthError::Unauthenticated.user_message(), fallback);
    }
}
