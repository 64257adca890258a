//! Credentials attached to every backend request.

use std::fmt;

use leadconsole_core::error::CoreError;

/// The bearer token for the signed-in operator, if any.
///
/// Passed explicitly to the backend; nothing reads credentials from
/// ambient state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    /// A context carrying `token`. A blank token counts as none.
    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        Self {
            token: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The token, or `Unauthorized` when the session has none.
    pub fn token(&self) -> Result<&str, CoreError> {
        self.token
            .as_deref()
            .ok_or_else(|| CoreError::Unauthorized("Not signed in".to_string()))
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn blank_token_is_anonymous() {
        assert!(!AuthContext::bearer("   ").is_authenticated());
        assert_matches!(AuthContext::anonymous().token(), Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn token_is_trimmed() {
        assert_eq!(AuthContext::bearer(" abc ").token().unwrap(), "abc");
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", AuthContext::bearer("s3cret"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("redacted"));
    }
}
