use thiserror::Error;

use super::location::LocationRef;

/// Failures of the authorization engine.
///
/// A plain denial is never an error: rules answer `Ok(false)`. These variants
/// signal configuration or data defects and must reach an operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("unknown permission `{0}`")]
    UnknownPermission(String),

    #[error("permission `{0}` registered more than once")]
    DuplicateRule(String),

    #[error("unknown user {0}")]
    UnknownUser(i64),

    #[error("integrity violation: no parent recorded for {0}")]
    IntegrityViolation(LocationRef),
}

impl AuthzError {
    /// Errors that indicate broken configuration or storage rather than a
    /// missing identity.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AuthzError::UnknownPermission(_)
                | AuthzError::DuplicateRule(_)
                | AuthzError::IntegrityViolation(_)
        )
    }
}
