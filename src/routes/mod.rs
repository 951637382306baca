pub mod health;
pub mod locations;
pub mod me;
pub mod project_outlooks;
pub mod records;
pub mod users;

use crate::authz::AuthzError;
use crate::errors::{AppError, AppResult, FORBIDDEN_MESSAGE};

/// Turns a policy decision into a handler outcome.
///
/// A denial and an error (unknown permission, broken hierarchy, unknown
/// user) both become 403; only the logs tell them apart.
pub(crate) fn enforce(
    user_id: i64,
    action: &'static str,
    decision: Result<bool, AuthzError>,
) -> AppResult<()> {
    match decision {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::debug!(user_id, action, "request denied");
            Err(AppError::forbidden(FORBIDDEN_MESSAGE))
        }
        Err(err) => Err(err.into()),
    }
}
