// Stores layer - Data access for users and roles
pub mod role_store;
pub mod user_store;

pub use role_store::RoleStore;
pub use user_store::UserStore;

use std::future::Future;
use std::time::Duration;

use crate::errors::InternalError;

/// Run a store operation under a deadline
///
/// An elapsed deadline surfaces as `DatabaseError::Timeout` for `operation`.
/// Dropping the inner future rolls back any transaction it had open.
pub(crate) async fn with_deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T, InternalError>
where
    F: Future<Output = Result<T, InternalError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(operation, timeout_ms, "Store deadline elapsed");
            Err(InternalError::timeout(operation, timeout_ms))
        }
    }
}
