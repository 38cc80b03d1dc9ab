/// Database models for TaskTrack
///
/// This module contains all database models and their query operations.
///
/// # Models
///
/// - `user`: User accounts with per-user completed-task aggregates
/// - `task`: Tasks with assignment handling and completion statistics
/// - `task_user`: The user-task assignment (junction) rows
/// - `paging`: Pagination and sort-order normalization shared by list queries
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::models::user::{CreateUser, User, UserRole, UserStatus};
/// use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     name: "Juan".to_string(),
///     last_name: "Perez".to_string(),
///     second_last_name: "Martinez".to_string(),
///     email: "juanperez@example.com".to_string(),
///     role: UserRole::User,
///     status: UserStatus::Enabled,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod paging;
pub mod task;
pub mod task_user;
pub mod user;

use thiserror::Error;

/// Errors from model operations that go beyond a plain driver failure
#[derive(Debug, Error)]
pub enum ModelError {
    /// An assignment referenced a user id that does not exist
    #[error("one or more referenced users do not exist")]
    UnknownUser,

    /// Underlying store error, classified later at the API boundary
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
