/// Database layer for TaskTrack
///
/// This module provides database connection pooling, migrations, and the
/// single translation boundary from PostgreSQL error codes to the internal
/// error-kind enum.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Database migration runner
/// - `error`: SQLSTATE classification into `DbErrorKind`
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod error;
pub mod migrations;
pub mod pool;

pub use error::{classify, DbErrorKind};
