//! Movilake Common Library
//!
//! Shared ambient concerns for the Movilake workspace:
//!
//! - **Logging**: centralized `tracing` configuration with console/file output
//! - **Database**: PostgreSQL catalog pool construction and health checks
//!
//! # Example
//!
//! ```no_run
//! use movilake_common::db::{create_pool, DbConfig};
//! use movilake_common::logging::{init_logging, LogConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let pool = create_pool(&DbConfig::from_env()?).await?;
//!     movilake_common::db::health_check(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod logging;

pub use db::{create_pool, DbConfig, DbError, DbResult};
