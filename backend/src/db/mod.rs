//! Database module: repository traits, backends and their configuration.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer / embedding application                     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Services - conflict validator, utilization analyzer    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - named read queries   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴───────────────┐
//!     │                               │
//! ┌───▼──────────────┐   ┌────────────▼─────────┐
//! │ LocalRepository  │   │ PostgresRepository   │
//! │   (in-memory)    │   │   (Diesel + r2d2)    │
//! └──────────────────┘   └──────────────────────┘
//! ```
//!
//! - `repository`: Trait definitions and errors
//! - `repositories::local`: In-memory implementation for tests and local development
//! - `repositories::postgres`: Postgres implementation with Diesel ORM
//! - `usage`: Utilization aggregation shared by both backends
//! - `factory` / `repo_config`: Backend selection from env or `repository.toml`
//!
//! # Recommended Usage
//!
//! ```ignore
//! use timetable_engine::db::RepositoryFactory;
//! use timetable_engine::services::{check_conflicts, ConflictQuery};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let verdict = check_conflicts(repo.as_ref(), &request).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod models;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod usage;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use repo_config::RepositoryConfig;

pub use factory::{RepositoryFactory, RepositoryType};
pub use repositories::{LocalRepository, LocalSnapshot, QueryKind};
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CatalogRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    TimetableRepository, UtilizationRepository,
};
