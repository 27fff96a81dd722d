//! Repository implementations for database access.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a borrowed SQLx connection (`&mut PgConnection`) or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! Multi-statement writes open their own transaction on the borrowed connection, so a
//! repository built from a plain pool connection is still atomic per operation.
//!
//! # Available Repositories
//!
//! - [`Profiles`]: profiles with their credentials, paginated search
//! - [`Roles`]: role reference lookups
//!
//! # Common Pattern
//!
//! ```ignore
//! use usrctl::db::handlers::{Profiles, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Profiles::new(&mut conn);
//!
//!     let profile = repo.get_by_id(profile_id).await?;
//!     Ok(())
//! }
//! ```

pub mod profiles;
pub mod repository;
pub mod roles;

pub use profiles::Profiles;
pub use repository::Repository;
pub use roles::Roles;
