//! Repository pattern implementation for data access
//!
//! Repositories own the SQL; callers work with [`crate::models`] types.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rtmp_filter::repositories::PlaylistRepository;
//! use sqlx::SqlitePool;
//!
//! async fn example(pool: SqlitePool) {
//!     let repo = PlaylistRepository::new(pool);
//!     let lookup = repo.load_lookup(42, &["Week 1".to_string()]).await;
//!     // hand `lookup` to the content filter
//! }
//! ```

pub mod playlist;
pub mod traits;

pub use playlist::{PlaylistQuery, PlaylistRepository};
pub use traits::Repository;
