//! forge
//!
//! Abstraction over the remote source-hosting service.
//!
//! # Architecture
//!
//! The [`GitData`] trait covers the Git object primitives the orchestration
//! in [`crate::ops`] is built on; [`Forge`] extends it with the rest of the
//! remote surface exposed as tools.
//!
//! # Modules
//!
//! - `traits`: Core traits and request types
//! - [`models`]: Request and response payloads for the non-Git endpoints
//! - [`github`]: GitHub implementation over the REST API
//! - [`mock`]: In-memory implementation for deterministic testing
//!
//! # Example
//!
//! ```ignore
//! use hubkit::forge::github::GitHubForge;
//! use hubkit::forge::models::{SearchKind, SearchQuery};
//! use hubkit::forge::Forge;
//!
//! let forge = GitHubForge::new(&token)?;
//! let results = forge
//!     .search(
//!         SearchKind::Repositories,
//!         SearchQuery {
//!             query: "language:rust".to_string(),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! println!("{} matches", results.total_count);
//! ```

pub mod github;
pub mod mock;
pub mod models;
mod traits;

pub use traits::*;
