//! # CodeKB
//!
//! A per-user codebase knowledge index for retrieval-augmented code
//! assistance. Workspaces are split into symbol-granular chunks, indexed
//! into a dense vector collection and a keyword index, and served through a
//! hybrid retrieval pipeline.
//!
//! ## Architecture
//!
//! The crate is organized following Domain-Driven Design principles:
//!
//! - `domain`: Core models and the error type
//! - `application`: Port traits, the refresh orchestrator and the search fuser
//! - `connector`: External integrations (DuckDB, tree-sitter, embeddings,
//!   HTTP and agent surfaces)

pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

// Re-export commonly used types
pub use application::*;
pub use connector::*;
pub use domain::*;
