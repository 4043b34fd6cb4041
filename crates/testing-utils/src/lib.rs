//! # Turnover Testing Utils
//!
//! Shared testing utilities for the turnover coordination workspace.
//! This crate provides in-memory mock repositories and test data builders
//! that can be used across all other crates in the workspace.
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! turnover-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;
