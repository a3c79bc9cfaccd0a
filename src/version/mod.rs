//! Version layer: range matching, engine conditions and registry access
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│    Cache    │
//! │  (fetch)    │     │  (storage)  │
//! └─────────────┘     └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐     ┌─────────────┐
//! │ Registries  │     │   Matcher   │◀── Condition
//! │   (npm)     │     │ (range cmp) │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: SQLite-based registry entry cache with TTL
//! - [`condition`]: `node<16.0.0`-style engine predicates
//! - [`matcher`]: npm range satisfaction
//! - [`registry`]: Registry trait for fetching package metadata
//! - [`registries`]: Concrete registry implementations
//! - [`error`]: Error types for cache and registry operations
//! - [`semver`]: Shared semver utilities
//! - [`types`]: Common types like `RegistryEntry`

pub mod cache;
pub mod condition;
pub mod error;
pub mod matcher;
pub mod registries;
pub mod registry;
pub mod semver;
pub mod types;
