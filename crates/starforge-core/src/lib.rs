//! Core types and trait definitions for the starforge galaxy generator.
//!
//! Records, the asset catalog, settings and the [`store::WorldStore`] trait.
//! No database or RNG code lives here; `starforge-gen` and the storage
//! backends both build on these types.

pub mod catalog;
pub mod error;
pub mod record;
pub mod settings;
pub mod store;
pub mod validate;

pub use error::{Error, Result};

/// First id handed out for every generated table.
pub const STARTING_ID: i64 = 1;

/// Smallest planet size a biome or a generated planet may have.
pub const MIN_PLANET_SIZE: i64 = 1;

/// Largest planet size a biome or a generated planet may have.
pub const MAX_PLANET_SIZE: i64 = 30;

/// Page size used to bound per-transaction row counts and result sets.
pub const PAGE_SIZE: usize = 1000;
