//! Error types for `starforge-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A static asset file is missing fields or violates a numeric range.
  #[error("invalid asset {file}: {reason}")]
  InvalidAsset { file: String, reason: String },

  #[error("invalid settings: {0}")]
  InvalidSettings(String),

  #[error("database backend not supported: {0}")]
  UnsupportedBackend(String),

  /// No normal biome covers a planet size the generator produced.
  #[error("no biome accepts planet size {0}")]
  NoBiomeForSize(i64),

  #[error("planet {planet_id} of size {size} does not fit biome {biome_id}")]
  PlanetOutsideBiome { planet_id: i64, size: i64, biome_id: i64 },

  /// The `reports_to` edges would give someone two managers or a loop.
  #[error("crew hierarchy is not a forest")]
  CrewHierarchy,

  #[error(
    "ship template {template_id} uses {used} {size} slots but its class \
     allows {capacity}"
  )]
  SlotCapacityExceeded {
    template_id: i64,
    size:        &'static str,
    used:        u32,
    capacity:    u32,
  },

  #[error("spaceship module {0:?} must occupy exactly one slot size")]
  InvalidModuleSlots(String),

  #[error("io error reading {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
