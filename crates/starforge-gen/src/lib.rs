//! The galaxy generation pipeline.
//!
//! [`generate_galaxy`] runs the eight stages in order against any
//! [`WorldStore`]. Each stage reads what earlier stages wrote back from the
//! store, so the only state threaded between them is the catalog, the
//! settings and one random number generator.
//!
//! The store must start from an empty schema; call
//! [`WorldStore::reset_schema`] first.

pub mod crew;
pub mod economy;
pub mod empires;
pub mod error;
pub mod fleets;
pub mod graph;
pub mod planets;
pub mod ships;
pub mod stars;
pub mod stats;
pub mod territory;

use rand::Rng;
use starforge_core::{catalog::Catalog, settings::Settings, store::WorldStore};

pub use error::{Error, Result};

use crate::{crew::CrewSummary, territory::Territory};

/// Row counts written by one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GalaxySummary {
  pub star_systems: usize,
  pub planets:      usize,
  pub empires:      usize,
  pub territory:    Territory,
  pub fleets:       usize,
  pub spaceships:   usize,
  pub crew:         CrewSummary,
}

/// Run every stage: stars, planets, empires, territory, resources, fleets,
/// ships and crew.
pub async fn generate_galaxy<S>(
  store:    &S,
  catalog:  &Catalog,
  settings: &Settings,
  rng:      &mut impl Rng,
) -> Result<GalaxySummary>
where
  S: WorldStore,
{
  settings.validate()?;
  tracing::info!(
    num_stars = settings.num_stars,
    number_of_empires = settings.number_of_empires,
    seed = settings.random_seed,
    "generating galaxy"
  );

  let star_systems = stars::create_stars(store, catalog, settings, rng).await?;
  let planets = planets::create_planets(store, catalog, settings, rng).await?;
  let created = empires::create_empires(store, catalog, settings, rng).await?;
  let territory = territory::assign_territory(store, catalog, settings, rng).await?;
  economy::accumulate_resources(store, catalog, settings, rng).await?;
  let fleets = fleets::create_fleets(store, catalog, rng).await?;
  let spaceships = ships::create_ships(store, catalog, rng).await?;
  let crew = crew::create_crew(store, catalog, rng).await?;

  let summary = GalaxySummary {
    star_systems,
    planets,
    empires: created.saturating_sub(territory.removed_empires),
    territory,
    fleets,
    spaceships,
    crew,
  };
  tracing::info!(?summary, "galaxy generated");
  Ok(summary)
}
