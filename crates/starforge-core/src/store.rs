//! The `WorldStore` trait: the persistence interface the pipeline needs.
//!
//! The trait is implemented by storage backends (e.g.
//! `starforge-store-sqlite`). The generation stages depend on this
//! abstraction, not on any concrete backend.
//!
//! Every bulk write runs in its own transaction: it commits when the call
//! returns `Ok` and rolls back otherwise.

use std::future::Future;

use crate::record::{
  Biome, Crew, CrewFriend, Empire, EmpireAuthority, EmpireEconomy, EmpireEthic,
  EmpireInfo, EmpireToEthic, Fleet, FleetCaps, Id, Planet, ReportsTo, ShipClass,
  ShipTemplate, ShipTemplateModule, Spaceship, SpaceshipModule, SpaceshipRank,
  StarSystem, StarType,
};

/// Abstraction over a galaxy database backend.
///
/// All methods return `Send` futures so the trait can be driven from a
/// multi-threaded runtime, even though the pipeline itself awaits calls
/// strictly one at a time.
pub trait WorldStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Drop every table and recreate the schema from scratch.
  fn reset_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Stars ─────────────────────────────────────────────────────────────

  fn insert_star_types(
    &self,
    rows: Vec<StarType>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_star_systems(
    &self,
    rows: Vec<StarSystem>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_star_types(
    &self,
  ) -> impl Future<Output = Result<Vec<StarType>, Self::Error>> + Send + '_;

  /// One page of star systems of a given type, ordered by id.
  fn star_systems_of_type(
    &self,
    star_type_id: Id,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<StarSystem>, Self::Error>> + Send + '_;

  /// One page of ids of star systems holding at least one habitable planet,
  /// ordered by id.
  fn habitable_star_systems(
    &self,
    limit: usize,
    offset: usize,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  /// Ids of every star system without an owner, ordered by id.
  fn unowned_star_systems(
    &self,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  /// Set `empire_owner` for each `(star_system_id, empire_id)` pair.
  fn set_star_owners(
    &self,
    owners: Vec<(Id, Id)>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Planets ───────────────────────────────────────────────────────────

  fn insert_biomes(
    &self,
    rows: Vec<Biome>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_biomes(
    &self,
  ) -> impl Future<Output = Result<Vec<Biome>, Self::Error>> + Send + '_;

  fn insert_planets(
    &self,
    rows: Vec<Planet>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Every planet, ordered by id.
  fn list_planets(
    &self,
  ) -> impl Future<Output = Result<Vec<Planet>, Self::Error>> + Send + '_;

  /// Overwrite size, biome, resources and pops of existing planets by id.
  fn update_planets(
    &self,
    rows: Vec<Planet>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Ids of every habitable planet, ordered by id.
  fn habitable_planet_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  /// Habitable planets inside the empire's systems, ordered by id.
  fn empire_habitable_planets(
    &self,
    empire_id: Id,
  ) -> impl Future<Output = Result<Vec<Planet>, Self::Error>> + Send + '_;

  /// Multiply research and trade of every planet in a chokepoint system.
  ///
  /// Not idempotent: each call compounds the multiplier. Returns the number
  /// of planets touched.
  fn rescale_choke_point_planets(
    &self,
    multiplier: f64,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Empires ───────────────────────────────────────────────────────────

  fn insert_authorities(
    &self,
    rows: Vec<EmpireAuthority>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_ethics(
    &self,
    rows: Vec<EmpireEthic>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_empires(
    &self,
    rows: Vec<Empire>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_empire_ethics(
    &self,
    rows: Vec<EmpireToEthic>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Every empire with its ethics and derived columns, ordered by id.
  fn list_empires(
    &self,
  ) -> impl Future<Output = Result<Vec<EmpireInfo>, Self::Error>> + Send + '_;

  /// Delete empires owning no star system, dependents first.
  /// Returns the number of empires removed.
  fn remove_empires_without_systems(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn set_expansion_scores(
    &self,
    scores: Vec<(Id, i64)>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Per-empire sums of the four resource columns over every owned planet,
  /// plus owned-system, colony and pop counts. `gov_efficiency_bonus` is
  /// returned as currently stored.
  fn empire_economy(
    &self,
  ) -> impl Future<Output = Result<Vec<EmpireEconomy>, Self::Error>> + Send + '_;

  fn set_empire_economy(
    &self,
    rows: Vec<EmpireEconomy>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn set_fleet_caps(
    &self,
    rows: Vec<FleetCaps>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn set_empire_scores(
    &self,
    scores: Vec<(Id, i64)>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Fleets & ships ────────────────────────────────────────────────────

  fn insert_fleets(
    &self,
    rows: Vec<Fleet>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Fleet ids owned by an empire, ordered by id.
  fn empire_fleets(
    &self,
    empire_id: Id,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  fn insert_ship_classes(
    &self,
    rows: Vec<ShipClass>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_ship_classes(
    &self,
  ) -> impl Future<Output = Result<Vec<ShipClass>, Self::Error>> + Send + '_;

  fn insert_modules(
    &self,
    rows: Vec<SpaceshipModule>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_ranks(
    &self,
    rows: Vec<SpaceshipRank>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_ship_templates(
    &self,
    rows: Vec<ShipTemplate>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_template_modules(
    &self,
    rows: Vec<ShipTemplateModule>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn list_template_modules(
    &self,
  ) -> impl Future<Output = Result<Vec<ShipTemplateModule>, Self::Error>> + Send + '_;

  /// Template ids of a ship class, ordered by id.
  fn templates_of_class(
    &self,
    ship_class_id: Id,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  fn insert_spaceships(
    &self,
    rows: Vec<Spaceship>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Ids of an empire's ships of one class, ordered by id.
  fn empire_ships_of_class(
    &self,
    empire_id: Id,
    ship_class_id: Id,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  /// Fleet power per empire for ships of one class whose experience falls in
  /// the rank's band: Σ module count × module power × (1 + rank bonus).
  fn fleet_power(
    &self,
    rank: SpaceshipRank,
    ship_class_id: Id,
  ) -> impl Future<Output = Result<Vec<(Id, f64)>, Self::Error>> + Send + '_;

  // ── Crew ──────────────────────────────────────────────────────────────

  fn insert_crew(
    &self,
    rows: Vec<Crew>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Crew ids serving on the empire's ships, ordered by id.
  fn empire_crew(
    &self,
    empire_id: Id,
  ) -> impl Future<Output = Result<Vec<Id>, Self::Error>> + Send + '_;

  fn set_reports_to(
    &self,
    rows: Vec<ReportsTo>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn insert_crew_friends(
    &self,
    rows: Vec<CrewFriend>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
