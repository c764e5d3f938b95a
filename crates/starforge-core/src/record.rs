//! Record types, one plain struct per table in the galaxy schema.
//!
//! Relations are explicit integer foreign keys. Nothing here holds a
//! reference to another record; lookups go through the
//! [`WorldStore`](crate::store::WorldStore) query methods instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Primary and foreign key type for every table.
pub type Id = i64;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The four planet/empire resource columns.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Material {
  Minerals,
  Energy,
  Research,
  Trade,
}

impl Material {
  pub const ALL: [Material; 4] =
    [Material::Minerals, Material::Energy, Material::Research, Material::Trade];

  pub fn as_str(self) -> &'static str {
    match self {
      Material::Minerals => "minerals",
      Material::Energy => "energy",
      Material::Research => "research",
      Material::Trade => "trade",
    }
  }
}

/// How a biome is placed onto planets.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BiomeGenType {
  /// Assigned during regular generation by planet size.
  #[default]
  Normal,
  /// Overlaid onto a few existing planets after generation.
  Special,
  /// Like `Special`, but rarer and typically much larger yields.
  Megastructure,
}

impl BiomeGenType {
  pub fn as_str(self) -> &'static str {
    match self {
      BiomeGenType::Normal => "normal",
      BiomeGenType::Special => "special",
      BiomeGenType::Megastructure => "megastructure",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipCategory {
  Combat,
  Stationary,
  Civilian,
}

impl ShipCategory {
  pub fn as_str(self) -> &'static str {
    match self {
      ShipCategory::Combat => "combat",
      ShipCategory::Stationary => "stationary",
      ShipCategory::Civilian => "civilian",
    }
  }
}

/// The nine combat ship tiers, weakest first.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CombatTier {
  Corvette,
  Frigate,
  Destroyer,
  Cruiser,
  Battleship,
  Titan,
  Juggernaut,
  Colossus,
  StarEater,
}

impl CombatTier {
  pub const ALL: [CombatTier; 9] = [
    CombatTier::Corvette,
    CombatTier::Frigate,
    CombatTier::Destroyer,
    CombatTier::Cruiser,
    CombatTier::Battleship,
    CombatTier::Titan,
    CombatTier::Juggernaut,
    CombatTier::Colossus,
    CombatTier::StarEater,
  ];

  /// Zero-based rank; higher is stronger and rarer.
  pub fn rank(self) -> usize { self as usize }

  pub fn as_str(self) -> &'static str {
    match self {
      CombatTier::Corvette => "corvette",
      CombatTier::Frigate => "frigate",
      CombatTier::Destroyer => "destroyer",
      CombatTier::Cruiser => "cruiser",
      CombatTier::Battleship => "battleship",
      CombatTier::Titan => "titan",
      CombatTier::Juggernaut => "juggernaut",
      CombatTier::Colossus => "colossus",
      CombatTier::StarEater => "star_eater",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|t| t.as_str() == name)
  }
}

/// Component slot sizes, smallest first.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SlotSize {
  Small,
  Medium,
  Large,
  Xlarge,
  Titan,
  Juggernaut,
  Colossus,
  StarEater,
}

impl SlotSize {
  pub const ALL: [SlotSize; 8] = [
    SlotSize::Small,
    SlotSize::Medium,
    SlotSize::Large,
    SlotSize::Xlarge,
    SlotSize::Titan,
    SlotSize::Juggernaut,
    SlotSize::Colossus,
    SlotSize::StarEater,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      SlotSize::Small => "small",
      SlotSize::Medium => "medium",
      SlotSize::Large => "large",
      SlotSize::Xlarge => "xlarge",
      SlotSize::Titan => "titan",
      SlotSize::Juggernaut => "juggernaut",
      SlotSize::Colossus => "colossus",
      SlotSize::StarEater => "star_eater",
    }
  }
}

// ─── Component slots ─────────────────────────────────────────────────────────

/// Per-size slot counts. Used both for ship class capacities and for the
/// one-hot size marker on modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotCounts {
  pub small:      u32,
  pub medium:     u32,
  pub large:      u32,
  pub xlarge:     u32,
  pub titan:      u32,
  pub juggernaut: u32,
  pub colossus:   u32,
  pub star_eater: u32,
}

impl SlotCounts {
  /// A one-hot marker for a module of the given size.
  pub fn one_hot(size: SlotSize) -> Self {
    let mut slots = Self::default();
    *slots.get_mut(size) = 1;
    slots
  }

  pub fn get(&self, size: SlotSize) -> u32 {
    match size {
      SlotSize::Small => self.small,
      SlotSize::Medium => self.medium,
      SlotSize::Large => self.large,
      SlotSize::Xlarge => self.xlarge,
      SlotSize::Titan => self.titan,
      SlotSize::Juggernaut => self.juggernaut,
      SlotSize::Colossus => self.colossus,
      SlotSize::StarEater => self.star_eater,
    }
  }

  pub fn get_mut(&mut self, size: SlotSize) -> &mut u32 {
    match size {
      SlotSize::Small => &mut self.small,
      SlotSize::Medium => &mut self.medium,
      SlotSize::Large => &mut self.large,
      SlotSize::Xlarge => &mut self.xlarge,
      SlotSize::Titan => &mut self.titan,
      SlotSize::Juggernaut => &mut self.juggernaut,
      SlotSize::Colossus => &mut self.colossus,
      SlotSize::StarEater => &mut self.star_eater,
    }
  }

  /// Sizes with a nonzero count, smallest first.
  pub fn nonzero(&self) -> impl Iterator<Item = (SlotSize, u32)> + '_ {
    SlotSize::ALL
      .into_iter()
      .map(|size| (size, self.get(size)))
      .filter(|(_, n)| *n > 0)
  }
}

// ─── Resources ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
  pub minerals: i64,
  pub energy:   i64,
  pub research: i64,
  pub trade:    i64,
}

impl Resources {
  pub fn get(&self, material: Material) -> i64 {
    match material {
      Material::Minerals => self.minerals,
      Material::Energy => self.energy,
      Material::Research => self.research,
      Material::Trade => self.trade,
    }
  }

  pub fn set(&mut self, material: Material, value: i64) {
    match material {
      Material::Minerals => self.minerals = value,
      Material::Energy => self.energy = value,
      Material::Research => self.research = value,
      Material::Trade => self.trade = value,
    }
  }
}

// ─── Stars & planets ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarType {
  pub star_type_id:          Id,
  pub name:                  String,
  pub weight:                f64,
  /// `weight` normalised over the whole table.
  pub weight_pct:            f64,
  pub habitability:          f64,
  pub mean_celestial_bodies: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarSystem {
  pub star_system_id: Id,
  pub name:           String,
  pub star_type_id:   Id,
  pub is_choke_point: bool,
  pub empire_owner:   Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
  pub biome_id:         Id,
  pub name:             String,
  pub is_habitable:     bool,
  pub min_size:         i64,
  pub max_size:         i64,
  pub gen_type:         BiomeGenType,
  pub materials:        Vec<Material>,
  pub special_gen_mean: f64,
}

impl Biome {
  pub fn accepts_size(&self, size: i64) -> bool {
    self.min_size <= size && size <= self.max_size
  }

  pub fn has_material(&self, material: Material) -> bool {
    self.materials.contains(&material)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
  pub planet_id:      Id,
  pub name:           String,
  pub size:           i64,
  pub star_system_id: Id,
  pub biome_id:       Id,
  pub resources:      Resources,
  pub pops:           i64,
}

// ─── Empires ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmpireAuthority {
  pub authority_id: Id,
  pub name:         String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmpireEthic {
  pub ethic_id: Id,
  pub name:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empire {
  pub empire_id:    Id,
  pub name:         String,
  pub authority_id: Id,
  pub score:        Option<i64>,
}

/// Row of the empire ↔ ethic relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmpireToEthic {
  pub empire_id:  Id,
  pub ethic_id:   Id,
  /// 1 for a regular ethic, 2 for a fanatic one.
  pub attraction: i64,
}

/// An empire together with everything later stages have derived for it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmpireInfo {
  pub empire_id:            Id,
  pub name:                 String,
  pub authority_id:         Id,
  pub score:                Option<i64>,
  /// `(ethic_id, attraction)` pairs, ordered by ethic id.
  pub ethics:               Vec<(Id, i64)>,
  pub expansion_score:      i64,
  pub gov_efficiency_bonus: i64,
  pub num_systems:          i64,
  pub totals:               Resources,
  pub colonies_count:       i64,
  pub pops_count:           i64,
  pub total_fleets:         i64,
  pub max_fleet_size:       i64,
}

/// Economy columns written by resource accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmpireEconomy {
  pub empire_id:            Id,
  pub gov_efficiency_bonus: i64,
  pub num_systems:          i64,
  pub totals:               Resources,
  pub colonies_count:       i64,
  pub pops_count:           i64,
}

/// Fleet caps written by the fleet factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCaps {
  pub empire_id:      Id,
  pub total_fleets:   i64,
  pub max_fleet_size: i64,
}

// ─── Fleets & ships ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
  pub fleet_id:       Id,
  pub name:           String,
  pub empire_id:      Id,
  pub cloak_strength: i64,
  pub is_docked:      bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipClass {
  pub ship_class_id:  Id,
  pub name:           String,
  pub category:       ShipCategory,
  pub slots:          SlotCounts,
  pub command_points: i64,
  pub crew_count:     i64,
  /// Experience-scaling bonus; only combat classes carry one.
  pub bonus:          Option<f64>,
}

impl ShipClass {
  pub fn combat_tier(&self) -> Option<CombatTier> {
    match self.category {
      ShipCategory::Combat => CombatTier::from_name(&self.name),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceshipModule {
  pub module_id: Id,
  pub name:      String,
  pub power:     i64,
  pub weight:    f64,
  /// Exactly one size is nonzero; see [`crate::validate::module_size`].
  pub slots:     SlotCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipTemplate {
  pub template_id:   Id,
  pub name:          String,
  pub ship_class_id: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipTemplateModule {
  pub template_id: Id,
  pub module_id:   Id,
  pub count:       u32,
}

/// Experience band used to weight fleet power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceshipRank {
  pub rank_id:        Id,
  pub name:           String,
  pub min_experience: i64,
  pub max_experience: i64,
  pub bonus:          f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spaceship {
  pub spaceship_id: Id,
  pub name:         String,
  pub fleet_id:     Id,
  pub template_id:  Id,
  /// `None` for stationary and civilian ships.
  pub experience:   Option<i64>,
}

// ─── Crew ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crew {
  pub crew_id:            Id,
  pub name:               String,
  pub spaceship_id:       Id,
  pub command_points:     i64,
  pub reports_to:         Option<Id>,
  pub birth_date:         DateTime<Utc>,
  pub hire_date:          DateTime<Utc>,
  pub planet_of_birth_id: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportsTo {
  pub crew_id:    Id,
  pub reports_to: Id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewFriend {
  pub crew_id:   Id,
  pub friend_id: Id,
}
