//! Static catalogs loaded from the `assets/` directory.
//!
//! Every asset is parsed and validated once, before any write happens, into
//! an immutable [`Catalog`]. Stages receive the catalog by reference; nothing
//! is memoised behind their back.

use std::{collections::BTreeSet, path::Path};

use serde::Deserialize;

use crate::{
  Error, MAX_PLANET_SIZE, MIN_PLANET_SIZE, Result, STARTING_ID,
  record::{
    Biome, BiomeGenType, CombatTier, EmpireAuthority, EmpireEthic, Id, Material,
    ShipCategory, ShipClass, SlotCounts, SlotSize, SpaceshipModule,
    SpaceshipRank, StarType,
  },
};

/// Bonus added per combat tier; the weakest tier gets none.
pub const SHIP_BONUS_PER_TIER: f64 = 0.25;

const AUTHORITIES: [&str; 6] = [
  "oligarchic",
  "democratic",
  "dictatorial",
  "imperial",
  "hive_mind",
  "machine_intelligence",
];

const ETHICS: [&str; 8] = [
  "egalitarian",
  "authoritarian",
  "xenophobe",
  "xenophile",
  "pacifist",
  "militarist",
  "materialist",
  "spiritualist",
];

// ─── Asset file shapes ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StarsFile {
  star_type_weights: Vec<StarClassAsset>,
}

#[derive(Debug, Deserialize)]
struct StarClassAsset {
  name:                  String,
  weight:                f64,
  #[serde(default)]
  habitability:          f64,
  mean_celestial_bodies: f64,
}

#[derive(Debug, Deserialize)]
struct PlanetsFile {
  biomes: Vec<BiomeAsset>,
}

#[derive(Debug, Deserialize)]
struct BiomeAsset {
  name:               String,
  biome_is_habitable: bool,
  materials:          Vec<Material>,
  min_size:           i64,
  max_size:           i64,
  #[serde(default)]
  gen_type:           BiomeGenType,
  #[serde(default)]
  special_gen_mean:   f64,
}

#[derive(Debug, Deserialize)]
struct ShipsFile {
  ship_class:   Vec<ShipClassAsset>,
  ship_weapons: std::collections::BTreeMap<SlotSize, WeaponClassAsset>,
  ranks:        Vec<RankAsset>,
}

#[derive(Debug, Deserialize)]
struct ShipClassAsset {
  name:           String,
  category:       ShipCategory,
  weapons:        SlotCounts,
  command_points: i64,
  crew:           i64,
}

#[derive(Debug, Deserialize)]
struct WeaponClassAsset {
  value:      Vec<String>,
  base_power: i64,
  #[serde(default = "default_module_weight")]
  weight:     f64,
}

fn default_module_weight() -> f64 { 1.0 }

#[derive(Debug, Deserialize)]
struct RankAsset {
  name:           String,
  min_experience: i64,
  max_experience: i64,
  bonus:          f64,
}

// ─── Word lists ──────────────────────────────────────────────────────────────

/// Name components, one entry per line in the source files.
#[derive(Debug, Clone, Default)]
pub struct WordLists {
  pub star_prefixes:     Vec<String>,
  pub empire_species:    Vec<String>,
  pub empire_suffixes:   Vec<String>,
  pub fleet_prefixes:    Vec<String>,
  pub fleet_suffixes:    Vec<String>,
  pub ship_suffixes:     Vec<String>,
  pub company_prefixes:  Vec<String>,
  pub company_suffixes:  Vec<String>,
  pub crew_given_names:  Vec<String>,
  pub crew_family_names: Vec<String>,
}

impl WordLists {
  pub fn load(dir: &Path) -> Result<Self> {
    Ok(Self {
      star_prefixes:     load_word_list(dir, "stars_prefix.txt")?,
      empire_species:    load_word_list(dir, "empire_species.txt")?,
      empire_suffixes:   load_word_list(dir, "empire_suffix.txt")?,
      fleet_prefixes:    load_word_list(dir, "fleets_prefix.txt")?,
      fleet_suffixes:    load_word_list(dir, "fleets_suffix.txt")?,
      ship_suffixes:     load_word_list(dir, "ship_suffix.txt")?,
      company_prefixes:  load_word_list(dir, "ship_companies_prefix.txt")?,
      company_suffixes:  load_word_list(dir, "ship_companies_suffix.txt")?,
      crew_given_names:  load_word_list(dir, "crew_given_names.txt")?,
      crew_family_names: load_word_list(dir, "crew_family_names.txt")?,
    })
  }
}

/// Parse a newline-separated list, trimming whitespace and dropping blank
/// lines and repeats while keeping first-seen order.
pub fn parse_word_list(file: &str, raw: &str) -> Result<Vec<String>> {
  let mut seen = BTreeSet::new();
  let words: Vec<String> = raw
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .filter(|line| seen.insert(*line))
    .map(str::to_owned)
    .collect();

  if words.is_empty() {
    return Err(invalid(file, "word list is empty"));
  }
  Ok(words)
}

fn load_word_list(dir: &Path, file: &str) -> Result<Vec<String>> {
  parse_word_list(file, &read_asset(dir, file)?)
}

fn read_asset(dir: &Path, file: &str) -> Result<String> {
  let path = dir.join(file);
  std::fs::read_to_string(&path).map_err(|source| Error::Io {
    path: path.display().to_string(),
    source,
  })
}

fn invalid(file: &str, reason: impl Into<String>) -> Error {
  Error::InvalidAsset { file: file.to_owned(), reason: reason.into() }
}

fn parse_json<'a, T: Deserialize<'a>>(file: &str, raw: &'a str) -> Result<T> {
  serde_json::from_str(raw).map_err(|e| invalid(file, e.to_string()))
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Every static table the pipeline needs, validated and keyed by id.
#[derive(Debug, Clone)]
pub struct Catalog {
  pub star_types:   Vec<StarType>,
  pub biomes:       Vec<Biome>,
  pub ship_classes: Vec<ShipClass>,
  pub modules:      Vec<SpaceshipModule>,
  pub ranks:        Vec<SpaceshipRank>,
  pub authorities:  Vec<EmpireAuthority>,
  pub ethics:       Vec<EmpireEthic>,
  pub words:        WordLists,
}

impl Catalog {
  /// Load and validate every asset under `dir`.
  pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
    let dir = dir.as_ref();
    Self::from_json(
      &read_asset(dir, "stars.json")?,
      &read_asset(dir, "planets.json")?,
      &read_asset(dir, "ships.json")?,
      WordLists::load(dir)?,
    )
  }

  /// Build a catalog from already-read JSON documents.
  pub fn from_json(
    stars:   &str,
    planets: &str,
    ships:   &str,
    words:   WordLists,
  ) -> Result<Self> {
    let stars: StarsFile = parse_json("stars.json", stars)?;
    let planets: PlanetsFile = parse_json("planets.json", planets)?;
    let ships: ShipsFile = parse_json("ships.json", ships)?;

    let modules = build_modules(&ships)?;

    Ok(Self {
      star_types: build_star_types(stars)?,
      biomes: build_biomes(planets)?,
      ship_classes: build_ship_classes(&ships, &modules)?,
      ranks: build_ranks(&ships)?,
      modules,
      authorities: authorities(),
      ethics: ethics(),
      words,
    })
  }

  pub fn biome(&self, id: Id) -> Option<&Biome> {
    self.biomes.iter().find(|b| b.biome_id == id)
  }

  pub fn ship_class(&self, id: Id) -> Option<&ShipClass> {
    self.ship_classes.iter().find(|c| c.ship_class_id == id)
  }

  pub fn ship_class_by_tier(&self, tier: CombatTier) -> Option<&ShipClass> {
    self.ship_classes.iter().find(|c| c.combat_tier() == Some(tier))
  }
}

/// The fixed authority table.
pub fn authorities() -> Vec<EmpireAuthority> {
  AUTHORITIES
    .iter()
    .zip(STARTING_ID..)
    .map(|(name, authority_id)| EmpireAuthority {
      authority_id,
      name: (*name).to_owned(),
    })
    .collect()
}

/// The fixed ethic table.
pub fn ethics() -> Vec<EmpireEthic> {
  ETHICS
    .iter()
    .zip(STARTING_ID..)
    .map(|(name, ethic_id)| EmpireEthic { ethic_id, name: (*name).to_owned() })
    .collect()
}

fn build_star_types(file: StarsFile) -> Result<Vec<StarType>> {
  const FILE: &str = "stars.json";

  if file.star_type_weights.is_empty() {
    return Err(invalid(FILE, "star_type_weights is empty"));
  }

  for star in &file.star_type_weights {
    if !(star.weight > 0.0) {
      return Err(invalid(FILE, format!("{}: weight must be positive", star.name)));
    }
    if !(0.0..=1.0).contains(&star.habitability) {
      return Err(invalid(
        FILE,
        format!("{}: habitability must be within [0, 1]", star.name),
      ));
    }
    if !(0.0..=15.0).contains(&star.mean_celestial_bodies) {
      return Err(invalid(
        FILE,
        format!("{}: mean_celestial_bodies must be within [0, 15]", star.name),
      ));
    }
  }

  let total: f64 = file.star_type_weights.iter().map(|s| s.weight).sum();

  Ok(
    file
      .star_type_weights
      .into_iter()
      .zip(STARTING_ID..)
      .map(|(star, star_type_id)| StarType {
        star_type_id,
        weight_pct: star.weight / total,
        name: star.name,
        weight: star.weight,
        habitability: star.habitability,
        mean_celestial_bodies: star.mean_celestial_bodies,
      })
      .collect(),
  )
}

fn build_biomes(file: PlanetsFile) -> Result<Vec<Biome>> {
  const FILE: &str = "planets.json";
  let size_range = MIN_PLANET_SIZE..=MAX_PLANET_SIZE;

  for biome in &file.biomes {
    if !size_range.contains(&biome.min_size) || !size_range.contains(&biome.max_size)
    {
      return Err(invalid(
        FILE,
        format!(
          "{}: sizes must lie within [{MIN_PLANET_SIZE}, {MAX_PLANET_SIZE}]",
          biome.name
        ),
      ));
    }
    if biome.min_size > biome.max_size {
      return Err(invalid(FILE, format!("{}: min_size > max_size", biome.name)));
    }
    if !(biome.special_gen_mean >= 0.0) {
      return Err(invalid(
        FILE,
        format!("{}: special_gen_mean must be non-negative", biome.name),
      ));
    }
  }

  if !file.biomes.iter().any(|b| b.gen_type == BiomeGenType::Normal) {
    return Err(invalid(FILE, "at least one normal biome is required"));
  }

  Ok(
    file
      .biomes
      .into_iter()
      .zip(STARTING_ID..)
      .map(|(biome, biome_id)| Biome {
        biome_id,
        name: biome.name,
        is_habitable: biome.biome_is_habitable,
        min_size: biome.min_size,
        max_size: biome.max_size,
        gen_type: biome.gen_type,
        materials: biome.materials,
        special_gen_mean: biome.special_gen_mean,
      })
      .collect(),
  )
}

fn build_modules(file: &ShipsFile) -> Result<Vec<SpaceshipModule>> {
  const FILE: &str = "ships.json";

  let mut names = BTreeSet::new();
  let mut modules = Vec::new();

  // BTreeMap iteration follows `SlotSize` order, smallest first.
  for (size, class) in &file.ship_weapons {
    if class.base_power < 0 {
      return Err(invalid(
        FILE,
        format!("{}: base_power must be non-negative", size.as_str()),
      ));
    }
    if !(class.weight > 0.0) {
      return Err(invalid(
        FILE,
        format!("{}: weight must be positive", size.as_str()),
      ));
    }

    for name in &class.value {
      if !names.insert(name.as_str()) {
        return Err(invalid(FILE, format!("duplicate module name {name:?}")));
      }
      modules.push(SpaceshipModule {
        module_id: STARTING_ID + modules.len() as Id,
        name:      name.clone(),
        power:     class.base_power,
        weight:    class.weight,
        slots:     SlotCounts::one_hot(*size),
      });
    }
  }

  Ok(modules)
}

fn build_ship_classes(
  file:    &ShipsFile,
  modules: &[SpaceshipModule],
) -> Result<Vec<ShipClass>> {
  const FILE: &str = "ships.json";

  let mut names = BTreeSet::new();
  let mut classes = Vec::with_capacity(file.ship_class.len());

  for (class, ship_class_id) in file.ship_class.iter().zip(STARTING_ID..) {
    if !names.insert(class.name.as_str()) {
      return Err(invalid(FILE, format!("duplicate ship class {:?}", class.name)));
    }
    if class.command_points < 0 || class.crew < 0 {
      return Err(invalid(
        FILE,
        format!("{}: command_points and crew must be non-negative", class.name),
      ));
    }

    let tier = match class.category {
      ShipCategory::Combat => Some(CombatTier::from_name(&class.name).ok_or_else(
        || invalid(FILE, format!("{:?} is not a combat tier", class.name)),
      )?),
      _ => None,
    };

    for (size, _) in class.weapons.nonzero() {
      if !modules.iter().any(|m| m.slots.get(size) > 0) {
        return Err(invalid(
          FILE,
          format!("{}: no module fits {} slots", class.name, size.as_str()),
        ));
      }
    }

    classes.push(ShipClass {
      ship_class_id,
      name: class.name.clone(),
      category: class.category,
      slots: class.weapons,
      command_points: class.command_points,
      crew_count: class.crew,
      bonus: tier.map(|t| SHIP_BONUS_PER_TIER * t.rank() as f64),
    });
  }

  for tier in CombatTier::ALL {
    if !classes.iter().any(|c| c.combat_tier() == Some(tier)) {
      return Err(invalid(
        FILE,
        format!("combat tier {:?} is missing", tier.as_str()),
      ));
    }
  }

  Ok(classes)
}

fn build_ranks(file: &ShipsFile) -> Result<Vec<SpaceshipRank>> {
  const FILE: &str = "ships.json";

  file
    .ranks
    .iter()
    .zip(STARTING_ID..)
    .map(|(rank, rank_id)| {
      if rank.min_experience >= rank.max_experience {
        return Err(invalid(
          FILE,
          format!("rank {}: min_experience must be below max_experience", rank.name),
        ));
      }
      Ok(SpaceshipRank {
        rank_id,
        name: rank.name.clone(),
        min_experience: rank.min_experience,
        max_experience: rank.max_experience,
        bonus: rank.bonus,
      })
    })
    .collect()
}
