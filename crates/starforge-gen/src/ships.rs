//! Ship factory: the class taxonomy, company templates with weighted module
//! loadouts, and per-empire fleets of ship instances.

use std::collections::{BTreeMap, BTreeSet};

use rand::{
  Rng,
  distributions::{Distribution, WeightedIndex},
  seq::SliceRandom,
};
use starforge_core::{
  PAGE_SIZE, STARTING_ID,
  catalog::Catalog,
  record::{
    CombatTier, EmpireInfo, Id, ShipCategory, ShipClass, ShipTemplate,
    ShipTemplateModule, Spaceship, SpaceshipModule,
  },
  store::WorldStore,
  validate,
};

use crate::{
  Error, Result,
  economy::score_empires,
  stats::{cut, normal},
};

/// Percent of the command limit spent on each regular combat class.
const REGULAR_SHARES: [(CombatTier, f64); 4] = [
  (CombatTier::Battleship, 3.125),
  (CombatTier::Cruiser, 6.25),
  (CombatTier::Destroyer, 12.5),
  (CombatTier::Frigate, 25.0),
];

/// Command limit per ship of each capital class. The star eater is capped at
/// one.
const SPECIAL_DIVISORS: [(CombatTier, i64); 3] = [
  (CombatTier::Colossus, 160),
  (CombatTier::Juggernaut, 80),
  (CombatTier::Titan, 20),
];

/// Non-combat ships per hundred combat ships.
const SUPPORT_PER_HUNDRED: f64 = 20.0;

/// Each combat tier is this many times rarer than the tier below it.
const COMBAT_WEIGHT_BASE: f64 = 2.75;

/// Experience scale: the mean gained per base-2.75 unit of class rarity,
/// and the root of the spread.
const MEAN_EXPERIENCE: f64 = 25.0;

/// Relative odds of a support ship being stationary or civilian.
const SUPPORT_WEIGHTS: [(ShipCategory, u32); 2] =
  [(ShipCategory::Stationary, 15), (ShipCategory::Civilian, 5)];

pub async fn create_ships<S>(store: &S, catalog: &Catalog, rng: &mut impl Rng) -> Result<usize>
where
  S: WorldStore,
{
  tracing::info!("generating ships");

  store
    .insert_ship_classes(catalog.ship_classes.clone())
    .await
    .map_err(Error::store)?;
  store.insert_modules(catalog.modules.clone()).await.map_err(Error::store)?;
  store.insert_ranks(catalog.ranks.clone()).await.map_err(Error::store)?;

  let (templates, loadouts) = build_templates(catalog, rng)?;
  let template_count = templates.len();
  store.insert_ship_templates(templates).await.map_err(Error::store)?;
  for chunk in loadouts.chunks(PAGE_SIZE) {
    store.insert_template_modules(chunk.to_vec()).await.map_err(Error::store)?;
  }
  tracing::debug!(templates = template_count, loadout_rows = loadouts.len(), "templates written");

  let mut class_templates: BTreeMap<Id, Vec<Id>> = BTreeMap::new();
  for class in &catalog.ship_classes {
    let ids = store
      .templates_of_class(class.ship_class_id)
      .await
      .map_err(Error::store)?;
    class_templates.insert(class.ship_class_id, ids);
  }

  let empires = store.list_empires().await.map_err(Error::store)?;
  let compositions = compose_fleets(&empires, catalog, rng);

  let mut batch = Vec::with_capacity(PAGE_SIZE);
  let mut written = 0;
  let mut next_id = STARTING_ID;

  for (empire, composition) in empires.iter().zip(compositions) {
    let fleets = store.empire_fleets(empire.empire_id).await.map_err(Error::store)?;
    let total: usize = composition.values().sum();
    if fleets.is_empty() {
      if total > 0 {
        tracing::warn!(empire_id = empire.empire_id, ships = total, "empire has no fleet to crew ships into");
      }
      continue;
    }

    let prefix = registry_prefix(rng);
    for (class_id, count) in composition {
      let Some(class) = catalog.ship_class(class_id) else { continue };
      let Some(templates) = class_templates.get(&class_id).filter(|t| !t.is_empty()) else {
        continue;
      };

      for _ in 0..count {
        let suffix = catalog.words.ship_suffixes.choose(rng).map_or("", String::as_str);
        let fleet_id = fleets[rng.gen_range(0..fleets.len())];
        let template_id = templates[rng.gen_range(0..templates.len())];
        let experience = class.combat_tier().map(|tier| draw_experience(tier, rng));

        batch.push(Spaceship {
          spaceship_id: next_id,
          name: format!("{prefix} {suffix}"),
          fleet_id,
          template_id,
          experience,
        });
        next_id += 1;

        if batch.len() == PAGE_SIZE {
          written += store
            .insert_spaceships(std::mem::take(&mut batch))
            .await
            .map_err(Error::store)?;
          tracing::debug!(written, "ship page written");
        }
      }
    }
  }
  if !batch.is_empty() {
    written += store.insert_spaceships(batch).await.map_err(Error::store)?;
  }

  score_empires(store, catalog).await?;

  tracing::info!(written, templates = template_count, "ships done");
  Ok(written)
}

// ─── Templates ───────────────────────────────────────────────────────────────

/// Company-branded templates for every class, each with a loadout drawn by
/// module weight.
pub fn build_templates(
  catalog: &Catalog,
  rng:     &mut impl Rng,
) -> Result<(Vec<ShipTemplate>, Vec<ShipTemplateModule>)> {
  let wanted = ((catalog.ship_classes.len() + 1) as f64).powf(1.5).ceil() as usize;
  let companies = company_pool(catalog, wanted, rng);

  let mut classes: Vec<&ShipClass> = catalog.ship_classes.iter().collect();
  classes.sort_by(|a, b| b.command_points.cmp(&a.command_points));

  let mut templates = Vec::new();
  let mut loadouts = Vec::new();

  for (class, rank) in classes.into_iter().zip(1..) {
    let makers = ((rank as f64).powf(1.5) as usize).min(companies.len());
    for company in companies.choose_multiple(rng, makers) {
      let template_id = STARTING_ID + templates.len() as Id;
      let loadout = draw_loadout(template_id, class, &catalog.modules, rng)?;
      validate::template_slots(template_id, class, &loadout, &catalog.modules)?;

      templates.push(ShipTemplate {
        template_id,
        name: format!("{company} {}", display_name(&class.name)),
        ship_class_id: class.ship_class_id,
      });
      loadouts.extend(loadout);
    }
  }
  Ok((templates, loadouts))
}

/// `star_eater` becomes `Star Eater`.
fn display_name(class_name: &str) -> String {
  class_name
    .split(|c: char| c == '_' || c.is_whitespace())
    .filter(|word| !word.is_empty())
    .map(|word| {
      let mut chars = word.chars();
      chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
      })
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Unique "Prefix Suffix" company names.
fn company_pool(catalog: &Catalog, wanted: usize, rng: &mut impl Rng) -> Vec<String> {
  let words = &catalog.words;
  let mut seen = BTreeSet::new();
  let combos: Vec<String> = words
    .company_prefixes
    .iter()
    .flat_map(|p| words.company_suffixes.iter().map(move |s| format!("{p} {s}")))
    .filter(|name| seen.insert(name.clone()))
    .collect();

  if combos.len() < wanted {
    tracing::warn!(wanted, available = combos.len(), "not enough company names");
  }
  combos.choose_multiple(rng, wanted.min(combos.len())).cloned().collect()
}

/// Fill every slot of the class with a module of that size, drawn with
/// replacement by module weight.
fn draw_loadout(
  template_id: Id,
  class:       &ShipClass,
  modules:     &[SpaceshipModule],
  rng:         &mut impl Rng,
) -> Result<Vec<ShipTemplateModule>> {
  let mut counts: BTreeMap<Id, u32> = BTreeMap::new();

  for (size, capacity) in class.slots.nonzero() {
    let fitting: Vec<&SpaceshipModule> =
      modules.iter().filter(|m| m.slots.get(size) > 0).collect();
    let weights = WeightedIndex::new(fitting.iter().map(|m| m.weight))?;
    for _ in 0..capacity {
      *counts.entry(fitting[weights.sample(rng)].module_id).or_default() += 1;
    }
  }

  Ok(
    counts
      .into_iter()
      .map(|(module_id, count)| ShipTemplateModule { template_id, module_id, count })
      .collect(),
  )
}

// ─── Composition ─────────────────────────────────────────────────────────────

/// Ship counts keyed by class id for each empire, in empire order.
pub fn compose_fleets(
  empires: &[EmpireInfo],
  catalog: &Catalog,
  rng:     &mut impl Rng,
) -> Vec<BTreeMap<Id, usize>> {
  let limits: Vec<i64> = empires.iter().map(|e| e.total_fleets * e.max_fleet_size).collect();
  let tiers = cut(&limits.iter().map(|&l| l as f64).collect::<Vec<_>>(), CombatTier::ALL.len());
  let mean_limit = if limits.is_empty() {
    0.0
  } else {
    limits.iter().sum::<i64>() as f64 / limits.len() as f64
  };

  limits
    .iter()
    .zip(tiers)
    .map(|(&limit, label)| {
      let combat = combat_counts(limit, label - 1, mean_limit, rng);
      let mut counts = BTreeMap::new();
      for (tier, count) in CombatTier::ALL.into_iter().zip(combat) {
        if let Some(class) = catalog.ship_class_by_tier(tier) {
          if count > 0 {
            counts.insert(class.ship_class_id, count);
          }
        }
      }

      let support = (combat.iter().sum::<usize>() as f64 * SUPPORT_PER_HUNDRED / 100.0).round();
      for class_id in support_classes(catalog, support as usize, rng) {
        *counts.entry(class_id).or_default() += 1;
      }
      counts
    })
    .collect()
}

/// Combat ship counts indexed by tier rank for one command limit.
pub fn combat_counts(
  limit:      i64,
  max_tier:   usize,
  mean_limit: f64,
  rng:        &mut impl Rng,
) -> [usize; 9] {
  let mut counts = [0usize; 9];
  let limit = limit.max(0);
  let allowed = |tier: CombatTier| tier.rank() <= max_tier;

  if allowed(CombatTier::StarEater) {
    counts[CombatTier::StarEater.rank()] = limit.min(1) as usize;
  }
  for (tier, divisor) in SPECIAL_DIVISORS {
    if allowed(tier) {
      counts[tier.rank()] = (limit / divisor) as usize;
    }
  }
  for (tier, share) in REGULAR_SHARES {
    if allowed(tier) {
      let n = (limit as f64 * (share + normal(rng, 0.0, 0.125)) / 100.0).trunc();
      counts[tier.rank()] = n.max(0.0) as usize;
    }
  }

  let slack_cap = ((mean_limit / 10.0).ceil() as i64).max(2);
  let slack = rng.gen_range(0..slack_cap);
  let others: i64 = counts.iter().sum::<usize>() as i64;
  counts[CombatTier::Corvette.rank()] = (limit - others - slack).max(0) as usize;
  counts
}

fn support_classes(catalog: &Catalog, count: usize, rng: &mut impl Rng) -> Vec<Id> {
  let by_category: Vec<Vec<Id>> = SUPPORT_WEIGHTS
    .iter()
    .map(|(category, _)| {
      catalog
        .ship_classes
        .iter()
        .filter(|c| c.category == *category)
        .map(|c| c.ship_class_id)
        .collect()
    })
    .collect();

  let Ok(categories) = WeightedIndex::new(SUPPORT_WEIGHTS.iter().map(|(_, w)| *w)) else {
    return Vec::new();
  };

  (0..count)
    .filter_map(|_| by_category[categories.sample(rng)].choose(rng).copied())
    .collect()
}

/// Categorical weight of each combat tier, indexed by rank: corvettes get
/// `2.75^8`, the star eater `1`.
pub fn combat_weights() -> [f64; 9] {
  let mut weights = [0.0; 9];
  for (exponent, weight) in weights.iter_mut().rev().enumerate() {
    *weight = COMBAT_WEIGHT_BASE.powi(exponent as i32);
  }
  weights
}

/// Mean experience of a tier: `25 · (1 + log₂.₇₅(Σw / w_tier))`, the
/// rarity of the tier under [`combat_weights`] measured in base-2.75 steps.
/// Each tier up is 2.75 times rarer and so adds 25.
pub fn experience_mean(tier: CombatTier) -> f64 {
  let weights = combat_weights();
  let total: f64 = weights.iter().sum();
  let rarity = (total / weights[tier.rank()]).ln() / COMBAT_WEIGHT_BASE.ln();
  MEAN_EXPERIENCE * (1.0 + rarity)
}

/// `max(0, N(experience_mean(tier), 25^1.5))`.
fn draw_experience(tier: CombatTier, rng: &mut impl Rng) -> i64 {
  normal(rng, experience_mean(tier), MEAN_EXPERIENCE.powf(1.5))
    .round()
    .max(0.0) as i64
}

/// Three random capital letters shared by an empire's hull registry.
fn registry_prefix(rng: &mut impl Rng) -> String {
  (0..3).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect()
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;

  use super::*;

  #[test]
  fn small_limits_only_field_small_ships() {
    let mut rng = ChaCha8Rng::seed_from_u64(31);
    let counts = combat_counts(40, 0, 40.0, &mut rng);
    assert!(counts[1..].iter().all(|&n| n == 0));
    assert!(counts[0] <= 40);
    assert!(counts[0] > 30);
  }

  #[test]
  fn top_tier_gets_capital_ships() {
    let mut rng = ChaCha8Rng::seed_from_u64(32);
    let counts = combat_counts(400, 8, 100.0, &mut rng);
    assert_eq!(counts[CombatTier::StarEater.rank()], 1);
    assert_eq!(counts[CombatTier::Colossus.rank()], 2);
    assert_eq!(counts[CombatTier::Juggernaut.rank()], 5);
    assert_eq!(counts[CombatTier::Titan.rank()], 20);
    assert!(counts.iter().sum::<usize>() as i64 <= 400);
  }

  #[test]
  fn zero_limit_means_no_ships() {
    let mut rng = ChaCha8Rng::seed_from_u64(33);
    assert_eq!(combat_counts(0, 8, 0.0, &mut rng), [0; 9]);
  }

  #[test]
  fn registry_prefix_is_three_capitals() {
    let mut rng = ChaCha8Rng::seed_from_u64(34);
    let prefix = registry_prefix(&mut rng);
    assert_eq!(prefix.len(), 3);
    assert!(prefix.chars().all(|c| c.is_ascii_uppercase()));
  }

  #[test]
  fn experience_is_never_negative() {
    let mut rng = ChaCha8Rng::seed_from_u64(35);
    assert!((0..200).all(|_| draw_experience(CombatTier::Corvette, &mut rng) >= 0));
  }

  #[test]
  fn combat_weights_fall_by_2_75_per_tier() {
    let weights = combat_weights();
    assert_eq!(weights[CombatTier::StarEater.rank()], 1.0);
    assert!((weights[CombatTier::Corvette.rank()] - 2.75f64.powi(8)).abs() < 1e-9);
    for pair in weights.windows(2) {
      assert!((pair[0] / pair[1] - 2.75).abs() < 1e-12);
    }
  }

  #[test]
  fn experience_mean_follows_class_rarity() {
    let weights = combat_weights();
    let total: f64 = weights.iter().sum();
    for tier in CombatTier::ALL {
      let rarity = (total / weights[tier.rank()]).log(2.75);
      assert!((experience_mean(tier) - 25.0 * (1.0 + rarity)).abs() < 1e-9, "{tier:?}");
    }
    // A tier 2.75 times rarer than its neighbour adds exactly 25.
    for pair in CombatTier::ALL.windows(2) {
      let step = experience_mean(pair[1]) - experience_mean(pair[0]);
      assert!((step - 25.0).abs() < 1e-9);
    }
  }

  #[test]
  fn rarer_classes_draw_more_experience() {
    let mut rng = ChaCha8Rng::seed_from_u64(36);
    let sample_mean = |tier: CombatTier, rng: &mut ChaCha8Rng| {
      (0..20_000).map(|_| draw_experience(tier, rng) as f64).sum::<f64>() / 20_000.0
    };
    let corvette = sample_mean(CombatTier::Corvette, &mut rng);
    let battleship = sample_mean(CombatTier::Battleship, &mut rng);
    let star_eater = sample_mean(CombatTier::StarEater, &mut rng);

    assert!(corvette < battleship && battleship < star_eater);
    // The zero floor only lifts the common tiers; the rarest sits near its mean.
    assert!((star_eater - experience_mean(CombatTier::StarEater)).abs() < 10.0);
  }

  #[test]
  fn template_names_are_title_cased() {
    assert_eq!(display_name("star_eater"), "Star Eater");
    assert_eq!(display_name("corvette"), "Corvette");
    assert_eq!(display_name("Mining_STATION"), "Mining Station");
    assert_eq!(display_name("Outpost Station"), "Outpost Station");
  }
}
