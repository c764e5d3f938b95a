//! Resource accumulation: government efficiency, populations, chokepoint
//! rescaling, per-empire aggregates and the empire score.

use std::collections::BTreeMap;

use rand::{Rng, seq::SliceRandom};
use starforge_core::{
  PAGE_SIZE,
  catalog::Catalog,
  record::{EmpireEconomy, Id, Planet, ShipCategory},
  settings::Settings,
  store::WorldStore,
};

use crate::{
  Error, Result,
  stats::{line_through, normal},
};

/// Pops per point of government efficiency bonus.
const POPS_PER_GOV_BONUS: f64 = 2.5;

/// Spread of the population noise.
const POPS_NOISE: f64 = 2.5;

pub async fn accumulate_resources<S>(
  store:    &S,
  catalog:  &Catalog,
  settings: &Settings,
  rng:      &mut impl Rng,
) -> Result<Vec<EmpireEconomy>>
where
  S: WorldStore,
{
  tracing::info!("accumulating resources");

  let empires = store.list_empires().await.map_err(Error::store)?;
  let ranks = authority_ranks(catalog, rng);
  let authorities = catalog.authorities.len().max(1) as f64;

  let mut gov_bonus: BTreeMap<Id, i64> = BTreeMap::new();
  let mut settled = Vec::new();
  for empire in &empires {
    let bonus = ranks.get(&empire.authority_id).copied().unwrap_or(1);
    gov_bonus.insert(empire.empire_id, bonus);

    let planets = store
      .empire_habitable_planets(empire.empire_id)
      .await
      .map_err(Error::store)?;
    settled.extend(planets.into_iter().map(|p| settle(p, bonus, bonus as f64 / authorities, rng)));
  }

  for chunk in settled.chunks(PAGE_SIZE) {
    store.update_planets(chunk.to_vec()).await.map_err(Error::store)?;
  }
  tracing::debug!(planets = settled.len(), "populated colonies");

  let rescaled = store
    .rescale_choke_point_planets(settings.choke_point_multiplier)
    .await
    .map_err(Error::store)?;
  tracing::debug!(rescaled, multiplier = settings.choke_point_multiplier, "rescaled chokepoint planets");

  let mut economy = store.empire_economy().await.map_err(Error::store)?;
  for row in &mut economy {
    row.gov_efficiency_bonus = gov_bonus.get(&row.empire_id).copied().unwrap_or(0);
  }
  store.set_empire_economy(economy.clone()).await.map_err(Error::store)?;

  score_empires(store, catalog).await?;

  tracing::info!(empires = economy.len(), colonies = settled.len(), "resources done");
  Ok(economy)
}

/// One random ranking `1..=n` of the authority catalog.
fn authority_ranks(catalog: &Catalog, rng: &mut impl Rng) -> BTreeMap<Id, i64> {
  let mut ranks: Vec<i64> = (1..=catalog.authorities.len() as i64).collect();
  ranks.shuffle(rng);
  catalog.authorities.iter().map(|a| a.authority_id).zip(ranks).collect()
}

/// Populate a colony and grow its resources with the population.
pub fn settle(mut planet: Planet, gov_bonus: i64, efficiency: f64, rng: &mut impl Rng) -> Planet {
  // Population grows linearly from 15 on the smallest world to 100 on the
  // largest.
  let (m, b) = line_through((1.0, 15.0), (30.0, 100.0));
  let pops = (planet.size as f64 * m
    + b
    + gov_bonus as f64 * POPS_PER_GOV_BONUS
    + normal(rng, 0.0, POPS_NOISE))
  .trunc()
  .max(0.0);

  let worked = pops * efficiency;
  let r = planet.resources;
  planet.resources.energy = ((r.energy + 1) as f64 * pops * 5.0 * efficiency) as i64;
  planet.resources.minerals = ((r.minerals + 1) as f64 * pops * 10.0 * efficiency) as i64;
  planet.resources.research = (r.research as f64 + worked.powf(1.5)) as i64;
  planet.resources.trade = ((r.trade + 1) as f64 + worked.powi(2)) as i64;
  planet.pops = pops as i64;
  planet
}

/// Weighted sum behind the empire score.
pub fn empire_score(economy: &EmpireEconomy, fleet_power: f64) -> i64 {
  let t = economy.totals;
  t.energy
    + t.minerals
    + 6 * t.research
    + t.trade
    + 10_000 * economy.num_systems
    + 50_000 * economy.colonies_count
    + 20_000 * economy.pops_count
    + fleet_power.trunc() as i64
}

/// Recompute every empire's score from its economy and fleet power.
pub async fn score_empires<S>(store: &S, catalog: &Catalog) -> Result<usize>
where
  S: WorldStore,
{
  let mut power: BTreeMap<Id, f64> = BTreeMap::new();
  for rank in &catalog.ranks {
    for class in catalog.ship_classes.iter().filter(|c| c.category == ShipCategory::Combat) {
      let rows = store
        .fleet_power(rank.clone(), class.ship_class_id)
        .await
        .map_err(Error::store)?;
      for (empire_id, p) in rows {
        *power.entry(empire_id).or_default() += p;
      }
    }
  }

  let scores: Vec<(Id, i64)> = store
    .empire_economy()
    .await
    .map_err(Error::store)?
    .iter()
    .map(|e| (e.empire_id, empire_score(e, power.get(&e.empire_id).copied().unwrap_or(0.0))))
    .collect();

  let written = store.set_empire_scores(scores).await.map_err(Error::store)?;
  tracing::debug!(written, "empire scores updated");
  Ok(written)
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;
  use starforge_core::record::Resources;

  use super::*;

  fn planet(size: i64) -> Planet {
    Planet {
      planet_id:      1,
      name:           "Vega-3 a".into(),
      size,
      star_system_id: 1,
      biome_id:       1,
      resources:      Resources { minerals: 4, energy: 5, research: 2, trade: 3 },
      pops:           0,
    }
  }

  #[test]
  fn larger_worlds_hold_more_pops() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let small = settle(planet(1), 3, 0.5, &mut rng);
    let large = settle(planet(30), 3, 0.5, &mut rng);
    assert!(small.pops >= 0);
    assert!(large.pops > small.pops);
    assert!(large.resources.minerals > large.resources.energy);
    assert!(large.resources.trade > 4);
  }

  #[test]
  fn score_weights() {
    let economy = EmpireEconomy {
      empire_id:            1,
      gov_efficiency_bonus: 2,
      num_systems:          2,
      totals:               Resources { minerals: 10, energy: 20, research: 5, trade: 1 },
      colonies_count:       1,
      pops_count:           3,
    };
    assert_eq!(
      empire_score(&economy, 12.9),
      20 + 10 + 30 + 1 + 20_000 + 50_000 + 60_000 + 12
    );
  }
}
