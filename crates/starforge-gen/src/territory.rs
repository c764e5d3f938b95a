//! Territory: home systems, expansion scores and expansion quotas.

use rand::{Rng, seq::{SliceRandom, index}};
use starforge_core::{
  PAGE_SIZE,
  catalog::Catalog,
  record::{EmpireInfo, Id},
  settings::Settings,
  store::WorldStore,
};

use crate::{Error, Result, stats::normal};

/// Share of the galaxy handed out through expansion quotas.
const EXPANSION_SHARE: f64 = 0.7;

/// Spread of the quota noise, relative to the galaxy size.
const QUOTA_NOISE: f64 = 0.3;

/// Counts produced by [`assign_territory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Territory {
  pub home_systems:     usize,
  pub removed_empires:  usize,
  pub expanded_systems: usize,
}

pub async fn assign_territory<S>(
  store:    &S,
  catalog:  &Catalog,
  settings: &Settings,
  rng:      &mut impl Rng,
) -> Result<Territory>
where
  S: WorldStore,
{
  tracing::info!("assigning territory");

  let home_systems = assign_home_systems(store, rng).await?;

  let removed_empires = store.remove_empires_without_systems().await.map_err(Error::store)?;
  if removed_empires > 0 {
    tracing::info!(removed_empires, "removed empires without a home system");
  }

  let empires = store.list_empires().await.map_err(Error::store)?;
  let scores = expansion_scores(&empires, catalog, rng);
  store.set_expansion_scores(scores.clone()).await.map_err(Error::store)?;

  let mut unowned = store.unowned_star_systems().await.map_err(Error::store)?;
  let quotas = expansion_quotas(&scores, settings.num_stars, unowned.len(), rng);

  unowned.shuffle(rng);
  let mut owners = Vec::new();
  let mut systems = unowned.into_iter();
  for (&(empire_id, _), &quota) in scores.iter().zip(&quotas) {
    owners.extend(systems.by_ref().take(quota).map(|system| (system, empire_id)));
  }

  let expanded_systems = owners.len();
  for chunk in owners.chunks(PAGE_SIZE) {
    store.set_star_owners(chunk.to_vec()).await.map_err(Error::store)?;
  }

  let territory = Territory { home_systems, removed_empires, expanded_systems };
  tracing::info!(?territory, "territory done");
  Ok(territory)
}

/// Give each empire one habitable home system, page by page.
async fn assign_home_systems<S>(store: &S, rng: &mut impl Rng) -> Result<usize>
where
  S: WorldStore,
{
  let mut empire_ids: Vec<Id> = store
    .list_empires()
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|e| e.empire_id)
    .collect();
  empire_ids.shuffle(rng);

  let mut assigned = 0;
  for (page, empires) in empire_ids.chunks(PAGE_SIZE).enumerate() {
    let systems = store
      .habitable_star_systems(PAGE_SIZE, page * PAGE_SIZE)
      .await
      .map_err(Error::store)?;
    if systems.is_empty() {
      tracing::warn!(
        unassigned = empire_ids.len() - assigned,
        "habitable systems exhausted before every empire had a home"
      );
      break;
    }

    let take = empires.len().min(systems.len());
    let owners: Vec<(Id, Id)> = index::sample(rng, systems.len(), take)
      .into_iter()
      .zip(empires)
      .map(|(i, &empire_id)| (systems[i], empire_id))
      .collect();

    assigned += store.set_star_owners(owners).await.map_err(Error::store)?;
    tracing::debug!(page, assigned, "home systems assigned");
  }
  Ok(assigned)
}

/// Score each empire by its ethics under one random ranking of the ethic
/// catalog. Returned in empire-id order.
pub fn expansion_scores(
  empires: &[EmpireInfo],
  catalog: &Catalog,
  rng:     &mut impl Rng,
) -> Vec<(Id, i64)> {
  let mut ranks: Vec<i64> = (1..=catalog.ethics.len() as i64).collect();
  ranks.shuffle(rng);

  let rank_of = |ethic_id: Id| {
    catalog
      .ethics
      .iter()
      .position(|e| e.ethic_id == ethic_id)
      .map_or(0, |i| ranks[i])
  };

  empires
    .iter()
    .map(|empire| {
      let score = empire
        .ethics
        .iter()
        .map(|&(ethic_id, attraction)| rank_of(ethic_id) * attraction)
        .sum();
      (empire.empire_id, score)
    })
    .collect()
}

/// Number of extra systems each empire expands into, shrunk until the total
/// fits the unowned supply.
pub fn expansion_quotas(
  scores:    &[(Id, i64)],
  num_stars: usize,
  supply:    usize,
  rng:       &mut impl Rng,
) -> Vec<usize> {
  if scores.is_empty() {
    return Vec::new();
  }

  let n = scores.len() as f64;
  let total: i64 = scores.iter().map(|(_, s)| s).sum();
  let stars = num_stars as f64;
  let sd = QUOTA_NOISE * stars / (2.0 * n);

  let mut quotas: Vec<i64> = scores
    .iter()
    .map(|&(_, score)| {
      let share = if total > 0 { score as f64 / total as f64 } else { 1.0 / n };
      let quota = (share * EXPANSION_SHARE * stars + normal(rng, 0.0, sd)).trunc() as i64 - 1;
      quota.max(0)
    })
    .collect();

  let supply = supply as i64;
  loop {
    let demand: i64 = quotas.iter().sum();
    if demand <= supply {
      break;
    }
    let cut = ((demand - supply) as f64 * 2.0 / n).ceil() as i64;
    tracing::warn!(demand, supply, cut, "expansion quotas exceed unowned systems");
    for quota in &mut quotas {
      *quota = (*quota - cut).max(0);
    }
  }

  quotas.into_iter().map(|q| q as usize).collect()
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;
  use starforge_core::catalog::{WordLists, authorities, ethics};

  use super::*;

  #[test]
  fn quotas_fit_supply() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let scores: Vec<(Id, i64)> = (1..=20).map(|id| (id, id * 3)).collect();

    let quotas = expansion_quotas(&scores, 1000, 150, &mut rng);
    assert_eq!(quotas.len(), 20);
    assert!(quotas.iter().sum::<usize>() <= 150);

    let roomy = expansion_quotas(&scores, 1000, 10_000, &mut rng);
    assert!(roomy.iter().sum::<usize>() > 150);
  }

  #[test]
  fn zero_supply_means_zero_quotas() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let quotas = expansion_quotas(&[(1, 5), (2, 0)], 500, 0, &mut rng);
    assert_eq!(quotas, [0, 0]);
    assert!(expansion_quotas(&[], 500, 10, &mut rng).is_empty());
  }

  #[test]
  fn scores_weigh_fanatic_ethics_double() {
    let catalog = Catalog {
      star_types:   vec![],
      biomes:       vec![],
      ship_classes: vec![],
      modules:      vec![],
      ranks:        vec![],
      authorities:  authorities(),
      ethics:       ethics(),
      words:        WordLists::default(),
    };
    let regular = EmpireInfo { empire_id: 1, ethics: vec![(3, 1)], ..Default::default() };
    let fanatic = EmpireInfo { empire_id: 2, ethics: vec![(3, 2)], ..Default::default() };

    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let scores = expansion_scores(&[regular, fanatic], &catalog, &mut rng);
    assert_eq!(scores[1].1, 2 * scores[0].1);
    assert!((1..=8).contains(&scores[0].1));
  }
}
