//! Crew: members for every ship, their chain of command and friendships.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rand::{Rng, seq::SliceRandom};
use starforge_core::{
  PAGE_SIZE, STARTING_ID,
  catalog::Catalog,
  record::{Crew, CrewFriend, EmpireInfo, Id, ReportsTo},
  store::WorldStore,
  validate,
};

use crate::{
  Error, Result,
  graph::{BalancedTree, dgm_graph, friendship_generation},
};

/// 2200-01-01T00:00:00Z, the earliest birth date.
pub const ERA_START: i64 = 7_258_118_400;

/// 2300-01-01T00:00:00Z, the present day of the generated galaxy.
pub const ERA_END: i64 = 10_413_792_000;

/// Counts produced by [`create_crew`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrewSummary {
  pub crew:       usize,
  pub reports_to: usize,
  pub friends:    usize,
}

pub async fn create_crew<S>(store: &S, catalog: &Catalog, rng: &mut impl Rng) -> Result<CrewSummary>
where
  S: WorldStore,
{
  tracing::info!("generating crew");

  let habitable = store.habitable_planet_ids().await.map_err(Error::store)?;
  let empires = store.list_empires().await.map_err(Error::store)?;

  let mut summary = CrewSummary::default();
  let mut next_id = STARTING_ID;

  for empire in &empires {
    let branching = rng.gen_range(2..=10);

    let pool = birth_planets(store, empire, &habitable, rng).await?;
    if pool.is_empty() {
      tracing::warn!(empire_id = empire.empire_id, "no habitable planet to be born on, skipping crew");
      continue;
    }

    let mut rows = Vec::new();
    for class in &catalog.ship_classes {
      let ships = store
        .empire_ships_of_class(empire.empire_id, class.ship_class_id)
        .await
        .map_err(Error::store)?;
      for ship_id in ships {
        for _ in 0..class.crew_count {
          rows.push(crew_member(next_id, ship_id, &pool, catalog, rng));
          next_id += 1;
        }
      }
    }
    for chunk in rows.chunks(PAGE_SIZE) {
      summary.crew += store.insert_crew(chunk.to_vec()).await.map_err(Error::store)?;
    }

    let crew = store.empire_crew(empire.empire_id).await.map_err(Error::store)?;

    let edges = chain_of_command(&crew, branching, rng);
    validate::crew_hierarchy(&edges)?;
    for chunk in edges.chunks(PAGE_SIZE) {
      summary.reports_to += store.set_reports_to(chunk.to_vec()).await.map_err(Error::store)?;
    }

    let friends = friendships(&crew, rng);
    for chunk in friends.chunks(PAGE_SIZE) {
      summary.friends += store.insert_crew_friends(chunk.to_vec()).await.map_err(Error::store)?;
    }

    tracing::debug!(
      empire_id = empire.empire_id,
      crew = crew.len(),
      branching,
      friends = friends.len(),
      "empire crew written"
    );
  }

  tracing::info!(?summary, "crew done");
  Ok(summary)
}

/// The empire's own habitable planets plus a share of foreign ones that
/// grows with its expansion score.
async fn birth_planets<S>(
  store:     &S,
  empire:    &EmpireInfo,
  habitable: &[Id],
  rng:       &mut impl Rng,
) -> Result<Vec<Id>>
where
  S: WorldStore,
{
  let mut pool: Vec<Id> = store
    .empire_habitable_planets(empire.empire_id)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|p| p.planet_id)
    .collect();

  let own: BTreeSet<Id> = pool.iter().copied().collect();
  let foreign: Vec<Id> = habitable.iter().copied().filter(|id| !own.contains(id)).collect();
  let migrants = (pool.len() as f64 * empire.expansion_score as f64 / 100.0).trunc().max(0.0);
  pool.extend(foreign.choose_multiple(rng, (migrants as usize).min(foreign.len())));

  if pool.is_empty() {
    tracing::warn!(empire_id = empire.empire_id, "empire has no habitable planet, drawing births galaxy-wide");
    pool = habitable.to_vec();
  }
  Ok(pool)
}

fn crew_member(
  crew_id: Id,
  ship_id: Id,
  pool:    &[Id],
  catalog: &Catalog,
  rng:     &mut impl Rng,
) -> Crew {
  let words = &catalog.words;
  let given = words.crew_given_names.choose(rng).map_or("", String::as_str);
  let family = words.crew_family_names.choose(rng).map_or("", String::as_str);

  let born = rng.gen_range(ERA_START..ERA_END);
  let hired = rng.gen_range(born..ERA_END);
  let hire_date = timestamp(hired);

  Crew {
    crew_id,
    name: format!("{given} {family}"),
    spaceship_id: ship_id,
    command_points: whole_years(hire_date, timestamp(ERA_END)),
    reports_to: None,
    birth_date: timestamp(born),
    hire_date,
    planet_of_birth_id: pool[rng.gen_range(0..pool.len())],
  }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
  Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Completed years from `from` to `to`.
pub fn whole_years(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
  let mut years = i64::from(to.year() - from.year());
  if (to.month(), to.day(), to.time()) < (from.month(), from.day(), from.time()) {
    years -= 1;
  }
  years.max(0)
}

/// Arrange the crew on a balanced tree in a random order. Every crew member
/// but the root reports to its tree parent.
pub fn chain_of_command(crew: &[Id], branching: usize, rng: &mut impl Rng) -> Vec<ReportsTo> {
  let mut order = crew.to_vec();
  order.shuffle(rng);

  let tree = BalancedTree::for_nodes(order.len(), branching);
  (1..order.len())
    .filter_map(|node| {
      tree.parent(node).map(|parent| ReportsTo {
        crew_id:    order[node],
        reports_to: order[parent],
      })
    })
    .collect()
}

/// Lay the crew over a DGM graph in a fresh random order. Both directions of
/// every mapped edge are returned.
pub fn friendships(crew: &[Id], rng: &mut impl Rng) -> Vec<CrewFriend> {
  if crew.len() < 2 {
    return Vec::new();
  }

  let mut order = crew.to_vec();
  order.shuffle(rng);

  let graph = dgm_graph(friendship_generation(order.len()));
  graph
    .iter()
    .enumerate()
    .take(order.len())
    .flat_map(|(node, neighbours)| {
      let order = &order;
      neighbours
        .iter()
        .filter(|&&friend| friend < order.len())
        .map(move |&friend| CrewFriend { crew_id: order[node], friend_id: order[friend] })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;
  use starforge_core::validate::hierarchy_is_forest;

  use super::*;

  #[test]
  fn era_bounds_are_new_years_day() {
    assert_eq!(timestamp(ERA_START).to_rfc3339(), "2200-01-01T00:00:00+00:00");
    assert_eq!(timestamp(ERA_END).to_rfc3339(), "2300-01-01T00:00:00+00:00");
  }

  #[test]
  fn whole_years_counts_completed_anniversaries() {
    let at = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single().unwrap();
    assert_eq!(whole_years(at(2250, 6, 1), at(2300, 6, 1)), 50);
    assert_eq!(whole_years(at(2250, 6, 2), at(2300, 6, 1)), 49);
    assert_eq!(whole_years(at(2299, 12, 31), at(2300, 1, 1)), 0);
  }

  #[test]
  fn chain_of_command_is_a_single_tree() {
    let mut rng = ChaCha8Rng::seed_from_u64(40);
    let crew: Vec<Id> = (100..150).collect();
    let edges = chain_of_command(&crew, 4, &mut rng);

    assert_eq!(edges.len(), crew.len() - 1);
    assert!(hierarchy_is_forest(&edges));
    let subordinates: BTreeSet<Id> = edges.iter().map(|e| e.crew_id).collect();
    let roots: Vec<&Id> = crew.iter().filter(|id| !subordinates.contains(id)).collect();
    assert_eq!(roots.len(), 1);
  }

  #[test]
  fn friendships_are_symmetric_and_within_crew() {
    let mut rng = ChaCha8Rng::seed_from_u64(41);
    let crew: Vec<Id> = (1..=20).collect();
    let friends = friendships(&crew, &mut rng);

    assert!(!friends.is_empty());
    let pairs: BTreeSet<(Id, Id)> = friends.iter().map(|f| (f.crew_id, f.friend_id)).collect();
    assert_eq!(pairs.len(), friends.len());
    for &(a, b) in &pairs {
      assert_ne!(a, b);
      assert!(pairs.contains(&(b, a)));
      assert!(crew.contains(&a) && crew.contains(&b));
    }
  }

  #[test]
  fn lone_crew_has_no_friends_or_manager() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    assert!(friendships(&[7], &mut rng).is_empty());
    assert!(chain_of_command(&[7], 3, &mut rng).is_empty());
  }
}
