//! Star systems: weighted star types, unique names and chokepoint flags.

use rand::{Rng, distributions::WeightedIndex, prelude::Distribution, seq::SliceRandom};
use starforge_core::{
  STARTING_ID,
  catalog::Catalog,
  record::{Id, StarSystem},
  settings::Settings,
  store::WorldStore,
};

use crate::{
  Error, Result,
  graph::Hyperlanes,
  stats::interpolate,
};

/// Largest network the chokepoint simulation runs on.
const MAX_SIMULATED_STARS: usize = 2000;

/// Width of the numeric suffix band given to each page of names.
const SUFFIX_BAND: usize = 50;

pub async fn create_stars<S>(
  store:    &S,
  catalog:  &Catalog,
  settings: &Settings,
  rng:      &mut impl Rng,
) -> Result<usize>
where
  S: WorldStore,
{
  tracing::info!(num_stars = settings.num_stars, "generating star systems");

  store
    .insert_star_types(catalog.star_types.clone())
    .await
    .map_err(Error::store)?;

  let types = WeightedIndex::new(catalog.star_types.iter().map(|t| t.weight_pct))?;
  let choke_probability = choke_point_probability(settings, rng);
  tracing::debug!(choke_probability, "simulated hyperlanes");

  let prefixes = prefix_pool(&catalog.words.star_prefixes, settings.num_stars, rng);

  let mut written = 0;
  for (page, start) in (0..settings.num_stars).step_by(prefixes.len()).enumerate() {
    let len = prefixes.len().min(settings.num_stars - start);
    let names = StarNames { prefixes: &prefixes[..len], first_index: start, page };
    let rows = star_page(catalog, &types, names, choke_probability, rng);

    written += store.insert_star_systems(rows).await.map_err(Error::store)?;
    tracing::debug!(page, written, "star page written");
  }

  tracing::info!(written, "star systems done");
  Ok(written)
}

/// One page of names: a prefix per star and the page's suffix band.
struct StarNames<'a> {
  prefixes:    &'a [String],
  first_index: usize,
  page:        usize,
}

fn star_page(
  catalog:           &Catalog,
  types:             &WeightedIndex<f64>,
  names:             StarNames<'_>,
  choke_probability: f64,
  rng:               &mut impl Rng,
) -> Vec<StarSystem> {
  let band = names.page * SUFFIX_BAND + 1;
  names
    .prefixes
    .iter()
    .zip(names.first_index..)
    .map(|(prefix, index)| {
      let suffix = rng.gen_range(band..band + SUFFIX_BAND - 1);
      StarSystem {
        star_system_id: STARTING_ID + index as Id,
        name:           format!("{prefix}-{suffix}"),
        star_type_id:   catalog.star_types[types.sample(rng)].star_type_id,
        is_choke_point: rng.gen_bool(choke_probability),
        empire_owner:   None,
      }
    })
    .collect()
}

/// Unique name prefixes, one per star in a page.
fn prefix_pool(words: &[String], num_stars: usize, rng: &mut impl Rng) -> Vec<String> {
  let size = (num_stars / 10).clamp(1, words.len().min(1000));
  let mut pool: Vec<String> = words.choose_multiple(rng, size).cloned().collect();
  pool.shuffle(rng);
  pool
}

/// Share of dead-end stars in a simulated hyperlane network.
fn choke_point_probability(settings: &Settings, rng: &mut impl Rng) -> f64 {
  let nodes = settings.num_stars.min(MAX_SIMULATED_STARS);
  let clusters = interpolate(
    (settings.min_stars as f64, 2.0),
    (settings.max_stars as f64, 40.0),
    settings.num_stars as f64,
  )
  .round()
  .clamp(2.0, 40.0) as usize;

  Hyperlanes::simulate(rng, nodes, clusters.min(nodes), settings.hyperlane_density)
    .dead_end_ratio()
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;

  use super::*;

  #[test]
  fn prefix_pool_is_unique_and_bounded() {
    let words: Vec<String> = (0..50).map(|i| format!("W{i}")).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let pool = prefix_pool(&words, 200, &mut rng);
    assert_eq!(pool.len(), 20);
    let mut sorted = pool.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 20);

    assert_eq!(prefix_pool(&words, 5, &mut rng).len(), 1);
    assert_eq!(prefix_pool(&words, 100_000, &mut rng).len(), 50);
  }

  fn catalog() -> Catalog {
    Catalog::load(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets"))
      .expect("bundled assets")
  }

  #[test]
  fn choke_probability_is_the_dead_end_ratio() {
    let settings = Settings { num_stars: 500, ..Default::default() };
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut replay = rng.clone();

    let p = choke_point_probability(&settings, &mut rng);
    let clusters = interpolate((100.0, 2.0), (100_000.0, 40.0), 500.0).round() as usize;
    let lanes = Hyperlanes::simulate(&mut replay, 500, clusters, settings.hyperlane_density);
    assert_eq!(p, lanes.dead_end_ratio());
  }

  #[test]
  fn choke_flags_track_the_probability() {
    let catalog = catalog();
    let types = WeightedIndex::new(catalog.star_types.iter().map(|t| t.weight_pct)).unwrap();
    let prefixes: Vec<String> = (0..4000).map(|i| format!("P{i}")).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(10);

    for p in [0.0, 0.3, 1.0] {
      let names = StarNames { prefixes: &prefixes, first_index: 0, page: 2 };
      let rows = star_page(&catalog, &types, names, p, &mut rng);
      let flagged = rows.iter().filter(|s| s.is_choke_point).count() as f64;
      assert!((flagged / rows.len() as f64 - p).abs() < 0.03, "p = {p}, flagged = {flagged}");
    }
  }

  #[test]
  fn page_suffixes_stay_in_their_band() {
    let catalog = catalog();
    let types = WeightedIndex::new(catalog.star_types.iter().map(|t| t.weight_pct)).unwrap();
    let prefixes: Vec<String> = (0..100).map(|i| format!("P{i}")).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(12);

    let names = StarNames { prefixes: &prefixes, first_index: 300, page: 3 };
    let rows = star_page(&catalog, &types, names, 0.1, &mut rng);
    assert_eq!(rows[0].star_system_id, 301);
    for star in &rows {
      let suffix: usize = star.name.rsplit('-').next().unwrap().parse().unwrap();
      assert!((151..199).contains(&suffix), "{}", star.name);
    }
  }

  #[test]
  fn choke_probability_is_a_probability() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let settings = Settings { num_stars: 300, ..Default::default() };
    let p = choke_point_probability(&settings, &mut rng);
    assert!(p > 0.0 && p < 1.0, "{p}");
  }
}
