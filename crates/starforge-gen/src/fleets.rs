//! Fleet caps from empire wealth, then the fleets themselves.

use rand::{Rng, seq::SliceRandom};
use starforge_core::{
  PAGE_SIZE, STARTING_ID,
  catalog::Catalog,
  record::{EmpireInfo, Fleet, FleetCaps, Id, Material},
  store::WorldStore,
};

use crate::{
  Error, Result,
  stats::{cut, normal},
};

/// Chance in percent that a fleet starts docked.
const DOCKED_PERCENT: u32 = 70;

pub async fn create_fleets<S>(store: &S, catalog: &Catalog, rng: &mut impl Rng) -> Result<usize>
where
  S: WorldStore,
{
  tracing::info!("generating fleets");

  let empires = store.list_empires().await.map_err(Error::store)?;
  let caps = fleet_caps(&empires);
  store.set_fleet_caps(caps.clone()).await.map_err(Error::store)?;

  let min_fleets = caps.iter().map(|c| c.total_fleets).min().unwrap_or(0);
  let words = &catalog.words;

  let mut fleets = Vec::new();
  for cap in &caps {
    let cloak_mean = 100.0 / (cap.total_fleets - min_fleets + 1) as f64;
    for _ in 0..cap.total_fleets {
      let prefix = words.fleet_prefixes.choose(rng).map_or("", String::as_str);
      let suffix = words.fleet_suffixes.choose(rng).map_or("", String::as_str);
      fleets.push(Fleet {
        fleet_id:       STARTING_ID + fleets.len() as Id,
        name:           format!("{prefix} {suffix}"),
        empire_id:      cap.empire_id,
        is_docked:      starts_docked(rng),
        cloak_strength: cloak_strength(cloak_mean, rng),
      });
    }
  }

  let mut written = 0;
  for chunk in fleets.chunks(PAGE_SIZE) {
    written += store.insert_fleets(chunk.to_vec()).await.map_err(Error::store)?;
  }

  tracing::info!(written, "fleets done");
  Ok(written)
}

fn starts_docked(rng: &mut impl Rng) -> bool {
  rng.gen_range(0..100) < DOCKED_PERCENT
}

/// `N(mean, 5)` rounded and clamped to a percentage.
fn cloak_strength(mean: f64, rng: &mut impl Rng) -> i64 {
  (normal(rng, mean, 5.0).round() as i64).clamp(0, 100)
}

/// Bucket each resource total across empires and derive the fleet caps.
pub fn fleet_caps(empires: &[EmpireInfo]) -> Vec<FleetCaps> {
  let column = |material: Material| -> Vec<f64> {
    empires.iter().map(|e| e.totals.get(material) as f64).collect()
  };

  let energy = cut(&column(Material::Energy), 5);
  let minerals = cut(&column(Material::Minerals), 12);
  let research = cut(&column(Material::Research), 3);
  let trade = cut(&column(Material::Trade), 10);
  let research_size = cut(&column(Material::Research), 6);

  empires
    .iter()
    .enumerate()
    .map(|(i, empire)| {
      let ranks = energy[i] + minerals[i] + research[i] + trade[i];
      FleetCaps {
        empire_id:      empire.empire_id,
        total_fleets:   (ranks / 2) as i64,
        max_fleet_size: (20 + research_size[i] as i64 * 20 + 10 * empire.gov_efficiency_bonus)
          / 10,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;
  use starforge_core::record::Resources;

  use super::*;

  fn empire(id: Id, wealth: i64, gov: i64) -> EmpireInfo {
    EmpireInfo {
      empire_id: id,
      gov_efficiency_bonus: gov,
      totals: Resources {
        minerals: wealth,
        energy:   wealth,
        research: wealth,
        trade:    wealth,
      },
      ..Default::default()
    }
  }

  #[test]
  fn poorest_and_richest_caps() {
    let caps = fleet_caps(&[empire(1, 0, 1), empire(2, 1000, 6)]);
    // Poorest lands in bin 1 of every cut; richest in the last one.
    assert_eq!(caps[0].total_fleets, 2);
    assert_eq!(caps[0].max_fleet_size, (20 + 20 + 10) / 10);
    assert_eq!(caps[1].total_fleets, (5 + 12 + 3 + 10) / 2);
    assert_eq!(caps[1].max_fleet_size, (20 + 120 + 60) / 10);
  }

  #[test]
  fn cloak_is_clamped_to_a_percentage() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    assert!((0..500).all(|_| cloak_strength(1000.0, &mut rng) == 100));
    assert!((0..500).all(|_| cloak_strength(-1000.0, &mut rng) == 0));
    // The smallest fleet count gets mean 100, so roughly half its draws clamp.
    let strengths: Vec<i64> = (0..1000).map(|_| cloak_strength(100.0, &mut rng)).collect();
    assert!(strengths.iter().all(|s| (0..=100).contains(s)));
    assert!(strengths.iter().any(|&s| s < 100));
  }

  #[test]
  fn about_seventy_percent_start_docked() {
    let mut rng = ChaCha8Rng::seed_from_u64(22);
    let docked = (0..10_000).filter(|_| starts_docked(&mut rng)).count();
    assert!((6700..7300).contains(&docked), "{docked}");
  }

  #[test]
  fn no_empires_no_caps() {
    assert!(fleet_caps(&[]).is_empty());
  }
}
