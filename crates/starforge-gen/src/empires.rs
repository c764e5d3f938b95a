//! Empires with their authority and ethics.

use rand::{Rng, seq::{SliceRandom, index}};
use starforge_core::{
  STARTING_ID,
  catalog::Catalog,
  record::{Empire, EmpireToEthic, Id},
  settings::Settings,
  store::WorldStore,
};

use crate::{Error, Result};

/// Attraction of a regular ethic.
pub const ATTRACTION: i64 = 1;

/// Attraction of a fanatic ethic.
pub const FANATIC_ATTRACTION: i64 = 2;

pub async fn create_empires<S>(
  store:    &S,
  catalog:  &Catalog,
  settings: &Settings,
  rng:      &mut impl Rng,
) -> Result<usize>
where
  S: WorldStore,
{
  store
    .insert_authorities(catalog.authorities.clone())
    .await
    .map_err(Error::store)?;
  store.insert_ethics(catalog.ethics.clone()).await.map_err(Error::store)?;

  let species = &catalog.words.empire_species;
  let count = settings.number_of_empires.min(species.len());
  if count < settings.number_of_empires {
    tracing::warn!(
      requested = settings.number_of_empires,
      available = species.len(),
      "not enough species names, creating fewer empires"
    );
  }
  tracing::info!(count, "generating empires");

  let mut empires = Vec::with_capacity(count);
  let mut ethics = Vec::new();

  for (name, empire_id) in species.choose_multiple(rng, count).zip(STARTING_ID..) {
    let suffix = catalog.words.empire_suffixes.choose(rng).map_or("Empire", String::as_str);
    let authority = &catalog.authorities[rng.gen_range(0..catalog.authorities.len())];

    empires.push(Empire {
      empire_id,
      name:         format!("{name} {suffix}"),
      authority_id: authority.authority_id,
      score:        None,
    });
    ethics.extend(pick_ethics(empire_id, catalog, rng));
  }

  let written = store.insert_empires(empires).await.map_err(Error::store)?;
  let links = store.insert_empire_ethics(ethics).await.map_err(Error::store)?;

  tracing::info!(written, ethics = links, "empires done");
  Ok(written)
}

/// Two or three distinct ethics. An empire with only two holds one of them
/// fanatically.
fn pick_ethics(empire_id: Id, catalog: &Catalog, rng: &mut impl Rng) -> Vec<EmpireToEthic> {
  let count = rng.gen_range(2..=3).min(catalog.ethics.len());
  let mut picked: Vec<EmpireToEthic> = index::sample(rng, catalog.ethics.len(), count)
    .into_iter()
    .map(|i| EmpireToEthic {
      empire_id,
      ethic_id: catalog.ethics[i].ethic_id,
      attraction: ATTRACTION,
    })
    .collect();

  if picked.len() == 2 {
    let fanatic = rng.gen_range(0..picked.len());
    picked[fanatic].attraction = FANATIC_ATTRACTION;
  }
  picked.sort_by_key(|e| e.ethic_id);
  picked
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;
  use starforge_core::catalog::{WordLists, authorities, ethics};

  use super::*;

  fn catalog() -> Catalog {
    Catalog {
      star_types:   vec![],
      biomes:       vec![],
      ship_classes: vec![],
      modules:      vec![],
      ranks:        vec![],
      authorities:  authorities(),
      ethics:       ethics(),
      words:        WordLists::default(),
    }
  }

  #[test]
  fn fanatic_only_with_two_ethics() {
    let catalog = catalog();
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut saw = [false; 2];

    for id in 1..200 {
      let picked = pick_ethics(id, &catalog, &mut rng);
      let fanatics = picked.iter().filter(|e| e.attraction == FANATIC_ATTRACTION).count();
      match picked.len() {
        2 => {
          assert_eq!(fanatics, 1);
          saw[0] = true;
        }
        3 => {
          assert_eq!(fanatics, 0);
          saw[1] = true;
        }
        n => panic!("unexpected ethic count {n}"),
      }
      let mut ids: Vec<Id> = picked.iter().map(|e| e.ethic_id).collect();
      ids.dedup();
      assert_eq!(ids.len(), picked.len());
    }
    assert_eq!(saw, [true, true]);
  }
}
