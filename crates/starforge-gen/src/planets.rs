//! Planets: sizes, biomes, base resources and the special-biome overlay.

use std::collections::BTreeMap;

use rand::{Rng, seq::SliceRandom};
use starforge_core::{
  MAX_PLANET_SIZE, MIN_PLANET_SIZE, PAGE_SIZE, STARTING_ID,
  catalog::Catalog,
  record::{Biome, BiomeGenType, Id, Material, Planet, Resources, StarSystem, StarType},
  settings::Settings,
  store::WorldStore,
  validate,
};

use crate::{
  Error, Result,
  stats::{interpolate, min_max_rescale, normal},
};

/// `(mean, sd)` of the base yield of each material.
fn yield_distribution(material: Material) -> (f64, f64) {
  match material {
    Material::Minerals | Material::Energy => (6.0, 2.0),
    Material::Research | Material::Trade => (3.0, 1.5),
  }
}

pub async fn create_planets<S>(
  store:    &S,
  catalog:  &Catalog,
  settings: &Settings,
  rng:      &mut impl Rng,
) -> Result<usize>
where
  S: WorldStore,
{
  tracing::info!("generating planets");

  store
    .insert_biomes(catalog.biomes.clone())
    .await
    .map_err(Error::store)?;

  let mut planets = Vec::new();

  for star_type in &catalog.star_types {
    let mut offset = 0;
    loop {
      let stars = store
        .star_systems_of_type(star_type.star_type_id, PAGE_SIZE, offset)
        .await
        .map_err(Error::store)?;
      if stars.is_empty() {
        break;
      }
      offset += stars.len();

      let first_id = STARTING_ID + planets.len() as Id;
      let page = planets_for_page(catalog, settings, star_type, &stars, first_id, rng)?;
      validate::planet_biomes(&page, &catalog.biomes)?;
      let written = store.insert_planets(page.clone()).await.map_err(Error::store)?;
      tracing::debug!(star_type = %star_type.name, stars = stars.len(), written, "planet page written");
      planets.extend(page);

      if stars.len() < PAGE_SIZE {
        break;
      }
    }
  }

  let overlaid = overlay_special_biomes(catalog, settings, &planets, rng);
  let updated = overlaid.len();
  validate::planet_biomes(&overlaid, &catalog.biomes)?;
  for chunk in overlaid.chunks(PAGE_SIZE) {
    store.update_planets(chunk.to_vec()).await.map_err(Error::store)?;
  }

  tracing::info!(planets = planets.len(), special = updated, "planets done");
  Ok(planets.len())
}

fn planets_for_page(
  catalog:   &Catalog,
  settings:  &Settings,
  star_type: &StarType,
  stars:     &[StarSystem],
  first_id:  Id,
  rng:       &mut impl Rng,
) -> Result<Vec<Planet>> {
  let count = (stars.len() as f64 * star_type.mean_celestial_bodies).round() as usize;
  let sizes = planet_sizes(count, star_type.habitability, settings.habitable_worlds, rng);

  let mut per_star: BTreeMap<Id, usize> = BTreeMap::new();
  let mut rows = Vec::with_capacity(count);

  for (size, planet_id) in sizes.into_iter().zip(first_id..) {
    let star = &stars[rng.gen_range(0..stars.len())];
    let biome = pick_normal_biome(catalog, size, rng)?;

    let index = per_star.entry(star.star_system_id).or_default();
    let name = format!("{} {}", star.name, planet_letter(*index));
    *index += 1;

    rows.push(Planet {
      planet_id,
      name,
      size,
      star_system_id: star.star_system_id,
      biome_id: biome.biome_id,
      resources: base_resources(biome, rng),
      pops: 0,
    });
  }
  Ok(rows)
}

/// Draw rocky and gas-giant samples, rescale them onto the planet size range
/// and shuffle.
pub fn planet_sizes(
  count:            usize,
  habitability:     f64,
  habitable_worlds: f64,
  rng:              &mut impl Rng,
) -> Vec<i64> {
  if count == 0 {
    return Vec::new();
  }

  let gas_ratio = ((1.0 - habitability) * rng.gen_range(0.25..0.75) / habitable_worlds)
    .clamp(0.05, 0.95);
  let gas = (count as f64 * gas_ratio).round() as usize;
  let separation = rng.gen_range(3.0..6.0);

  let samples: Vec<f64> = (0..count)
    .map(|i| if i < count - gas { normal(rng, 0.0, 1.0) } else { normal(rng, separation, 1.0) })
    .collect();

  let mut sizes: Vec<i64> =
    min_max_rescale(&samples, MIN_PLANET_SIZE as f64, MAX_PLANET_SIZE as f64)
      .into_iter()
      .map(|s| (s.round() as i64).clamp(MIN_PLANET_SIZE, MAX_PLANET_SIZE))
      .collect();
  sizes.shuffle(rng);
  sizes
}

fn pick_normal_biome<'c>(catalog: &'c Catalog, size: i64, rng: &mut impl Rng) -> Result<&'c Biome> {
  let candidates: Vec<&Biome> = catalog
    .biomes
    .iter()
    .filter(|b| b.gen_type == BiomeGenType::Normal && b.accepts_size(size))
    .collect();
  candidates
    .choose(rng)
    .copied()
    .ok_or(Error::Core(starforge_core::Error::NoBiomeForSize(size)))
}

fn base_resources(biome: &Biome, rng: &mut impl Rng) -> Resources {
  let mut resources = Resources::default();
  for material in Material::ALL {
    let (mean, sd) = yield_distribution(material);
    let value = normal(rng, mean, sd).round().max(0.0) as i64;
    if biome.has_material(material) {
      resources.set(material, value);
    }
  }
  resources
}

/// `a`, `b`, … `z`, `aa`, `ab`, …
pub fn planet_letter(mut index: usize) -> String {
  let mut letters = Vec::new();
  loop {
    letters.push(b'a' + (index % 26) as u8);
    if index < 26 {
      break;
    }
    index = index / 26 - 1;
  }
  letters.reverse();
  String::from_utf8_lossy(&letters).into_owned()
}

/// Reassign a few planets to special and megastructure biomes.
///
/// Planets are drawn from one shuffled pool, so no planet is picked twice.
fn overlay_special_biomes(
  catalog:  &Catalog,
  settings: &Settings,
  planets:  &[Planet],
  rng:      &mut impl Rng,
) -> Vec<Planet> {
  let multiplier = interpolate(
    (settings.min_stars as f64, 1.0),
    (settings.max_stars as f64, 25.0),
    settings.num_stars as f64,
  );

  let mut pool: Vec<usize> = (0..planets.len()).collect();
  pool.shuffle(rng);
  let mut pool = pool.into_iter();

  let mut updated = Vec::new();
  for biome in catalog.biomes.iter().filter(|b| b.gen_type != BiomeGenType::Normal) {
    let wanted = (biome.special_gen_mean * multiplier).round().max(0.0) as usize;
    for placed in 0..wanted {
      let Some(index) = pool.next() else {
        tracing::warn!(biome = %biome.name, placed, wanted, "ran out of planets for special biomes");
        return updated;
      };

      let size = rng.gen_range(biome.min_size..=biome.max_size);
      let mut resources = Resources::default();
      for material in biome.materials.iter().copied() {
        let (mean, sd) = yield_distribution(material);
        let value = normal(rng, mean, sd).abs() * 5.0 * size as f64 / 10.0;
        resources.set(material, value as i64);
      }

      updated.push(Planet {
        size,
        biome_id: biome.biome_id,
        resources,
        ..planets[index].clone()
      });
    }
  }
  updated
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use rand::SeedableRng;
  use rand_chacha::ChaCha8Rng;

  use super::*;

  fn catalog() -> Catalog {
    Catalog::load(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets"))
      .expect("bundled assets")
  }

  fn plain_planets(count: usize) -> Vec<Planet> {
    (STARTING_ID..)
      .take(count)
      .map(|planet_id| Planet {
        planet_id,
        name: format!("Vega-7 {}", planet_letter(planet_id as usize)),
        size: 10,
        star_system_id: 1,
        biome_id: 1,
        resources: Resources::default(),
        pops: 0,
      })
      .collect()
  }

  fn wanted_special(catalog: &Catalog, settings: &Settings) -> usize {
    let multiplier = interpolate(
      (settings.min_stars as f64, 1.0),
      (settings.max_stars as f64, 25.0),
      settings.num_stars as f64,
    );
    catalog
      .biomes
      .iter()
      .filter(|b| b.gen_type != BiomeGenType::Normal)
      .map(|b| (b.special_gen_mean * multiplier).round() as usize)
      .sum()
  }

  #[test]
  fn letters_continue_past_z() {
    assert_eq!(planet_letter(0), "a");
    assert_eq!(planet_letter(25), "z");
    assert_eq!(planet_letter(26), "aa");
    assert_eq!(planet_letter(27), "ab");
    assert_eq!(planet_letter(52), "ba");
  }

  #[test]
  fn sizes_stay_in_range() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let sizes = planet_sizes(500, 0.6, 1.0, &mut rng);
    assert_eq!(sizes.len(), 500);
    assert!(sizes.iter().all(|s| (MIN_PLANET_SIZE..=MAX_PLANET_SIZE).contains(s)));
    assert!(sizes.contains(&MIN_PLANET_SIZE));
    assert!(sizes.contains(&MAX_PLANET_SIZE));
  }

  #[test]
  fn single_planet_gets_midpoint_size() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    // 15.5 rounds away from zero.
    assert_eq!(planet_sizes(1, 0.5, 1.0, &mut rng), [16]);
    assert!(planet_sizes(0, 0.5, 1.0, &mut rng).is_empty());
  }

  #[test]
  fn overlay_places_each_special_planet_once() {
    let catalog = catalog();
    let settings = Settings { num_stars: 100_000, ..Default::default() };
    let planets = plain_planets(2000);
    let mut rng = ChaCha8Rng::seed_from_u64(14);

    let overlaid = overlay_special_biomes(&catalog, &settings, &planets, &mut rng);
    assert!(wanted_special(&catalog, &settings) > 0);
    assert_eq!(overlaid.len(), wanted_special(&catalog, &settings));

    let ids: BTreeSet<Id> = overlaid.iter().map(|p| p.planet_id).collect();
    assert_eq!(ids.len(), overlaid.len());
    for planet in &overlaid {
      let biome = catalog.biome(planet.biome_id).unwrap();
      assert_ne!(biome.gen_type, BiomeGenType::Normal);
      assert!(biome.accepts_size(planet.size), "{planet:?}");
    }
    validate::planet_biomes(&overlaid, &catalog.biomes).unwrap();
  }

  #[test]
  fn overlay_stops_when_planets_run_out() {
    let catalog = catalog();
    let settings = Settings { num_stars: 100_000, ..Default::default() };
    let planets = plain_planets(5);
    let mut rng = ChaCha8Rng::seed_from_u64(15);

    let overlaid = overlay_special_biomes(&catalog, &settings, &planets, &mut rng);
    let ids: BTreeSet<Id> = overlaid.iter().map(|p| p.planet_id).collect();
    assert_eq!(overlaid.len(), 5);
    assert_eq!(ids.len(), 5);
  }

  #[test]
  fn uncovered_size_is_a_data_error() {
    let mut catalog = catalog();
    catalog
      .biomes
      .retain(|b| b.gen_type != BiomeGenType::Normal || b.max_size < 20);
    let mut rng = ChaCha8Rng::seed_from_u64(16);

    assert!(pick_normal_biome(&catalog, 5, &mut rng).is_ok());
    assert!(matches!(
      pick_normal_biome(&catalog, 25, &mut rng),
      Err(Error::Core(starforge_core::Error::NoBiomeForSize(25)))
    ));
  }

  #[test]
  fn missing_materials_yield_nothing() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let biome = Biome {
      biome_id:         1,
      name:             "Barren".into(),
      is_habitable:     false,
      min_size:         1,
      max_size:         30,
      gen_type:         BiomeGenType::Normal,
      materials:        vec![Material::Minerals],
      special_gen_mean: 0.0,
    };
    for _ in 0..50 {
      let r = base_resources(&biome, &mut rng);
      assert!(r.minerals >= 0);
      assert_eq!((r.energy, r.research, r.trade), (0, 0, 0));
    }
  }
}
