//! Pure invariant checks run by the write path before rows reach the sink.
//!
//! The SQL backends may enforce some of these with constraints or triggers as
//! well, but the generator never relies on that.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
  Error, Result,
  record::{
    Biome, Id, Planet, ReportsTo, ShipClass, ShipTemplateModule, SlotCounts,
    SlotSize, SpaceshipModule,
  },
};

/// The single slot size a module occupies.
///
/// Exactly one slot column must be 1 and every other column 0.
pub fn module_size(module: &SpaceshipModule) -> Result<SlotSize> {
  let mut sizes = module.slots.nonzero();
  match (sizes.next(), sizes.next()) {
    (Some((size, 1)), None) => Ok(size),
    _ => Err(Error::InvalidModuleSlots(module.name.clone())),
  }
}

/// Check a template's loadout against its class capacity, size by size.
pub fn template_slots(
  template_id: Id,
  class:       &ShipClass,
  loadout:     &[ShipTemplateModule],
  modules:     &[SpaceshipModule],
) -> Result<()> {
  let mut used = SlotCounts::default();

  for entry in loadout.iter().filter(|e| e.template_id == template_id) {
    let module = modules
      .iter()
      .find(|m| m.module_id == entry.module_id)
      .ok_or_else(|| Error::InvalidModuleSlots(format!("#{}", entry.module_id)))?;
    *used.get_mut(module_size(module)?) += entry.count;
  }

  for size in SlotSize::ALL {
    let capacity = class.slots.get(size);
    if used.get(size) > capacity {
      return Err(Error::SlotCapacityExceeded {
        template_id,
        size: size.as_str(),
        used: used.get(size),
        capacity,
      });
    }
  }
  Ok(())
}

/// Whether a planet's size lies inside its biome's range.
pub fn planet_fits_biome(planet: &Planet, biome: &Biome) -> bool {
  planet.biome_id == biome.biome_id && biome.accepts_size(planet.size)
}

/// Check every planet against the size range of the biome it names.
pub fn planet_biomes(planets: &[Planet], biomes: &[Biome]) -> Result<()> {
  for planet in planets {
    let fits = biomes
      .iter()
      .find(|b| b.biome_id == planet.biome_id)
      .is_some_and(|biome| planet_fits_biome(planet, biome));
    if !fits {
      return Err(Error::PlanetOutsideBiome {
        planet_id: planet.planet_id,
        size:      planet.size,
        biome_id:  planet.biome_id,
      });
    }
  }
  Ok(())
}

/// [`hierarchy_is_forest`] as a write-path check.
pub fn crew_hierarchy(edges: &[ReportsTo]) -> Result<()> {
  if hierarchy_is_forest(edges) { Ok(()) } else { Err(Error::CrewHierarchy) }
}

/// Whether the `reports_to` edges form a forest: every crew member has at
/// most one manager and following managers never loops.
pub fn hierarchy_is_forest(edges: &[ReportsTo]) -> bool {
  let mut parent = BTreeMap::new();
  for edge in edges {
    if edge.crew_id == edge.reports_to
      || parent.insert(edge.crew_id, edge.reports_to).is_some()
    {
      return false;
    }
  }

  for &start in parent.keys() {
    let mut seen = BTreeSet::from([start]);
    let mut node = start;
    while let Some(&next) = parent.get(&node) {
      if !seen.insert(next) {
        return false;
      }
      node = next;
    }
  }
  true
}
