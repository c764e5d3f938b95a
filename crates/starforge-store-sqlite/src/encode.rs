//! Encoding and decoding helpers between starforge record types and the
//! column representations stored in SQLite.
//!
//! Dates are stored as RFC 3339 strings, biome materials as a compact JSON
//! array, and enums as their lowercase names. Booleans use rusqlite's native
//! 0/1 integer mapping.

use chrono::{DateTime, Utc};
use starforge_core::record::{
  Biome, BiomeGenType, Crew, Material, ShipCategory, ShipClass, SlotCounts,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Materials ───────────────────────────────────────────────────────────────

pub fn encode_materials(materials: &[Material]) -> Result<String> {
  Ok(serde_json::to_string(materials)?)
}

pub fn decode_materials(s: &str) -> Result<Vec<Material>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_gen_type(s: &str) -> Result<BiomeGenType> {
  match s {
    "normal" => Ok(BiomeGenType::Normal),
    "special" => Ok(BiomeGenType::Special),
    "megastructure" => Ok(BiomeGenType::Megastructure),
    other => Err(Error::UnknownVariant { kind: "biome gen type", value: other.into() }),
  }
}

pub fn decode_category(s: &str) -> Result<ShipCategory> {
  match s {
    "combat" => Ok(ShipCategory::Combat),
    "stationary" => Ok(ShipCategory::Stationary),
    "civilian" => Ok(ShipCategory::Civilian),
    other => Err(Error::UnknownVariant { kind: "ship category", value: other.into() }),
  }
}

// ─── Slot columns ────────────────────────────────────────────────────────────

/// Column list shared by `ship_class` and `spaceship_module`.
pub const SLOT_COLUMNS: &str =
  "small, medium, large, xlarge, titan, juggernaut, colossus, star_eater";

pub fn slot_values(slots: &SlotCounts) -> [u32; 8] {
  [
    slots.small,
    slots.medium,
    slots.large,
    slots.xlarge,
    slots.titan,
    slots.juggernaut,
    slots.colossus,
    slots.star_eater,
  ]
}

/// Read eight consecutive slot columns starting at `first`.
pub fn read_slots(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<SlotCounts> {
  Ok(SlotCounts {
    small:      row.get(first)?,
    medium:     row.get(first + 1)?,
    large:      row.get(first + 2)?,
    xlarge:     row.get(first + 3)?,
    titan:      row.get(first + 4)?,
    juggernaut: row.get(first + 5)?,
    colossus:   row.get(first + 6)?,
    star_eater: row.get(first + 7)?,
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// A `biome` row with its text columns still encoded.
pub struct RawBiome {
  pub biome_id:         i64,
  pub name:             String,
  pub is_habitable:     bool,
  pub min_size:         i64,
  pub max_size:         i64,
  pub gen_type:         String,
  pub materials:        String,
  pub special_gen_mean: f64,
}

impl RawBiome {
  pub fn into_biome(self) -> Result<Biome> {
    Ok(Biome {
      biome_id:         self.biome_id,
      name:             self.name,
      is_habitable:     self.is_habitable,
      min_size:         self.min_size,
      max_size:         self.max_size,
      gen_type:         decode_gen_type(&self.gen_type)?,
      materials:        decode_materials(&self.materials)?,
      special_gen_mean: self.special_gen_mean,
    })
  }
}

/// A `ship_class` row with its category still encoded.
pub struct RawShipClass {
  pub ship_class_id:  i64,
  pub name:           String,
  pub category:       String,
  pub slots:          SlotCounts,
  pub command_points: i64,
  pub crew_count:     i64,
  pub bonus:          Option<f64>,
}

impl RawShipClass {
  pub fn into_ship_class(self) -> Result<ShipClass> {
    Ok(ShipClass {
      ship_class_id:  self.ship_class_id,
      name:           self.name,
      category:       decode_category(&self.category)?,
      slots:          self.slots,
      command_points: self.command_points,
      crew_count:     self.crew_count,
      bonus:          self.bonus,
    })
  }
}

/// A `crew` row with its dates still encoded.
pub struct RawCrew {
  pub crew_id:            i64,
  pub name:               String,
  pub spaceship_id:       i64,
  pub command_points:     i64,
  pub reports_to:         Option<i64>,
  pub birth_date:         String,
  pub hire_date:          String,
  pub planet_of_birth_id: i64,
}

impl RawCrew {
  pub fn into_crew(self) -> Result<Crew> {
    Ok(Crew {
      crew_id:            self.crew_id,
      name:               self.name,
      spaceship_id:       self.spaceship_id,
      command_points:     self.command_points,
      reports_to:         self.reports_to,
      birth_date:         decode_dt(&self.birth_date)?,
      hire_date:          decode_dt(&self.hire_date)?,
      planet_of_birth_id: self.planet_of_birth_id,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn materials_round_trip_as_json() {
    let encoded = encode_materials(&[Material::Minerals, Material::Trade]).unwrap();
    assert_eq!(encoded, r#"["minerals","trade"]"#);
    assert_eq!(decode_materials(&encoded).unwrap(), [Material::Minerals, Material::Trade]);
  }

  #[test]
  fn unknown_category_is_rejected() {
    assert!(matches!(
      decode_category("pirate"),
      Err(Error::UnknownVariant { kind: "ship category", .. })
    ));
  }

  #[test]
  fn bad_date_is_a_parse_error() {
    assert!(matches!(decode_dt("2200-13-01"), Err(Error::DateParse(_))));
  }
}
