//! Resolved generator settings.
//!
//! The binary layers defaults, a TOML file and environment variables with the
//! `config` crate and deserialises the result into [`Settings`]. Everything is
//! range-checked by [`Settings::validate`] before the first write.

use std::path::PathBuf;

use serde::Deserialize;

use crate::{Error, Result};

/// A SQL backend the generator can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDatabase {
  Sqlite,
  Mysql,
  Mariadb,
  Postgresql,
}

impl TargetDatabase {
  pub fn as_str(self) -> &'static str {
    match self {
      TargetDatabase::Sqlite => "sqlite",
      TargetDatabase::Mysql => "mysql",
      TargetDatabase::Mariadb => "mariadb",
      TargetDatabase::Postgresql => "postgresql",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub num_stars:              usize,
  pub number_of_empires:      usize,
  /// Lower end of the galaxy-size range used for interpolated knobs.
  pub min_stars:              usize,
  /// Upper end of the galaxy-size range used for interpolated knobs.
  pub max_stars:              usize,
  pub random_seed:            u64,
  pub target_databases:       Vec<TargetDatabase>,
  pub sqlite_database:        PathBuf,
  /// Connection strings for the server backends, required when the backend
  /// is listed in `target_databases`.
  pub mysql_dsn:              Option<String>,
  pub mariadb_dsn:            Option<String>,
  pub postgresql_dsn:         Option<String>,
  /// Research/trade multiplier for planets in chokepoint systems.
  pub choke_point_multiplier: f64,
  pub hyperlane_density:      f64,
  pub habitable_worlds:       f64,
  pub assets_dir:             PathBuf,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      num_stars:              1000,
      number_of_empires:      20,
      min_stars:              100,
      max_stars:              100_000,
      random_seed:            1234,
      target_databases:       vec![TargetDatabase::Sqlite],
      sqlite_database:        PathBuf::from("starforge.db"),
      mysql_dsn:              None,
      mariadb_dsn:            None,
      postgresql_dsn:         None,
      choke_point_multiplier: 2.0,
      hyperlane_density:      1.0,
      habitable_worlds:       1.0,
      assets_dir:             PathBuf::from("assets"),
    }
  }
}

impl Settings {
  /// The connection string configured for a server backend. SQLite is
  /// addressed by `sqlite_database` instead.
  pub fn dsn(&self, backend: TargetDatabase) -> Option<&str> {
    match backend {
      TargetDatabase::Sqlite => None,
      TargetDatabase::Mysql => self.mysql_dsn.as_deref(),
      TargetDatabase::Mariadb => self.mariadb_dsn.as_deref(),
      TargetDatabase::Postgresql => self.postgresql_dsn.as_deref(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.target_databases.is_empty() {
      return Err(Error::InvalidSettings("target_databases is empty".into()));
    }
    for &backend in &self.target_databases {
      if backend != TargetDatabase::Sqlite && self.dsn(backend).is_none_or(str::is_empty) {
        return Err(Error::InvalidSettings(format!(
          "{}_dsn is required when {} is a target database",
          backend.as_str(),
          backend.as_str()
        )));
      }
    }
    if self.min_stars == 0 || self.min_stars >= self.max_stars {
      return Err(Error::InvalidSettings(format!(
        "star range [{}, {}] must be non-empty and start above zero",
        self.min_stars, self.max_stars
      )));
    }
    if !(self.min_stars..=self.max_stars).contains(&self.num_stars) {
      return Err(Error::InvalidSettings(format!(
        "num_stars {} must lie within [{}, {}]",
        self.num_stars, self.min_stars, self.max_stars
      )));
    }
    if self.number_of_empires == 0 {
      return Err(Error::InvalidSettings(
        "number_of_empires must be positive".into(),
      ));
    }
    if !(self.choke_point_multiplier > 0.0) {
      return Err(Error::InvalidSettings(
        "choke_point_multiplier must be positive".into(),
      ));
    }
    for (name, value) in [
      ("hyperlane_density", self.hyperlane_density),
      ("habitable_worlds", self.habitable_worlds),
    ] {
      if !(0.25..=5.0).contains(&value) {
        return Err(Error::InvalidSettings(format!(
          "{name} {value} must lie within [0.25, 5]"
        )));
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() { Settings::default().validate().unwrap(); }

  #[test]
  fn density_out_of_range_is_rejected() {
    let settings = Settings { hyperlane_density: 7.5, ..Default::default() };
    assert!(matches!(settings.validate(), Err(Error::InvalidSettings(_))));
  }

  #[test]
  fn server_backend_needs_a_dsn() {
    let mut settings = Settings {
      target_databases: vec![TargetDatabase::Sqlite, TargetDatabase::Postgresql],
      ..Default::default()
    };
    assert!(matches!(settings.validate(), Err(Error::InvalidSettings(_))));

    settings.postgresql_dsn = Some("postgres://localhost/galaxy".into());
    settings.validate().unwrap();
    assert_eq!(settings.dsn(TargetDatabase::Postgresql), Some("postgres://localhost/galaxy"));
    assert_eq!(settings.dsn(TargetDatabase::Sqlite), None);
  }

  #[test]
  fn star_count_outside_range_is_rejected() {
    let settings = Settings { num_stars: 10, ..Default::default() };
    assert!(settings.validate().is_err());
  }
}
