//! [`SqliteStore`]: the SQLite implementation of [`WorldStore`].

use std::{collections::BTreeMap, path::Path};

use starforge_core::{
  record::{
    Biome, Crew, CrewFriend, Empire, EmpireAuthority, EmpireEconomy, EmpireEthic,
    EmpireInfo, EmpireToEthic, Fleet, FleetCaps, Id, Planet, ReportsTo,
    Resources, ShipClass, ShipTemplate, ShipTemplateModule, Spaceship,
    SpaceshipModule, SpaceshipRank, StarSystem, StarType,
  },
  store::WorldStore,
};

use crate::{
  Error, Result,
  encode::{
    RawBiome, RawCrew, RawShipClass, SLOT_COLUMNS, encode_dt, encode_materials,
    read_slots, slot_values,
  },
  schema::{PRAGMAS, SCHEMA, TABLES, drop_statements},
};

const PLANET_COLUMNS: &str = "p.planet_id, p.name, p.size, p.star_system_id, \
  p.biome_id, p.minerals, p.energy, p.research, p.trade, p.pops";

const STAR_SYSTEM_COLUMNS: &str =
  "star_system_id, name, star_type_id, is_choke_point, empire_owner";

fn read_planet(row: &rusqlite::Row<'_>) -> rusqlite::Result<Planet> {
  Ok(Planet {
    planet_id:      row.get(0)?,
    name:           row.get(1)?,
    size:           row.get(2)?,
    star_system_id: row.get(3)?,
    biome_id:       row.get(4)?,
    resources:      Resources {
      minerals: row.get(5)?,
      energy:   row.get(6)?,
      research: row.get(7)?,
      trade:    row.get(8)?,
    },
    pops:           row.get(9)?,
  })
}

fn read_star_system(row: &rusqlite::Row<'_>) -> rusqlite::Result<StarSystem> {
  Ok(StarSystem {
    star_system_id: row.get(0)?,
    name:           row.get(1)?,
    star_type_id:   row.get(2)?,
    is_choke_point: row.get(3)?,
    empire_owner:   row.get(4)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A galaxy store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a database at `path`. The schema is left untouched
  /// until [`WorldStore::reset_schema`] runs.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  /// Open an in-memory database, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run one prepared statement per row inside a single transaction.
  ///
  /// Any failing row aborts the call; the transaction is dropped uncommitted
  /// and rolls back.
  async fn bulk<T, F>(&self, rows: Vec<T>, sql: &'static str, bind: F) -> Result<usize>
  where
    T: Send + 'static,
    F: Fn(&mut rusqlite::Statement<'_>, &T) -> rusqlite::Result<usize>
      + Send
      + 'static,
  {
    if rows.is_empty() {
      return Ok(0);
    }

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
          let mut stmt = tx.prepare_cached(sql)?;
          for row in &rows {
            written += bind(&mut *stmt, row)?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;
    Ok(written)
  }

  /// Run a query returning a single id column.
  async fn ids(&self, sql: String, params: Vec<i64>) -> Result<Vec<Id>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
          .query_map(rusqlite::params_from_iter(params), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<Id>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  async fn planets(&self, sql: String, params: Vec<i64>) -> Result<Vec<Planet>> {
    let planets = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let planets = stmt
          .query_map(rusqlite::params_from_iter(params), read_planet)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(planets)
      })
      .await?;
    Ok(planets)
  }

  async fn star_systems(&self, sql: String, params: Vec<i64>) -> Result<Vec<StarSystem>> {
    let systems = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let systems = stmt
          .query_map(rusqlite::params_from_iter(params), read_star_system)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(systems)
      })
      .await?;
    Ok(systems)
  }

  // ── Inspection ────────────────────────────────────────────────────────────

  /// Number of rows in `table`.
  pub async fn row_count(&self, table: &str) -> Result<usize> {
    let table = known_table(table)?;
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(count as usize)
  }

  /// Every row of `table` rendered as one `|`-separated line, ordered by the
  /// leading columns. Two runs with the same seed dump identically.
  pub async fn dump_table(&self, table: &str) -> Result<Vec<String>> {
    let table = known_table(table)?;
    let lines = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("SELECT * FROM {table} ORDER BY 1, 2"))?;
        let width = stmt.column_count();
        let lines = stmt
          .query_map([], |row| {
            (0..width)
              .map(|i| row.get_ref(i).map(|v| format!("{v:?}")))
              .collect::<rusqlite::Result<Vec<_>>>()
              .map(|cells| cells.join("|"))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lines)
      })
      .await?;
    Ok(lines)
  }

  /// Run a read-only query whose columns are all non-null integers.
  pub async fn query_ints(&self, sql: &str) -> Result<Vec<Vec<i64>>> {
    let sql = sql.to_owned();
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let width = stmt.column_count();
        let rows = stmt
          .query_map([], |row| {
            (0..width).map(|i| row.get(i)).collect::<rusqlite::Result<Vec<i64>>>()
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Every crew member, ordered by id.
  pub async fn list_crew(&self) -> Result<Vec<Crew>> {
    let raws: Vec<RawCrew> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT crew_id, name, spaceship_id, command_points, reports_to,
                  birth_date, hire_date, planet_of_birth_id
           FROM crew ORDER BY crew_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCrew {
              crew_id:            row.get(0)?,
              name:               row.get(1)?,
              spaceship_id:       row.get(2)?,
              command_points:     row.get(3)?,
              reports_to:         row.get(4)?,
              birth_date:         row.get(5)?,
              hire_date:          row.get(6)?,
              planet_of_birth_id: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCrew::into_crew).collect()
  }
}

fn known_table(table: &str) -> Result<&'static str> {
  TABLES
    .iter()
    .copied()
    .find(|t| *t == table)
    .ok_or_else(|| Error::UnknownTable(table.to_owned()))
}

// ─── WorldStore impl ─────────────────────────────────────────────────────────

impl WorldStore for SqliteStore {
  type Error = Error;

  // ── Schema ────────────────────────────────────────────────────────────────

  async fn reset_schema(&self) -> Result<()> {
    let ddl = format!("{}{SCHEMA}", drop_statements());
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Stars ─────────────────────────────────────────────────────────────────

  async fn insert_star_types(&self, rows: Vec<StarType>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO star_type (star_type_id, name, weight, weight_pct,
           habitability, mean_celestial_bodies)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        |stmt, t| {
          stmt.execute(rusqlite::params![
            t.star_type_id,
            t.name,
            t.weight,
            t.weight_pct,
            t.habitability,
            t.mean_celestial_bodies,
          ])
        },
      )
      .await
  }

  async fn insert_star_systems(&self, rows: Vec<StarSystem>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO star_system (star_system_id, name, star_type_id,
           is_choke_point, empire_owner)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        |stmt, s| {
          stmt.execute(rusqlite::params![
            s.star_system_id,
            s.name,
            s.star_type_id,
            s.is_choke_point,
            s.empire_owner,
          ])
        },
      )
      .await
  }

  async fn list_star_types(&self) -> Result<Vec<StarType>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT star_type_id, name, weight, weight_pct, habitability,
                  mean_celestial_bodies
           FROM star_type ORDER BY star_type_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(StarType {
              star_type_id:          row.get(0)?,
              name:                  row.get(1)?,
              weight:                row.get(2)?,
              weight_pct:            row.get(3)?,
              habitability:          row.get(4)?,
              mean_celestial_bodies: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn star_systems_of_type(
    &self,
    star_type_id: Id,
    limit:        usize,
    offset:       usize,
  ) -> Result<Vec<StarSystem>> {
    self
      .star_systems(
        format!(
          "SELECT {STAR_SYSTEM_COLUMNS} FROM star_system
           WHERE star_type_id = ?1
           ORDER BY star_system_id LIMIT ?2 OFFSET ?3"
        ),
        vec![star_type_id, limit as i64, offset as i64],
      )
      .await
  }

  async fn habitable_star_systems(&self, limit: usize, offset: usize) -> Result<Vec<Id>> {
    self
      .ids(
        "SELECT DISTINCT s.star_system_id
         FROM star_system s
         JOIN planet p ON p.star_system_id = s.star_system_id
         JOIN biome b ON b.biome_id = p.biome_id
         WHERE b.is_habitable = 1
         ORDER BY s.star_system_id LIMIT ?1 OFFSET ?2"
          .into(),
        vec![limit as i64, offset as i64],
      )
      .await
  }

  async fn unowned_star_systems(&self) -> Result<Vec<Id>> {
    self
      .ids(
        "SELECT star_system_id FROM star_system
         WHERE empire_owner IS NULL ORDER BY star_system_id"
          .into(),
        vec![],
      )
      .await
  }

  async fn set_star_owners(&self, owners: Vec<(Id, Id)>) -> Result<usize> {
    self
      .bulk(
        owners,
        "UPDATE star_system SET empire_owner = ?2 WHERE star_system_id = ?1",
        |stmt, (system, empire)| stmt.execute(rusqlite::params![system, empire]),
      )
      .await
  }

  // ── Planets ───────────────────────────────────────────────────────────────

  async fn insert_biomes(&self, rows: Vec<Biome>) -> Result<usize> {
    let rows = rows
      .into_iter()
      .map(|b| Ok((encode_materials(&b.materials)?, b)))
      .collect::<Result<Vec<_>>>()?;

    self
      .bulk(
        rows,
        "INSERT INTO biome (biome_id, name, is_habitable, min_size, max_size,
           gen_type, materials, special_gen_mean)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        |stmt, (materials, b)| {
          stmt.execute(rusqlite::params![
            b.biome_id,
            b.name,
            b.is_habitable,
            b.min_size,
            b.max_size,
            b.gen_type.as_str(),
            materials,
            b.special_gen_mean,
          ])
        },
      )
      .await
  }

  async fn list_biomes(&self) -> Result<Vec<Biome>> {
    let raws: Vec<RawBiome> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT biome_id, name, is_habitable, min_size, max_size, gen_type,
                  materials, special_gen_mean
           FROM biome ORDER BY biome_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawBiome {
              biome_id:         row.get(0)?,
              name:             row.get(1)?,
              is_habitable:     row.get(2)?,
              min_size:         row.get(3)?,
              max_size:         row.get(4)?,
              gen_type:         row.get(5)?,
              materials:        row.get(6)?,
              special_gen_mean: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBiome::into_biome).collect()
  }

  async fn insert_planets(&self, rows: Vec<Planet>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO planet (planet_id, name, size, star_system_id, biome_id,
           minerals, energy, research, trade, pops)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        |stmt, p| {
          stmt.execute(rusqlite::params![
            p.planet_id,
            p.name,
            p.size,
            p.star_system_id,
            p.biome_id,
            p.resources.minerals,
            p.resources.energy,
            p.resources.research,
            p.resources.trade,
            p.pops,
          ])
        },
      )
      .await
  }

  async fn list_planets(&self) -> Result<Vec<Planet>> {
    self
      .planets(format!("SELECT {PLANET_COLUMNS} FROM planet p ORDER BY p.planet_id"), vec![])
      .await
  }

  async fn update_planets(&self, rows: Vec<Planet>) -> Result<usize> {
    self
      .bulk(
        rows,
        "UPDATE planet SET size = ?2, biome_id = ?3, minerals = ?4, energy = ?5,
           research = ?6, trade = ?7, pops = ?8
         WHERE planet_id = ?1",
        |stmt, p| {
          stmt.execute(rusqlite::params![
            p.planet_id,
            p.size,
            p.biome_id,
            p.resources.minerals,
            p.resources.energy,
            p.resources.research,
            p.resources.trade,
            p.pops,
          ])
        },
      )
      .await
  }

  async fn habitable_planet_ids(&self) -> Result<Vec<Id>> {
    self
      .ids(
        "SELECT p.planet_id FROM planet p
         JOIN biome b ON b.biome_id = p.biome_id
         WHERE b.is_habitable = 1 ORDER BY p.planet_id"
          .into(),
        vec![],
      )
      .await
  }

  async fn empire_habitable_planets(&self, empire_id: Id) -> Result<Vec<Planet>> {
    self
      .planets(
        format!(
          "SELECT {PLANET_COLUMNS} FROM planet p
           JOIN star_system s ON s.star_system_id = p.star_system_id
           JOIN biome b ON b.biome_id = p.biome_id
           WHERE s.empire_owner = ?1 AND b.is_habitable = 1
           ORDER BY p.planet_id"
        ),
        vec![empire_id],
      )
      .await
  }

  async fn rescale_choke_point_planets(&self, multiplier: f64) -> Result<usize> {
    let touched = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE planet
           SET research = CAST(research * ?1 AS INTEGER),
               trade    = CAST(trade * ?1 AS INTEGER)
           WHERE star_system_id IN (
             SELECT star_system_id FROM star_system WHERE is_choke_point = 1
           )",
          rusqlite::params![multiplier],
        )?)
      })
      .await?;
    Ok(touched)
  }

  // ── Empires ───────────────────────────────────────────────────────────────

  async fn insert_authorities(&self, rows: Vec<EmpireAuthority>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO empire_authority (authority_id, name) VALUES (?1, ?2)",
        |stmt, a| stmt.execute(rusqlite::params![a.authority_id, a.name]),
      )
      .await
  }

  async fn insert_ethics(&self, rows: Vec<EmpireEthic>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO empire_ethic (ethic_id, name) VALUES (?1, ?2)",
        |stmt, e| stmt.execute(rusqlite::params![e.ethic_id, e.name]),
      )
      .await
  }

  async fn insert_empires(&self, rows: Vec<Empire>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO empire (empire_id, name, authority_id, score)
         VALUES (?1, ?2, ?3, ?4)",
        |stmt, e| {
          stmt.execute(rusqlite::params![e.empire_id, e.name, e.authority_id, e.score])
        },
      )
      .await
  }

  async fn insert_empire_ethics(&self, rows: Vec<EmpireToEthic>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO empire_to_ethic (empire_id, ethic_id, attraction)
         VALUES (?1, ?2, ?3)",
        |stmt, e| stmt.execute(rusqlite::params![e.empire_id, e.ethic_id, e.attraction]),
      )
      .await
  }

  async fn list_empires(&self) -> Result<Vec<EmpireInfo>> {
    let (mut empires, ethics) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT empire_id, name, authority_id, score, expansion_score,
                  gov_efficiency_bonus, num_systems, total_minerals,
                  total_energy, total_research, total_trade, colonies_count,
                  pops_count, total_fleets, max_fleet_size
           FROM empire ORDER BY empire_id",
        )?;
        let empires = stmt
          .query_map([], |row| {
            Ok(EmpireInfo {
              empire_id:            row.get(0)?,
              name:                 row.get(1)?,
              authority_id:         row.get(2)?,
              score:                row.get(3)?,
              ethics:               Vec::new(),
              expansion_score:      row.get(4)?,
              gov_efficiency_bonus: row.get(5)?,
              num_systems:          row.get(6)?,
              totals:               Resources {
                minerals: row.get(7)?,
                energy:   row.get(8)?,
                research: row.get(9)?,
                trade:    row.get(10)?,
              },
              colonies_count:       row.get(11)?,
              pops_count:           row.get(12)?,
              total_fleets:         row.get(13)?,
              max_fleet_size:       row.get(14)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT empire_id, ethic_id, attraction FROM empire_to_ethic
           ORDER BY empire_id, ethic_id",
        )?;
        let ethics = stmt
          .query_map([], |row| Ok((row.get::<_, Id>(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<rusqlite::Result<Vec<(Id, Id, i64)>>>()?;

        Ok((empires, ethics))
      })
      .await?;

    let mut by_empire: BTreeMap<Id, Vec<(Id, i64)>> = BTreeMap::new();
    for (empire_id, ethic_id, attraction) in ethics {
      by_empire.entry(empire_id).or_default().push((ethic_id, attraction));
    }
    for empire in &mut empires {
      empire.ethics = by_empire.remove(&empire.empire_id).unwrap_or_default();
    }
    Ok(empires)
  }

  async fn remove_empires_without_systems(&self) -> Result<usize> {
    let removed = self
      .conn
      .call(|conn| {
        const LANDLESS: &str = "SELECT empire_id FROM empire WHERE empire_id NOT IN (
            SELECT empire_owner FROM star_system WHERE empire_owner IS NOT NULL
          )";
        let tx = conn.transaction()?;
        tx.execute(
          &format!("DELETE FROM empire_to_ethic WHERE empire_id IN ({LANDLESS})"),
          [],
        )?;
        let removed =
          tx.execute(&format!("DELETE FROM empire WHERE empire_id IN ({LANDLESS})"), [])?;
        tx.commit()?;
        Ok(removed)
      })
      .await?;
    Ok(removed)
  }

  async fn set_expansion_scores(&self, scores: Vec<(Id, i64)>) -> Result<usize> {
    self
      .bulk(
        scores,
        "UPDATE empire SET expansion_score = ?2 WHERE empire_id = ?1",
        |stmt, (empire, score)| stmt.execute(rusqlite::params![empire, score]),
      )
      .await
  }

  async fn empire_economy(&self) -> Result<Vec<EmpireEconomy>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT e.empire_id,
                  e.gov_efficiency_bonus,
                  COUNT(DISTINCT s.star_system_id),
                  COALESCE(SUM(p.minerals), 0),
                  COALESCE(SUM(p.energy), 0),
                  COALESCE(SUM(p.research), 0),
                  COALESCE(SUM(p.trade), 0),
                  COALESCE(SUM(b.is_habitable), 0),
                  COALESCE(SUM(p.pops), 0)
           FROM empire e
           LEFT JOIN star_system s ON s.empire_owner = e.empire_id
           LEFT JOIN planet p ON p.star_system_id = s.star_system_id
           LEFT JOIN biome b ON b.biome_id = p.biome_id
           GROUP BY e.empire_id
           ORDER BY e.empire_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(EmpireEconomy {
              empire_id:            row.get(0)?,
              gov_efficiency_bonus: row.get(1)?,
              num_systems:          row.get(2)?,
              totals:               Resources {
                minerals: row.get(3)?,
                energy:   row.get(4)?,
                research: row.get(5)?,
                trade:    row.get(6)?,
              },
              colonies_count:       row.get(7)?,
              pops_count:           row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn set_empire_economy(&self, rows: Vec<EmpireEconomy>) -> Result<usize> {
    self
      .bulk(
        rows,
        "UPDATE empire SET gov_efficiency_bonus = ?2, num_systems = ?3,
           total_minerals = ?4, total_energy = ?5, total_research = ?6,
           total_trade = ?7, colonies_count = ?8, pops_count = ?9
         WHERE empire_id = ?1",
        |stmt, e| {
          stmt.execute(rusqlite::params![
            e.empire_id,
            e.gov_efficiency_bonus,
            e.num_systems,
            e.totals.minerals,
            e.totals.energy,
            e.totals.research,
            e.totals.trade,
            e.colonies_count,
            e.pops_count,
          ])
        },
      )
      .await
  }

  async fn set_fleet_caps(&self, rows: Vec<FleetCaps>) -> Result<usize> {
    self
      .bulk(
        rows,
        "UPDATE empire SET total_fleets = ?2, max_fleet_size = ?3 WHERE empire_id = ?1",
        |stmt, c| {
          stmt.execute(rusqlite::params![c.empire_id, c.total_fleets, c.max_fleet_size])
        },
      )
      .await
  }

  async fn set_empire_scores(&self, scores: Vec<(Id, i64)>) -> Result<usize> {
    self
      .bulk(
        scores,
        "UPDATE empire SET score = ?2 WHERE empire_id = ?1",
        |stmt, (empire, score)| stmt.execute(rusqlite::params![empire, score]),
      )
      .await
  }

  // ── Fleets & ships ────────────────────────────────────────────────────────

  async fn insert_fleets(&self, rows: Vec<Fleet>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO fleet (fleet_id, name, empire_id, cloak_strength, is_docked)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        |stmt, f| {
          stmt.execute(rusqlite::params![
            f.fleet_id,
            f.name,
            f.empire_id,
            f.cloak_strength,
            f.is_docked,
          ])
        },
      )
      .await
  }

  async fn empire_fleets(&self, empire_id: Id) -> Result<Vec<Id>> {
    self
      .ids(
        "SELECT fleet_id FROM fleet WHERE empire_id = ?1 ORDER BY fleet_id".into(),
        vec![empire_id],
      )
      .await
  }

  async fn insert_ship_classes(&self, rows: Vec<ShipClass>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO ship_class (ship_class_id, name, category, small, medium,
           large, xlarge, titan, juggernaut, colossus, star_eater,
           command_points, crew_count, bonus)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        |stmt, c| {
          let [s, m, l, xl, t, j, co, se] = slot_values(&c.slots);
          stmt.execute(rusqlite::params![
            c.ship_class_id,
            c.name,
            c.category.as_str(),
            s,
            m,
            l,
            xl,
            t,
            j,
            co,
            se,
            c.command_points,
            c.crew_count,
            c.bonus,
          ])
        },
      )
      .await
  }

  async fn list_ship_classes(&self) -> Result<Vec<ShipClass>> {
    let sql = format!(
      "SELECT ship_class_id, name, category, {SLOT_COLUMNS}, command_points,
              crew_count, bonus
       FROM ship_class ORDER BY ship_class_id"
    );
    let raws: Vec<RawShipClass> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawShipClass {
              ship_class_id:  row.get(0)?,
              name:           row.get(1)?,
              category:       row.get(2)?,
              slots:          read_slots(row, 3)?,
              command_points: row.get(11)?,
              crew_count:     row.get(12)?,
              bonus:          row.get(13)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawShipClass::into_ship_class).collect()
  }

  async fn insert_modules(&self, rows: Vec<SpaceshipModule>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO spaceship_module (module_id, name, power, weight, small,
           medium, large, xlarge, titan, juggernaut, colossus, star_eater)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        |stmt, m| {
          let [s, me, l, xl, t, j, co, se] = slot_values(&m.slots);
          stmt.execute(rusqlite::params![
            m.module_id,
            m.name,
            m.power,
            m.weight,
            s,
            me,
            l,
            xl,
            t,
            j,
            co,
            se,
          ])
        },
      )
      .await
  }

  async fn insert_ranks(&self, rows: Vec<SpaceshipRank>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO spaceship_rank (rank_id, name, min_experience,
           max_experience, bonus)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        |stmt, r| {
          stmt.execute(rusqlite::params![
            r.rank_id,
            r.name,
            r.min_experience,
            r.max_experience,
            r.bonus,
          ])
        },
      )
      .await
  }

  async fn insert_ship_templates(&self, rows: Vec<ShipTemplate>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO ship_template (template_id, name, ship_class_id)
         VALUES (?1, ?2, ?3)",
        |stmt, t| stmt.execute(rusqlite::params![t.template_id, t.name, t.ship_class_id]),
      )
      .await
  }

  async fn insert_template_modules(&self, rows: Vec<ShipTemplateModule>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO ship_template_module (template_id, module_id, count)
         VALUES (?1, ?2, ?3)",
        |stmt, m| stmt.execute(rusqlite::params![m.template_id, m.module_id, m.count]),
      )
      .await
  }

  async fn list_template_modules(&self) -> Result<Vec<ShipTemplateModule>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT template_id, module_id, count FROM ship_template_module
           ORDER BY template_id, module_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(ShipTemplateModule {
              template_id: row.get(0)?,
              module_id:   row.get(1)?,
              count:       row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn templates_of_class(&self, ship_class_id: Id) -> Result<Vec<Id>> {
    self
      .ids(
        "SELECT template_id FROM ship_template WHERE ship_class_id = ?1
         ORDER BY template_id"
          .into(),
        vec![ship_class_id],
      )
      .await
  }

  async fn insert_spaceships(&self, rows: Vec<Spaceship>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO spaceship (spaceship_id, name, fleet_id, template_id, experience)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        |stmt, s| {
          stmt.execute(rusqlite::params![
            s.spaceship_id,
            s.name,
            s.fleet_id,
            s.template_id,
            s.experience,
          ])
        },
      )
      .await
  }

  async fn empire_ships_of_class(&self, empire_id: Id, ship_class_id: Id) -> Result<Vec<Id>> {
    self
      .ids(
        "SELECT s.spaceship_id FROM spaceship s
         JOIN fleet f ON f.fleet_id = s.fleet_id
         JOIN ship_template t ON t.template_id = s.template_id
         WHERE f.empire_id = ?1 AND t.ship_class_id = ?2
         ORDER BY s.spaceship_id"
          .into(),
        vec![empire_id, ship_class_id],
      )
      .await
  }

  async fn fleet_power(&self, rank: SpaceshipRank, ship_class_id: Id) -> Result<Vec<(Id, f64)>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT f.empire_id, SUM(tm.count * m.power * (1.0 + ?1))
           FROM spaceship s
           JOIN fleet f ON f.fleet_id = s.fleet_id
           JOIN ship_template t ON t.template_id = s.template_id
           JOIN ship_template_module tm ON tm.template_id = t.template_id
           JOIN spaceship_module m ON m.module_id = tm.module_id
           WHERE t.ship_class_id = ?2
             AND s.experience >= ?3 AND s.experience < ?4
           GROUP BY f.empire_id
           ORDER BY f.empire_id",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              rank.bonus,
              ship_class_id,
              rank.min_experience,
              rank.max_experience
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  // ── Crew ──────────────────────────────────────────────────────────────────

  async fn insert_crew(&self, rows: Vec<Crew>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO crew (crew_id, name, spaceship_id, command_points,
           reports_to, birth_date, hire_date, planet_of_birth_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        |stmt, c| {
          stmt.execute(rusqlite::params![
            c.crew_id,
            c.name,
            c.spaceship_id,
            c.command_points,
            c.reports_to,
            encode_dt(c.birth_date),
            encode_dt(c.hire_date),
            c.planet_of_birth_id,
          ])
        },
      )
      .await
  }

  async fn empire_crew(&self, empire_id: Id) -> Result<Vec<Id>> {
    self
      .ids(
        "SELECT c.crew_id FROM crew c
         JOIN spaceship s ON s.spaceship_id = c.spaceship_id
         JOIN fleet f ON f.fleet_id = s.fleet_id
         WHERE f.empire_id = ?1
         ORDER BY c.crew_id"
          .into(),
        vec![empire_id],
      )
      .await
  }

  async fn set_reports_to(&self, rows: Vec<ReportsTo>) -> Result<usize> {
    self
      .bulk(
        rows,
        "UPDATE crew SET reports_to = ?2 WHERE crew_id = ?1",
        |stmt, r| stmt.execute(rusqlite::params![r.crew_id, r.reports_to]),
      )
      .await
  }

  async fn insert_crew_friends(&self, rows: Vec<CrewFriend>) -> Result<usize> {
    self
      .bulk(
        rows,
        "INSERT INTO crew_friend (crew_id, friend_id) VALUES (?1, ?2)",
        |stmt, f| stmt.execute(rusqlite::params![f.crew_id, f.friend_id]),
      )
      .await
  }
}
