//! SQL schema for the starforge SQLite store.
//!
//! Every run starts from an empty database: [`drop_statements`] removes the
//! tables children first, then [`SCHEMA`] recreates them.

/// Every table, parents before children.
pub const TABLES: &[&str] = &[
  "star_type",
  "empire_authority",
  "empire_ethic",
  "empire",
  "star_system",
  "biome",
  "planet",
  "empire_to_ethic",
  "fleet",
  "ship_class",
  "spaceship_module",
  "ship_template",
  "ship_template_module",
  "spaceship_rank",
  "spaceship",
  "crew",
  "crew_friend",
];

pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Drop statements in child-first order.
pub fn drop_statements() -> String {
  TABLES
    .iter()
    .rev()
    .map(|table| format!("DROP TABLE IF EXISTS {table};\n"))
    .collect()
}

/// Full schema DDL.
pub const SCHEMA: &str = "
CREATE TABLE star_type (
    star_type_id          INTEGER PRIMARY KEY,
    name                  TEXT NOT NULL UNIQUE,
    weight                REAL NOT NULL CHECK (weight > 0),
    weight_pct            REAL NOT NULL,
    habitability          REAL NOT NULL CHECK (habitability BETWEEN 0 AND 1),
    mean_celestial_bodies REAL NOT NULL CHECK (mean_celestial_bodies BETWEEN 0 AND 15)
);

CREATE TABLE empire_authority (
    authority_id INTEGER PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE
);

CREATE TABLE empire_ethic (
    ethic_id INTEGER PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE
);

-- Aggregate columns are filled in by later stages.
CREATE TABLE empire (
    empire_id            INTEGER PRIMARY KEY,
    name                 TEXT NOT NULL UNIQUE,
    authority_id         INTEGER NOT NULL REFERENCES empire_authority(authority_id),
    score                INTEGER,
    expansion_score      INTEGER NOT NULL DEFAULT 0,
    gov_efficiency_bonus INTEGER NOT NULL DEFAULT 0,
    num_systems          INTEGER NOT NULL DEFAULT 0,
    total_minerals       INTEGER NOT NULL DEFAULT 0,
    total_energy         INTEGER NOT NULL DEFAULT 0,
    total_research       INTEGER NOT NULL DEFAULT 0,
    total_trade          INTEGER NOT NULL DEFAULT 0,
    colonies_count       INTEGER NOT NULL DEFAULT 0,
    pops_count           INTEGER NOT NULL DEFAULT 0,
    total_fleets         INTEGER NOT NULL DEFAULT 0,
    max_fleet_size       INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE star_system (
    star_system_id INTEGER PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE,
    star_type_id   INTEGER NOT NULL REFERENCES star_type(star_type_id),
    is_choke_point INTEGER NOT NULL CHECK (is_choke_point IN (0, 1)),
    empire_owner   INTEGER REFERENCES empire(empire_id) ON DELETE SET NULL
);

CREATE TABLE biome (
    biome_id         INTEGER PRIMARY KEY,
    name             TEXT NOT NULL UNIQUE,
    is_habitable     INTEGER NOT NULL CHECK (is_habitable IN (0, 1)),
    min_size         INTEGER NOT NULL,
    max_size         INTEGER NOT NULL,
    gen_type         TEXT NOT NULL,   -- 'normal' | 'special' | 'megastructure'
    materials        TEXT NOT NULL,   -- JSON array of material names
    special_gen_mean REAL NOT NULL DEFAULT 0 CHECK (special_gen_mean >= 0),
    CHECK (min_size <= max_size)
);

CREATE TABLE planet (
    planet_id      INTEGER PRIMARY KEY,
    name           TEXT NOT NULL,
    size           INTEGER NOT NULL,
    star_system_id INTEGER NOT NULL REFERENCES star_system(star_system_id),
    biome_id       INTEGER NOT NULL REFERENCES biome(biome_id),
    minerals       INTEGER NOT NULL DEFAULT 0,
    energy         INTEGER NOT NULL DEFAULT 0,
    research       INTEGER NOT NULL DEFAULT 0,
    trade          INTEGER NOT NULL DEFAULT 0,
    pops           INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE empire_to_ethic (
    empire_id  INTEGER NOT NULL REFERENCES empire(empire_id) ON DELETE CASCADE,
    ethic_id   INTEGER NOT NULL REFERENCES empire_ethic(ethic_id),
    attraction INTEGER NOT NULL CHECK (attraction BETWEEN 0 AND 3),
    PRIMARY KEY (empire_id, ethic_id)
);

CREATE TABLE fleet (
    fleet_id       INTEGER PRIMARY KEY,
    name           TEXT NOT NULL,
    empire_id      INTEGER NOT NULL REFERENCES empire(empire_id) ON DELETE CASCADE,
    cloak_strength INTEGER NOT NULL CHECK (cloak_strength BETWEEN 0 AND 100),
    is_docked      INTEGER NOT NULL CHECK (is_docked IN (0, 1))
);

CREATE TABLE ship_class (
    ship_class_id  INTEGER PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE,
    category       TEXT NOT NULL,   -- 'combat' | 'stationary' | 'civilian'
    small          INTEGER NOT NULL DEFAULT 0 CHECK (small >= 0),
    medium         INTEGER NOT NULL DEFAULT 0 CHECK (medium >= 0),
    large          INTEGER NOT NULL DEFAULT 0 CHECK (large >= 0),
    xlarge         INTEGER NOT NULL DEFAULT 0 CHECK (xlarge >= 0),
    titan          INTEGER NOT NULL DEFAULT 0 CHECK (titan >= 0),
    juggernaut     INTEGER NOT NULL DEFAULT 0 CHECK (juggernaut >= 0),
    colossus       INTEGER NOT NULL DEFAULT 0 CHECK (colossus >= 0),
    star_eater     INTEGER NOT NULL DEFAULT 0 CHECK (star_eater >= 0),
    command_points INTEGER NOT NULL,
    crew_count     INTEGER NOT NULL,
    bonus          REAL
);

-- Slot columns are one-hot: the module occupies exactly one size.
CREATE TABLE spaceship_module (
    module_id  INTEGER PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    power      INTEGER NOT NULL,
    weight     REAL NOT NULL CHECK (weight > 0),
    small      INTEGER NOT NULL DEFAULT 0 CHECK (small IN (0, 1)),
    medium     INTEGER NOT NULL DEFAULT 0 CHECK (medium IN (0, 1)),
    large      INTEGER NOT NULL DEFAULT 0 CHECK (large IN (0, 1)),
    xlarge     INTEGER NOT NULL DEFAULT 0 CHECK (xlarge IN (0, 1)),
    titan      INTEGER NOT NULL DEFAULT 0 CHECK (titan IN (0, 1)),
    juggernaut INTEGER NOT NULL DEFAULT 0 CHECK (juggernaut IN (0, 1)),
    colossus   INTEGER NOT NULL DEFAULT 0 CHECK (colossus IN (0, 1)),
    star_eater INTEGER NOT NULL DEFAULT 0 CHECK (star_eater IN (0, 1)),
    CHECK (small + medium + large + xlarge + titan + juggernaut + colossus
           + star_eater = 1)
);

CREATE TABLE ship_template (
    template_id   INTEGER PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    ship_class_id INTEGER NOT NULL REFERENCES ship_class(ship_class_id)
);

CREATE TABLE ship_template_module (
    template_id INTEGER NOT NULL REFERENCES ship_template(template_id) ON DELETE CASCADE,
    module_id   INTEGER NOT NULL REFERENCES spaceship_module(module_id),
    count       INTEGER NOT NULL CHECK (count > 0),
    PRIMARY KEY (template_id, module_id)
);

-- Reject a loadout row that would push any slot size past the class capacity.
CREATE TRIGGER ship_template_module_capacity
BEFORE INSERT ON ship_template_module
WHEN EXISTS (
    SELECT 1
    FROM ship_template t
    JOIN ship_class c ON c.ship_class_id = t.ship_class_id
    JOIN (
        SELECT SUM(m.small * x.count)      AS small,
               SUM(m.medium * x.count)     AS medium,
               SUM(m.large * x.count)      AS large,
               SUM(m.xlarge * x.count)     AS xlarge,
               SUM(m.titan * x.count)      AS titan,
               SUM(m.juggernaut * x.count) AS juggernaut,
               SUM(m.colossus * x.count)   AS colossus,
               SUM(m.star_eater * x.count) AS star_eater
        FROM (
            SELECT module_id, count FROM ship_template_module
            WHERE template_id = NEW.template_id
            UNION ALL
            SELECT NEW.module_id, NEW.count
        ) x
        JOIN spaceship_module m ON m.module_id = x.module_id
    ) u
    WHERE t.template_id = NEW.template_id
      AND (u.small > c.small OR u.medium > c.medium OR u.large > c.large
           OR u.xlarge > c.xlarge OR u.titan > c.titan
           OR u.juggernaut > c.juggernaut OR u.colossus > c.colossus
           OR u.star_eater > c.star_eater)
)
BEGIN
    SELECT RAISE(ABORT, 'ship template slot capacity exceeded');
END;

CREATE TABLE spaceship_rank (
    rank_id        INTEGER PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE,
    min_experience INTEGER NOT NULL,
    max_experience INTEGER NOT NULL,
    bonus          REAL NOT NULL,
    CHECK (min_experience < max_experience)
);

CREATE TABLE spaceship (
    spaceship_id INTEGER PRIMARY KEY,
    name         TEXT NOT NULL,
    fleet_id     INTEGER NOT NULL REFERENCES fleet(fleet_id) ON DELETE CASCADE,
    template_id  INTEGER NOT NULL REFERENCES ship_template(template_id),
    experience   INTEGER   -- NULL for stationary and civilian ships
);

CREATE TABLE crew (
    crew_id            INTEGER PRIMARY KEY,
    name               TEXT NOT NULL,
    spaceship_id       INTEGER NOT NULL REFERENCES spaceship(spaceship_id) ON DELETE CASCADE,
    command_points     INTEGER NOT NULL,
    reports_to         INTEGER REFERENCES crew(crew_id),
    birth_date         TEXT NOT NULL,   -- RFC 3339 UTC
    hire_date          TEXT NOT NULL,   -- RFC 3339 UTC
    planet_of_birth_id INTEGER NOT NULL REFERENCES planet(planet_id),
    CHECK (reports_to IS NULL OR reports_to != crew_id)
);

CREATE TABLE crew_friend (
    crew_id   INTEGER NOT NULL REFERENCES crew(crew_id) ON DELETE CASCADE,
    friend_id INTEGER NOT NULL REFERENCES crew(crew_id) ON DELETE CASCADE,
    PRIMARY KEY (crew_id, friend_id),
    CHECK (crew_id != friend_id)
);

CREATE INDEX star_system_type_idx  ON star_system(star_type_id);
CREATE INDEX star_system_owner_idx ON star_system(empire_owner);
CREATE INDEX planet_system_idx     ON planet(star_system_id);
CREATE INDEX fleet_empire_idx      ON fleet(empire_id);
CREATE INDEX spaceship_fleet_idx   ON spaceship(fleet_id);
CREATE INDEX crew_spaceship_idx    ON crew(spaceship_id);

PRAGMA user_version = 1;
";
