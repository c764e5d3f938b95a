//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeZone, Utc};
use starforge_core::{
  catalog::Catalog,
  record::{
    Biome, BiomeGenType, Crew, EmpireEthic, Empire, EmpireAuthority,
    EmpireToEthic, Fleet, Material, Planet, Resources, ShipCategory, ShipClass,
    ShipTemplate, ShipTemplateModule, SlotCounts, SlotSize, Spaceship,
    SpaceshipModule, SpaceshipRank, StarSystem, StarType,
  },
  store::WorldStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  store.reset_schema().await.expect("schema");
  store
}

fn catalog() -> Catalog {
  Catalog::load(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets"))
    .expect("bundled assets")
}

fn star_type() -> StarType {
  StarType {
    star_type_id:          1,
    name:                  "G".into(),
    weight:                1.0,
    weight_pct:            1.0,
    habitability:          0.8,
    mean_celestial_bodies: 4.0,
  }
}

fn system(id: i64, choke: bool) -> StarSystem {
  StarSystem {
    star_system_id: id,
    name:           format!("Vega {id}"),
    star_type_id:   1,
    is_choke_point: choke,
    empire_owner:   None,
  }
}

fn biome(id: i64, habitable: bool) -> Biome {
  Biome {
    biome_id:         id,
    name:             format!("biome-{id}"),
    is_habitable:     habitable,
    min_size:         1,
    max_size:         30,
    gen_type:         BiomeGenType::Normal,
    materials:        Material::ALL.to_vec(),
    special_gen_mean: 0.0,
  }
}

fn planet(id: i64, system: i64, biome: i64) -> Planet {
  Planet {
    planet_id:      id,
    name:           format!("Vega {system} {id}"),
    size:           10,
    star_system_id: system,
    biome_id:       biome,
    resources:      Resources { minerals: 6, energy: 4, research: 3, trade: 5 },
    pops:           7,
  }
}

/// One star type, systems 1 (chokepoint) and 2, one habitable and one barren
/// biome, and three planets.
async fn seeded() -> SqliteStore {
  let s = store().await;
  s.insert_star_types(vec![star_type()]).await.unwrap();
  s.insert_star_systems(vec![system(1, true), system(2, false)]).await.unwrap();
  s.insert_biomes(vec![biome(1, true), biome(2, false)]).await.unwrap();
  s.insert_planets(vec![planet(1, 1, 1), planet(2, 1, 2), planet(3, 2, 1)])
    .await
    .unwrap();
  s
}

async fn with_empires(s: &SqliteStore) {
  s.insert_authorities(vec![EmpireAuthority { authority_id: 1, name: "imperial".into() }])
    .await
    .unwrap();
  s.insert_ethics(vec![
    EmpireEthic { ethic_id: 1, name: "militarist".into() },
    EmpireEthic { ethic_id: 2, name: "xenophobe".into() },
  ])
  .await
  .unwrap();
  s.insert_empires(vec![
    Empire { empire_id: 1, name: "Kree Union".into(), authority_id: 1, score: None },
    Empire { empire_id: 2, name: "Vor Hegemony".into(), authority_id: 1, score: None },
  ])
  .await
  .unwrap();
  s.insert_empire_ethics(vec![
    EmpireToEthic { empire_id: 1, ethic_id: 1, attraction: 2 },
    EmpireToEthic { empire_id: 1, ethic_id: 2, attraction: 1 },
    EmpireToEthic { empire_id: 2, ethic_id: 2, attraction: 1 },
  ])
  .await
  .unwrap();
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_schema_empties_every_table() {
  let s = seeded().await;
  assert_eq!(s.row_count("planet").await.unwrap(), 3);

  s.reset_schema().await.unwrap();
  for table in crate::TABLES {
    assert_eq!(s.row_count(table).await.unwrap(), 0, "{table}");
  }
}

#[tokio::test]
async fn unknown_table_is_rejected() {
  let s = store().await;
  assert!(matches!(
    s.row_count("sqlite_master; --").await,
    Err(crate::Error::UnknownTable(_))
  ));
}

// ─── Catalogs ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_round_trip() {
  let s = store().await;
  let catalog = catalog();

  s.insert_star_types(catalog.star_types.clone()).await.unwrap();
  s.insert_biomes(catalog.biomes.clone()).await.unwrap();
  s.insert_ship_classes(catalog.ship_classes.clone()).await.unwrap();
  s.insert_modules(catalog.modules.clone()).await.unwrap();

  assert_eq!(s.list_star_types().await.unwrap(), catalog.star_types);
  assert_eq!(s.list_biomes().await.unwrap(), catalog.biomes);
  assert_eq!(s.list_ship_classes().await.unwrap(), catalog.ship_classes);
  assert_eq!(
    s.row_count("spaceship_module").await.unwrap(),
    catalog.modules.len()
  );
}

// ─── Constraints ─────────────────────────────────────────────────────────────

fn module(id: i64, slots: SlotCounts) -> SpaceshipModule {
  SpaceshipModule { module_id: id, name: format!("m{id}"), power: 10, weight: 1.0, slots }
}

#[tokio::test]
async fn module_slots_must_be_one_hot() {
  let s = store().await;

  s.insert_modules(vec![module(1, SlotCounts::one_hot(SlotSize::Medium))])
    .await
    .unwrap();

  let two_sizes = SlotCounts { small: 1, large: 1, ..Default::default() };
  assert!(s.insert_modules(vec![module(2, two_sizes)]).await.is_err());

  let double = SlotCounts { small: 2, ..Default::default() };
  assert!(s.insert_modules(vec![module(3, double)]).await.is_err());

  assert!(s.insert_modules(vec![module(4, SlotCounts::default())]).await.is_err());
  assert_eq!(s.row_count("spaceship_module").await.unwrap(), 1);
}

async fn with_template(s: &SqliteStore) {
  s.insert_ship_classes(vec![ShipClass {
    ship_class_id:  1,
    name:           "corvette".into(),
    category:       ShipCategory::Combat,
    slots:          SlotCounts { small: 2, medium: 1, ..Default::default() },
    command_points: 1,
    crew_count:     3,
    bonus:          Some(0.0),
  }])
  .await
  .unwrap();
  s.insert_modules(vec![
    module(1, SlotCounts::one_hot(SlotSize::Small)),
    module(2, SlotCounts::one_hot(SlotSize::Small)),
    module(3, SlotCounts::one_hot(SlotSize::Medium)),
  ])
  .await
  .unwrap();
  s.insert_ship_templates(vec![ShipTemplate {
    template_id:   1,
    name:          "Aster Works corvette".into(),
    ship_class_id: 1,
  }])
  .await
  .unwrap();
}

#[tokio::test]
async fn slot_trigger_rejects_overfull_template() {
  let s = store().await;
  with_template(&s).await;

  s.insert_template_modules(vec![
    ShipTemplateModule { template_id: 1, module_id: 1, count: 1 },
    ShipTemplateModule { template_id: 1, module_id: 3, count: 1 },
  ])
  .await
  .unwrap();

  // A second small module pushes small slots to 1 + 2 = 3 > 2.
  let err = s
    .insert_template_modules(vec![ShipTemplateModule { template_id: 1, module_id: 2, count: 2 }])
    .await;
  assert!(err.is_err());

  s.insert_template_modules(vec![ShipTemplateModule { template_id: 1, module_id: 2, count: 1 }])
    .await
    .unwrap();
  assert_eq!(s.list_template_modules().await.unwrap().len(), 3);
}

#[tokio::test]
async fn failed_batch_rolls_back() {
  let s = store().await;
  s.insert_star_types(vec![star_type()]).await.unwrap();

  // Duplicate name on the third row.
  let mut dup = system(3, false);
  dup.name = system(1, false).name;
  let result = s.insert_star_systems(vec![system(1, false), system(2, false), dup]).await;

  assert!(result.is_err());
  assert_eq!(s.row_count("star_system").await.unwrap(), 0);
}

// ─── Stars & planets ─────────────────────────────────────────────────────────

#[tokio::test]
async fn choke_point_rescale_compounds() {
  let s = seeded().await;

  assert_eq!(s.rescale_choke_point_planets(2.0).await.unwrap(), 2);
  assert_eq!(s.rescale_choke_point_planets(2.0).await.unwrap(), 2);

  let planets = s.list_planets().await.unwrap();
  assert_eq!(planets[0].resources.research, 12);
  assert_eq!(planets[0].resources.trade, 20);
  assert_eq!(planets[0].resources.minerals, 6);
  // System 2 is not a chokepoint.
  assert_eq!(planets[2].resources.research, 3);
  assert_eq!(planets[2].resources.trade, 5);
}

#[tokio::test]
async fn habitable_systems_are_paged_by_id() {
  let s = seeded().await;
  s.insert_star_systems(vec![system(3, false)]).await.unwrap();
  s.insert_planets(vec![planet(4, 3, 2)]).await.unwrap();

  assert_eq!(s.habitable_star_systems(10, 0).await.unwrap(), [1, 2]);
  assert_eq!(s.habitable_star_systems(1, 1).await.unwrap(), [2]);
  assert!(s.habitable_star_systems(10, 2).await.unwrap().is_empty());
  assert_eq!(s.habitable_planet_ids().await.unwrap(), [1, 3]);
}

#[tokio::test]
async fn star_systems_of_type_pages() {
  let s = seeded().await;
  let page = s.star_systems_of_type(1, 1, 1).await.unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].star_system_id, 2);
  assert!(s.star_systems_of_type(99, 10, 0).await.unwrap().is_empty());
}

// ─── Empires ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn landless_empires_are_removed_with_their_ethics() {
  let s = seeded().await;
  with_empires(&s).await;
  s.set_star_owners(vec![(1, 1)]).await.unwrap();

  assert_eq!(s.remove_empires_without_systems().await.unwrap(), 1);

  let empires = s.list_empires().await.unwrap();
  assert_eq!(empires.len(), 1);
  assert_eq!(empires[0].ethics, [(1, 2), (2, 1)]);
  assert_eq!(s.row_count("empire_to_ethic").await.unwrap(), 2);
  assert_eq!(s.unowned_star_systems().await.unwrap(), [2]);
}

#[tokio::test]
async fn economy_sums_owned_planets() {
  let s = seeded().await;
  with_empires(&s).await;
  s.set_star_owners(vec![(1, 1), (2, 1)]).await.unwrap();

  let economy = s.empire_economy().await.unwrap();
  assert_eq!(economy.len(), 2);

  let kree = economy[0];
  assert_eq!(kree.num_systems, 2);
  assert_eq!(kree.totals.minerals, 18);
  assert_eq!(kree.totals.research, 9);
  assert_eq!(kree.colonies_count, 2);
  assert_eq!(kree.pops_count, 21);

  let vor = economy[1];
  assert_eq!((vor.num_systems, vor.colonies_count, vor.pops_count), (0, 0, 0));

  let habitable = s.empire_habitable_planets(1).await.unwrap();
  assert_eq!(habitable.iter().map(|p| p.planet_id).collect::<Vec<_>>(), [1, 3]);
}

// ─── Fleets, ships & crew ────────────────────────────────────────────────────

#[tokio::test]
async fn fleet_power_weights_by_rank() {
  let s = seeded().await;
  with_empires(&s).await;
  with_template(&s).await;
  s.insert_template_modules(vec![
    ShipTemplateModule { template_id: 1, module_id: 1, count: 2 },
    ShipTemplateModule { template_id: 1, module_id: 3, count: 1 },
  ])
  .await
  .unwrap();
  s.insert_fleets(vec![Fleet {
    fleet_id:       1,
    name:           "Iron Wing".into(),
    empire_id:      1,
    cloak_strength: 40,
    is_docked:      true,
  }])
  .await
  .unwrap();
  s.insert_spaceships(vec![
    Spaceship { spaceship_id: 1, name: "KXR I".into(), fleet_id: 1, template_id: 1, experience: Some(10) },
    Spaceship { spaceship_id: 2, name: "KXR II".into(), fleet_id: 1, template_id: 1, experience: Some(80) },
  ])
  .await
  .unwrap();

  let green = SpaceshipRank {
    rank_id:        1,
    name:           "green".into(),
    min_experience: 0,
    max_experience: 50,
    bonus:          0.5,
  };
  // One ship in band: (2·10 + 1·10) × 1.5.
  assert_eq!(s.fleet_power(green, 1).await.unwrap(), [(1, 45.0)]);
  assert_eq!(s.empire_ships_of_class(1, 1).await.unwrap(), [1, 2]);
  assert_eq!(s.templates_of_class(1).await.unwrap(), [1]);
  assert_eq!(s.empire_fleets(1).await.unwrap(), [1]);
  assert!(s.empire_fleets(2).await.unwrap().is_empty());
}

#[tokio::test]
async fn crew_dates_round_trip() {
  let s = seeded().await;
  with_empires(&s).await;
  with_template(&s).await;
  s.insert_fleets(vec![Fleet {
    fleet_id:       1,
    name:           "Iron Wing".into(),
    empire_id:      2,
    cloak_strength: 0,
    is_docked:      false,
  }])
  .await
  .unwrap();
  s.insert_spaceships(vec![Spaceship {
    spaceship_id: 1,
    name:         "QQA Shrike".into(),
    fleet_id:     1,
    template_id:  1,
    experience:   None,
  }])
  .await
  .unwrap();

  let birth = Utc.with_ymd_and_hms(2231, 4, 2, 6, 30, 0).unwrap();
  let hire = Utc.with_ymd_and_hms(2260, 1, 1, 0, 0, 0).unwrap();
  let crew = Crew {
    crew_id:            1,
    name:               "Ada Okonkwo".into(),
    spaceship_id:       1,
    command_points:     39,
    reports_to:         None,
    birth_date:         birth,
    hire_date:          hire,
    planet_of_birth_id: 3,
  };
  s.insert_crew(vec![crew.clone()]).await.unwrap();

  assert_eq!(s.list_crew().await.unwrap(), [crew]);
  assert_eq!(s.empire_crew(2).await.unwrap(), [1]);
  assert!(s.empire_crew(1).await.unwrap().is_empty());
}
