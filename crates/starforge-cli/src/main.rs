//! `starforge`: generate a procedural galaxy into one or more databases.
//!
//! # Usage
//!
//! ```text
//! starforge --num-stars 5000 --seed 42 --database galaxy.db
//! starforge --config ./starforge.toml
//! ```
//!
//! Settings are layered: built-in defaults, then `starforge.toml` (or the
//! file given with `--config`), then `STARFORGE_*` environment variables
//! (nested keys use `__`), then command-line flags.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use starforge_core::{
  catalog::Catalog,
  settings::{Settings, TargetDatabase},
  store::WorldStore,
};
use starforge_gen::{GalaxySummary, generate_galaxy};
use starforge_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "starforge", version, about = "Procedural galaxy generator")]
struct Args {
  /// Path to a TOML settings file. Defaults to `starforge.toml` if present.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Number of star systems to generate.
  #[arg(long)]
  num_stars: Option<u64>,

  /// Seed for the random number generator.
  #[arg(long)]
  seed: Option<u64>,

  /// SQLite database file to write.
  #[arg(long, value_name = "PATH")]
  database: Option<PathBuf>,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let settings = load_settings(&args)?;
  settings.validate().context("invalid settings")?;

  let catalog = Catalog::load(&settings.assets_dir)
    .with_context(|| format!("failed to load assets from {:?}", settings.assets_dir))?;

  run_all(&settings, &catalog).await
}

/// Run every configured backend in turn. One failing backend does not stop
/// the others, but any failure fails the whole run.
async fn run_all(settings: &Settings, catalog: &Catalog) -> anyhow::Result<()> {
  let mut failed = Vec::new();
  for &backend in &settings.target_databases {
    tracing::info!(backend = backend.as_str(), seed = settings.random_seed, "starting run");
    match run(backend, settings, catalog).await {
      Ok(summary) => tracing::info!(backend = backend.as_str(), ?summary, "run finished"),
      Err(e) => {
        tracing::error!(backend = backend.as_str(), error = format!("{e:#}"), "run failed");
        failed.push(backend.as_str());
      }
    }
  }

  if !failed.is_empty() {
    anyhow::bail!("generation failed for: {}", failed.join(", "));
  }
  Ok(())
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
  let file = match &args.config {
    Some(path) => config::File::from(path.clone()).required(true),
    None => config::File::from(PathBuf::from("starforge.toml")).required(false),
  };

  let database = args.database.as_ref().map(|p| p.to_string_lossy().into_owned());

  config::Config::builder()
    .add_source(file)
    .add_source(
      config::Environment::with_prefix("STARFORGE")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("target_databases")
        .try_parsing(true),
    )
    .set_override_option("num_stars", args.num_stars)?
    .set_override_option("random_seed", args.seed)?
    .set_override_option("sqlite_database", database)?
    .build()
    .context("failed to read settings")?
    .try_deserialize()
    .context("failed to deserialise settings")
}

/// Reset one backend's schema and generate a galaxy into it.
async fn run(
  backend:  TargetDatabase,
  settings: &Settings,
  catalog:  &Catalog,
) -> anyhow::Result<GalaxySummary> {
  let mut rng = ChaCha8Rng::seed_from_u64(settings.random_seed);

  match backend {
    TargetDatabase::Sqlite => {
      let path = &settings.sqlite_database;
      let store = SqliteStore::open(path)
        .await
        .with_context(|| format!("failed to open {path:?}"))?;
      store.reset_schema().await.context("failed to reset schema")?;
      Ok(generate_galaxy(&store, catalog, settings, &mut rng).await?)
    }
    other => Err(starforge_core::Error::UnsupportedBackend(other.as_str().to_owned()).into()),
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;

  fn catalog() -> Catalog {
    Catalog::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets"))
      .expect("bundled assets")
  }

  #[tokio::test]
  async fn server_backends_are_unsupported() {
    let settings = Settings {
      num_stars: 100,
      target_databases: vec![TargetDatabase::Mysql],
      mysql_dsn: Some("mysql://localhost/galaxy".into()),
      ..Default::default()
    };
    settings.validate().unwrap();

    let err = run(TargetDatabase::Mysql, &settings, &catalog()).await.unwrap_err();
    assert!(matches!(
      err.downcast_ref::<starforge_core::Error>(),
      Some(starforge_core::Error::UnsupportedBackend(name)) if name == "mysql"
    ));
  }

  #[tokio::test]
  async fn one_failed_backend_fails_the_run() {
    let settings = Settings {
      num_stars: 100,
      target_databases: vec![TargetDatabase::Mariadb, TargetDatabase::Sqlite],
      mariadb_dsn: Some("mysql://localhost/galaxy".into()),
      sqlite_database: PathBuf::from(":memory:"),
      ..Default::default()
    };

    let err = run_all(&settings, &catalog()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("mariadb"), "{message}");
    assert!(!message.contains("sqlite"), "{message}");
  }

  #[tokio::test]
  async fn sqlite_alone_succeeds() {
    let settings = Settings {
      num_stars: 100,
      sqlite_database: PathBuf::from(":memory:"),
      ..Default::default()
    };
    run_all(&settings, &catalog()).await.unwrap();
  }
}
