mod app;
mod cache;
mod catalog;
mod config;
mod db;
mod error;
mod loader;
mod logging;
mod secrets;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;

use app::{App, AppState};
use cache::{CacheFirstRepository, CatalogStore, SqliteStore};
use catalog::{CatalogApi, CatalogClient, Character, Series};
use config::Config;
use db::Database;
use secrets::{FileSecretStore, SecretStore};

#[derive(Parser, Debug)]
#[command(name = "comicdex")]
#[command(about = "A cache-first client for the comic character catalog")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/comicdex/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Path to the cache database
  #[arg(long)]
  database: Option<PathBuf>,

  /// Mirror logs to stderr
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load every character on the roster
  Load,
  /// Show one character, fetching it if not cached
  Character { name: String },
  /// List the series of a character
  Series { name: String },
  /// Show one series of a character
  Serie { name: String, series_id: i64 },
  /// Show a cached character by id
  Show { id: i64 },
  /// Save the private signing key in the secret store
  Login { private_key: String },
  /// Delete all cached data and the stored signing key
  Wipe,
  /// Show cache statistics
  Status,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let data_dir = config::data_dir()?;
  let _log_guard = logging::init(&data_dir, args.verbose)?;

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  // Override database if specified on command line
  let config = if let Some(database) = args.database {
    Config {
      database: Some(database),
      ..config
    }
  } else {
    config
  };

  let context = config.context();
  let secret_file = FileSecretStore::new(data_dir.join("secrets.json"));
  let secret_path = secret_file.path().to_path_buf();
  let secrets: Arc<dyn SecretStore> = Arc::new(secret_file);
  let store = Arc::new(SqliteStore::new(
    Database::open(&config.database_path()?)?,
    Arc::clone(&secrets),
  ));

  match args.command {
    Command::Login { private_key } => {
      if !secrets.save(&context.secret_key, &private_key) {
        return Err(eyre!("Failed to save signing key"));
      }
      println!("Signing key saved to {}", secret_path.display());
    }
    Command::Wipe => {
      if !store.wipe_all(&context.secret_key) {
        return Err(eyre!(
          "Failed to fully wipe the signing key and cache. See {} for details.",
          data_dir.join(logging::LOG_FILE).display()
        ));
      }
      println!("Cache and signing key deleted");
    }
    Command::Status => {
      let summary = store.summary()?;
      println!("characters: {}", summary.characters);
      println!("series:     {}", summary.series);
      if let Some(oldest) = summary.oldest {
        println!("oldest:     {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
      }
    }
    Command::Show { id } => {
      print_character(&store.character(id)?);
    }
    command => {
      let credentials = config.credentials(secrets.as_ref())?;
      let client = CatalogClient::new(&config.catalog, credentials)?;
      let mut app = App::new(CacheFirstRepository::new(client, store), context);
      browse(&mut app, command).await?;
    }
  }

  Ok(())
}

/// Run a catalog command through the app state machine.
async fn browse<A: CatalogApi, S: CatalogStore>(
  app: &mut App<A, S>,
  command: Command,
) -> Result<()> {
  match command {
    Command::Load => {
      app.load_characters().await;
      ensure_ready(app.state())?;
      for character in app.characters() {
        println!("{:>8}  {}", character.id, character.name);
      }
    }
    Command::Character { name } => {
      app.load_character(&name).await;
      ensure_ready(app.state())?;
      for character in app.characters() {
        print_character(character);
      }
    }
    Command::Series { name } => {
      open_character(app, &name).await?;
      for serie in app.series() {
        println!("{:>8}  {}", serie.id, serie.title);
      }
    }
    Command::Serie { name, series_id } => {
      open_character(app, &name).await?;
      app.select_serie(series_id);
      ensure_ready(app.state())?;
      if let AppState::SerieDetailReady(serie) = app.state() {
        print_serie(serie);
      }

      // Back to the series list, with the other series of the character
      app.back();
      if let AppState::SeriesReady(character) = app.state() {
        let others: Vec<&Series> = app.series().iter().filter(|s| s.id != series_id).collect();
        if !others.is_empty() {
          println!();
          println!("Other series of {}:", character.name);
          for serie in others {
            println!("{:>8}  {}", serie.id, serie.title);
          }
        }
      }
    }
    // Handled in main without a catalog client
    Command::Show { .. } | Command::Login { .. } | Command::Wipe | Command::Status => {}
  }

  Ok(())
}

/// Load a character and its series.
async fn open_character<A: CatalogApi, S: CatalogStore>(
  app: &mut App<A, S>,
  name: &str,
) -> Result<()> {
  app.load_character(name).await;
  ensure_ready(app.state())?;

  let character = app
    .characters()
    .first()
    .cloned()
    .ok_or_else(|| eyre!("Character {} not loaded", name))?;

  app.select_character(character).await;
  ensure_ready(app.state())
}

fn ensure_ready(state: &AppState) -> Result<()> {
  match state {
    AppState::Failed(msg) => Err(eyre!("{}", msg)),
    _ => Ok(()),
  }
}

fn print_character(character: &Character) {
  println!("{} ({})", character.name, character.id);
  println!("image: {}", character.image_url());
  if !character.description.is_empty() {
    println!();
    println!("{}", character.description);
  }
}

fn print_serie(serie: &Series) {
  println!("{} ({})", serie.title, serie.id);
  println!("image: {}", serie.image_url());
  if let Some(description) = &serie.description {
    println!();
    println!("{}", description);
  }
}
