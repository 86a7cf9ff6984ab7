use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use spacelabel::common::config::{Config, StorageBackend, StorageSettings, config_file};
use spacelabel::common::log::init_logging;
use spacelabel::common::prefs_file::JsonFilePreferences;
use spacelabel::model::labels::{LabelStore, Preferences};
use spacelabel::model::server::{SpaceData, label_list};
use spacelabel::model::space::SpaceId;
use tracing::info;

#[cfg(target_os = "macos")]
embed_plist::embed_info_plist!("../assets/Info.plist");

type Store = LabelStore<Box<dyn Preferences>>;

#[derive(Parser)]
#[command(name = "spacelabel", version, about = "A floating label naming the active macOS Space")]
struct Cli {
    /// Config file to use instead of ~/.config/spacelabel/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show the overlay (the default)
    Run,
    /// Print the active Space and its label
    Current {
        #[arg(long)]
        json: bool,
    },
    /// Print every stored label
    List {
        #[arg(long)]
        json: bool,
    },
    /// Name a Space
    Set { space: SpaceId, name: String },
    /// Forget a Space's name
    Clear { space: SpaceId },
    /// Print the default configuration
    DefaultConfig,
}

fn open_store(storage: &StorageSettings) -> anyhow::Result<Store> {
    let prefs: Box<dyn Preferences> = match storage.backend {
        StorageBackend::File => Box::new(JsonFilePreferences::new(storage.labels_file())),
        #[cfg(target_os = "macos")]
        StorageBackend::UserDefaults => {
            Box::new(spacelabel::sys::user_defaults::UserDefaults::standard())
        }
        #[cfg(not(target_os = "macos"))]
        StorageBackend::UserDefaults => {
            bail!("the user_defaults storage backend is only available on macOS")
        }
    };
    Ok(LabelStore::new(prefs))
}

#[cfg(target_os = "macos")]
fn run(config: Config, store: Store) -> anyhow::Result<()> {
    spacelabel::actor::app::run(config, store)
}

#[cfg(not(target_os = "macos"))]
fn run(_config: Config, _store: Store) -> anyhow::Result<()> {
    bail!("the overlay is only available on macOS")
}

#[cfg(target_os = "macos")]
fn current(config: &Config, store: Store, json: bool) -> anyhow::Result<()> {
    use spacelabel::model::display::{DisplayController, DisplayOptions};
    use spacelabel::sys::skylight::WindowServerSpaces;

    let options = DisplayOptions {
        uppercase: config.appearance.uppercase,
    };
    let controller = DisplayController::new(store, WindowServerSpaces, options);
    let state = controller.state();
    let label = state.space.and_then(|space| controller.store().get(space));
    let data = SpaceData::new(state, label);
    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        match data.space_id {
            Some(space) => println!("{space}\t{}", data.display_text),
            None => bail!("the window server did not report an active space"),
        }
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn current(_config: &Config, _store: Store, _json: bool) -> anyhow::Result<()> {
    bail!("reading the active space is only available on macOS")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config_path = cli.config.unwrap_or_else(config_file);
    let config = Config::load(&config_path)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!(config = %config_path.display(), "Launching overlay");
            let store = open_store(&config.storage)?;
            run(config, store)?;
        }
        Command::Current { json } => {
            let store = open_store(&config.storage)?;
            current(&config, store, json)?;
        }
        Command::List { json } => {
            let store = open_store(&config.storage)?;
            let labels = label_list(store.all().context("failed to read labels")?);
            if json {
                println!("{}", serde_json::to_string_pretty(&labels)?);
            } else {
                for data in labels {
                    println!("{}\t{}", data.space_id, data.label);
                }
            }
        }
        Command::Set { space, name } => {
            let store = open_store(&config.storage)?;
            match store.set(space, &name).context("failed to save label")? {
                Some(saved) => println!("{space}\t{saved}"),
                None => bail!("label must not be blank"),
            }
        }
        Command::Clear { space } => {
            let store = open_store(&config.storage)?;
            if !store.remove(space).context("failed to clear label")? {
                info!(%space, "Space had no label");
            }
        }
        Command::DefaultConfig => {
            let text = Config::default().to_toml().context("failed to serialize default config")?;
            print!("{text}");
        }
    }
    Ok(())
}
