mod cli;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};

use tessera_core::kernel::constants::DEFAULT_SETTINGS_FILE;
use tessera_core::kernel::Result;
use tessera_core::repository::Artifact;
use tessera_core::store::archive::pack_directory;
use tessera_core::store::local::write_configuration_dir;
use tessera_core::store::{StoreError, METADATA_FILE};
use tessera_core::{ConfigId, ConfigurationData, ConfigurationStore, Kernel, KernelError, KernelSettings, LocalConfigStore};

use crate::cli::{CliArgs, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(&args)?;

    match args.command {
        Commands::New {
            dir,
            id,
            parent,
            classpath,
            dependencies,
        } => {
            let mut data = ConfigurationData::new(id.parse()?);
            if let Some(parent) = parent {
                data = data.with_parent(parent.parse()?);
            }
            for entry in classpath {
                data = data.with_classpath(entry);
            }
            for dependency in dependencies {
                data = data.with_dependency(dependency.parse::<Artifact>()?);
            }
            write_configuration_dir(&dir, &data)?;
            println!("Created configuration {} in {}", data.id, dir.display());
        }
        Commands::Pack { dir, out } => {
            if !dir.join(METADATA_FILE).is_file() {
                return Err(StoreError::FileNotFound(dir.join(METADATA_FILE)).into());
            }
            pack_directory(&dir, &out)?;
            println!("Packed {} into {}", dir.display(), out.display());
        }
        Commands::Install { archive } => {
            let store = open_store(&settings, true)?;
            let id = store.install(&archive)?;
            println!("Installed {} into slot {}", id, store.slot(&id).unwrap_or_default());
        }
        Commands::Uninstall { id } => {
            let store = open_store(&settings, false)?;
            let id: ConfigId = id.parse()?;
            store.uninstall(&id)?;
            println!("Uninstalled {}", id);
        }
        Commands::List {} => {
            let store = open_store(&settings, false)?;
            let installed = store.list();
            if installed.is_empty() {
                println!("No configurations installed.");
            }
            for id in installed {
                let data = store.configuration(&id)?;
                match &data.parent {
                    Some(parent) => println!("  - {} (parent {})", id, parent),
                    None => println!("  - {}", id),
                }
            }
        }
        Commands::Start { ids } => {
            let ids: Vec<ConfigId> = if ids.is_empty() {
                settings.start.clone()
            } else {
                ids.iter().map(|id| id.parse::<ConfigId>()).collect::<std::result::Result<_, _>>()?
            };
            if ids.is_empty() {
                return Err(KernelError::other("no configurations to start"));
            }
            start_configurations(&settings, &ids).await?;
        }
    }
    Ok(())
}

/// Settings from `--settings`, else `./tessera.toml` when present, else
/// defaults. `--store` wins over the file.
fn load_settings(args: &CliArgs) -> Result<KernelSettings> {
    let default_file = PathBuf::from(DEFAULT_SETTINGS_FILE);
    let mut settings = match &args.settings {
        Some(path) => KernelSettings::load(path)?,
        None if default_file.is_file() => KernelSettings::load(&default_file)?,
        None => KernelSettings::default(),
    };
    if let Some(store) = &args.store {
        settings.store_root = Some(store.clone());
    }
    debug!("Using settings {:?}", settings);
    Ok(settings)
}

fn store_root(settings: &KernelSettings) -> Result<&Path> {
    settings
        .store_root
        .as_deref()
        .ok_or_else(|| KernelError::other("no configuration store given; use --store or a settings file"))
}

fn open_store(settings: &KernelSettings, create: bool) -> Result<LocalConfigStore> {
    let root = store_root(settings)?;
    if create && !root.exists() {
        fs::create_dir_all(root).map_err(|e| StoreError::io(e, "create_dir_all", root.to_path_buf()))?;
        info!("Created configuration store at {}", root.display());
    }
    LocalConfigStore::open(root)
}

async fn start_configurations(settings: &KernelSettings, ids: &[ConfigId]) -> Result<()> {
    store_root(settings)?;
    let kernel = Kernel::from_settings(settings)?;

    let mut started = Vec::with_capacity(ids.len());
    let mut outcome = Ok(());
    for id in ids {
        let step = match kernel.load_configuration(id) {
            Ok(_) => kernel.start_configuration(id).await,
            Err(e) => Err(e),
        };
        match step {
            Ok(()) => {
                let members = kernel.configuration_members(id)?;
                println!("Started {} with {} component(s)", id, members.len());
                for member in members {
                    println!("  - {}", member);
                }
                started.push(id.clone());
            }
            Err(e) => {
                outcome = Err(e);
                if kernel.configuration(id).is_some() {
                    started.push(id.clone());
                }
                break;
            }
        }
    }

    for id in started.iter().rev() {
        if let Err(e) = kernel.unload_configuration(id).await {
            log::warn!("Unable to unload {}: {}", id, e);
            continue;
        }
        println!("Unloaded {}", id);
    }
    outcome
}
