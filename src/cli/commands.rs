//! Command dispatch
//!
//! The snapshot is loaded explicitly before an inventory command runs and
//! saved explicitly afterwards when the command changed something.

use std::io;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{InventoryService, SnapshotService};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_dir, local_config_path, Settings};
use crate::domain::{format_price, Product, TreeRender};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let container = build_container(cli)?;

    if let Commands::Config { command } = command {
        return execute_config(cli, &container, command);
    }

    let settings = &container.settings;
    let snapshot = container.snapshot_service();
    let report = snapshot.load(&settings.data_file, settings.on_duplicate)?;
    for id in &report.skipped {
        output::warning(&format!(
            "duplicate product id {} in {} was skipped",
            id,
            settings.data_file.display()
        ));
    }
    let mut inventory = report.inventory;

    execute_inventory(command, &mut inventory, &snapshot, settings)?;

    if command.is_mutating() && inventory.is_dirty() {
        if settings.autosave {
            snapshot.save(&inventory, &settings.data_file)?;
            inventory.mark_clean();
        } else {
            debug!("autosave disabled, changes discarded");
        }
    }
    Ok(())
}

/// Load settings and apply command line overrides.
fn build_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let mut settings = Settings::load(cli.config_dir.as_deref())?;
    if let Some(data_file) = &cli.data_file {
        settings = settings.with_data_file(data_file.clone());
    }
    if let Some(policy) = cli.on_duplicate {
        settings.on_duplicate = policy;
    }
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

#[instrument(level = "debug", skip(inventory, snapshot, settings))]
fn execute_inventory(
    command: &Commands,
    inventory: &mut InventoryService,
    snapshot: &SnapshotService,
    settings: &Settings,
) -> CliResult<()> {
    match command {
        Commands::List => _list(inventory),
        Commands::Find { id } => {
            let product = inventory.find(*id).ok_or(CliError::NotFound(*id))?;
            print_products(&[product]);
            Ok(())
        }
        Commands::Add {
            id,
            name,
            price,
            quantity,
        } => {
            let product = Product::parse(*id, name, price, *quantity)?;
            inventory.add(product)?;
            output::success(&format!("added product {}", id));
            Ok(())
        }
        Commands::Remove { id } => {
            if !inventory.remove(*id) {
                return Err(CliError::NotFound(*id));
            }
            output::success(&format!("removed product {}", id));
            Ok(())
        }
        Commands::Tree => {
            output::info(&inventory.tree().to_tree_string());
            Ok(())
        }
        Commands::Stats => _stats(inventory),
        Commands::Check => {
            inventory.tree().check_invariants()?;
            output::success(&format!(
                "tree is balanced ({} products, height {})",
                inventory.len(),
                inventory.tree().height()
            ));
            Ok(())
        }
        Commands::Import { file } => {
            let report = snapshot.import(inventory, file, settings.on_duplicate)?;
            for id in &report.skipped {
                output::warning(&format!("duplicate product id {} was skipped", id));
            }
            output::action("Imported", &format!("{} products from {}", report.imported, file.display()));
            Ok(())
        }
        Commands::Export { file } => {
            let written = snapshot.save(inventory, file)?;
            output::action("Exported", &format!("{} products to {}", written, file.display()));
            Ok(())
        }
        // Handled before the snapshot is loaded
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

fn _list(inventory: &InventoryService) -> CliResult<()> {
    let products = inventory.list();
    output::header(&format!("Inventory ({} products)", products.len()));
    print_products(&products);
    Ok(())
}

fn _stats(inventory: &InventoryService) -> CliResult<()> {
    let stats = inventory.stats();
    output::header("Inventory statistics");
    output::detail(&format!("products:    {}", stats.count));
    output::detail(&format!("total units: {}", stats.total_units));
    output::detail(&format!("total value: {}", format_price(stats.total_value_cents)));
    output::detail(&format!("tree height: {}", stats.height));
    let root = stats
        .root
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    output::detail(&format!("root id:     {}", root));
    Ok(())
}

fn print_products(products: &[&Product]) {
    output::info(&format!(
        "{:>8}  {:<24}  {:>12}  {:>8}",
        "ID", "NAME", "PRICE", "QTY"
    ));
    for product in products {
        output::info(&format!(
            "{:>8}  {:<24}  {:>12}  {:>8}",
            product.id,
            product.name,
            format_price(u128::from(product.price_cents)),
            product.quantity
        ));
    }
}

fn execute_config(cli: &Cli, container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("Global", &path.display()),
                None => output::action("Global", &"(no config directory)"),
            }
            let local_dir = local_config_dir(cli.config_dir.as_deref());
            output::action("Local", &local_config_path(local_dir).display());
            output::action("Data", &container.settings.data_file.display());
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path()
                    .ok_or_else(|| CliError::InvalidArgs("no global config directory".to_string()))?
            } else {
                local_config_path(local_config_dir(cli.config_dir.as_deref()))
            };
            if container.fs.exists(&path) {
                return Err(CliError::InvalidArgs(format!(
                    "config file already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .map_err(|e| InfraError::io(format!("create {}", path.display()), e))?;
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
    }
}
