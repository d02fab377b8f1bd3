//! Command-line interface.
//!
//! Without a subcommand the binary starts the server. Subcommands talk to a
//! running server:
//! - `status` - Check that the server is reachable
//! - `login` - Verify a username/password pair
//! - `materials ...` - List, show, add, edit, adjust and delete materials
//! - `config check` - Validate configuration file
//! - `tui` - Interactive terminal view (built with `--features tui`)

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::client::{ApiClient, ClientError};
use crate::inventory::{Material, MaterialFormData};
use crate::search::{display_date, SearchField};

#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(author, version, about = "A small inventory tracker for materials", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "stockroom.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to
    #[arg(long, env = "STOCKROOM_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Username for the API
    #[arg(short, long, env = "STOCKROOM_USERNAME")]
    pub username: Option<String>,

    /// Password for the API
    #[arg(short, long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the server is reachable
    Status,

    /// Check a username/password pair against the server
    Login,

    /// Material management commands
    #[command(subcommand)]
    Materials(MaterialsCommands),

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Interactive terminal view (requires the `tui` feature)
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum MaterialsCommands {
    /// List materials, optionally filtered
    List {
        /// Case-insensitive text to search for
        #[arg(short, long)]
        search: Option<String>,
        /// Field to search: name, category or lastUpdated
        #[arg(short, long, default_value = "name")]
        field: SearchField,
    },
    /// Show one material
    Show {
        /// Material ID
        id: String,
    },
    /// Add a material
    Add(MaterialArgs),
    /// Replace every editable field of a material
    Edit {
        /// Material ID
        id: String,
        #[command(flatten)]
        fields: MaterialArgs,
    },
    /// Change the quantity of a material
    Adjust {
        /// Material ID
        id: String,
        /// Add this (possibly negative) amount to the current quantity
        #[arg(long, allow_hyphen_values = true, conflicts_with = "set", required_unless_present = "set")]
        by: Option<i64>,
        /// Set the quantity to exactly this value
        #[arg(long, allow_hyphen_values = true)]
        set: Option<i64>,
    },
    /// Delete a material
    Delete {
        /// Material ID
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct MaterialArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, allow_hyphen_values = true)]
    pub quantity: i64,
    #[arg(long)]
    pub unit: String,
    #[arg(long)]
    pub category: String,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub reorder_point: i64,
    #[arg(long)]
    pub image_url: Option<String>,
}

impl From<MaterialArgs> for MaterialFormData {
    fn from(args: MaterialArgs) -> Self {
        Self {
            name: args.name,
            quantity: args.quantity,
            unit: args.unit,
            category: args.category,
            reorder_point: args.reorder_point,
            image_url: args.image_url,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Client with the CLI's credentials attached
pub fn authed_client(cli: &Cli) -> Result<ApiClient> {
    let (Some(username), Some(password)) = (cli.username.as_deref(), cli.password.as_deref())
    else {
        bail!(
            "Credentials required. Use --username and --password or set STOCKROOM_USERNAME and STOCKROOM_PASSWORD."
        );
    };

    Ok(ApiClient::new(&cli.api_url)
        .context("Failed to create HTTP client")?
        .with_credentials(username, password))
}

/// Turn client errors into actionable messages
fn explain(err: ClientError) -> anyhow::Error {
    match err {
        ClientError::Unauthorized => anyhow::anyhow!(
            "Authentication failed. Check --username/--password or STOCKROOM_USERNAME/STOCKROOM_PASSWORD."
        ),
        ClientError::NotFound(id) => anyhow::anyhow!("Material not found: {}", id),
        ClientError::Http(e) => {
            anyhow::Error::new(e).context("Failed to connect to server. Is stockroom running?")
        }
        other => other.into(),
    }
}

/// Run a CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Status) => cmd_status(cli).await,
        Some(Commands::Login) => cmd_login(cli).await,
        Some(Commands::Materials(cmd)) => cmd_materials(cli, cmd).await,
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        #[cfg(feature = "tui")]
        Some(Commands::Tui) => crate::tui::run(cli).await,
        #[cfg(not(feature = "tui"))]
        Some(Commands::Tui) => {
            bail!("This build has no terminal view. Rebuild with --features tui.")
        }
        None => {
            // No subcommand means start the server - this is handled in main.rs
            Ok(())
        }
    }
}

async fn cmd_status(cli: &Cli) -> Result<()> {
    let client = ApiClient::new(&cli.api_url).context("Failed to create HTTP client")?;

    println!("Connecting to {}...", client.base_url());
    let health = client.health().await.map_err(explain)?;

    println!();
    println!("=== Stockroom Server Status ===");
    println!();
    println!("Status:     [OK] {}", health);

    if cli.username.is_some() && cli.password.is_some() {
        let materials = authed_client(cli)?
            .list_materials(None)
            .await
            .map_err(explain)?;
        println!("Materials:  {}", materials.len());
    }

    println!();
    Ok(())
}

async fn cmd_login(cli: &Cli) -> Result<()> {
    let (Some(username), Some(password)) = (cli.username.as_deref(), cli.password.as_deref())
    else {
        bail!("Both --username and --password are required to log in.");
    };

    let client = ApiClient::new(&cli.api_url).context("Failed to create HTTP client")?;
    if client.login(username, password).await.map_err(explain)? {
        println!("[OK] Logged in as {}", username);
        Ok(())
    } else {
        bail!("Invalid username or password")
    }
}

async fn cmd_materials(cli: &Cli, cmd: &MaterialsCommands) -> Result<()> {
    let client = authed_client(cli)?;

    match cmd {
        MaterialsCommands::List { search, field } => {
            let search = search
                .as_deref()
                .filter(|q| !q.is_empty())
                .map(|q| (q, *field));
            let materials = client.list_materials(search).await.map_err(explain)?;
            print_material_table(&materials);
        }
        MaterialsCommands::Show { id } => {
            let material = client.get_material(id).await.map_err(explain)?;
            print_material(&material);
        }
        MaterialsCommands::Add(args) => {
            let material = client
                .create_material(&args.clone().into())
                .await
                .map_err(explain)?;
            println!("[OK] Material added");
            print_material(&material);
        }
        MaterialsCommands::Edit { id, fields } => {
            let material = client
                .update_material(id, &fields.clone().into())
                .await
                .map_err(explain)?;
            println!("[OK] Material updated");
            print_material(&material);
        }
        MaterialsCommands::Adjust { id, by, set } => {
            let quantity = match (by, set) {
                (_, Some(exact)) => *exact,
                (Some(delta), None) => {
                    let current = client.get_material(id).await.map_err(explain)?;
                    current.quantity.saturating_add(*delta)
                }
                (None, None) => bail!("Either --by or --set is required"),
            };
            let material = client.set_quantity(id, quantity).await.map_err(explain)?;
            println!(
                "[OK] {} now at {} {}",
                material.name, material.quantity, material.unit
            );
        }
        MaterialsCommands::Delete { id } => {
            client.delete_material(id).await.map_err(explain)?;
            println!("[OK] Material {} deleted", id);
        }
    }

    Ok(())
}

fn cmd_config_check(cli: &Cli) -> Result<()> {
    use crate::config::Config;

    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("A default configuration will be used when starting the server.");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("Server:");
            println!("  Listen:       {}", config.listen_addr());
            println!();
            println!("Auth:");
            println!("  Users:        {}", config.auth.users.len());
            println!();
            println!("Inventory:");
            println!(
                "  Demo Seed:    {}",
                if config.inventory.seed { "Enabled" } else { "Disabled" }
            );
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            println!(
                "  Metrics:      {}",
                if config.metrics.enabled { "Enabled" } else { "Disabled" }
            );
            println!();
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            bail!("Configuration validation failed")
        }
    }
}

fn print_material_table(materials: &[Material]) {
    if materials.is_empty() {
        println!("No materials found.");
        return;
    }

    println!();
    println!(
        "{:<36}  {:<24}  {:>10}  {:<10}  {:<14}  {:>8}  {:<10}",
        "ID", "NAME", "QUANTITY", "UNIT", "CATEGORY", "REORDER", "UPDATED"
    );
    println!("{}", "-".repeat(124));

    for m in materials {
        println!(
            "{:<36}  {:<24}  {:>10}  {:<10}  {:<14}  {:>8}  {:<10}",
            m.id,
            truncate(&m.name, 24),
            m.quantity,
            truncate(&m.unit, 10),
            truncate(&m.category, 14),
            m.reorder_point,
            display_date(&chrono::Local, &m.last_updated),
        );
    }

    println!();
}

fn print_material(m: &Material) {
    println!();
    println!("=== Material: {} ===", m.name);
    println!();
    println!("ID:            {}", m.id);
    println!("Quantity:      {} {}", m.quantity, m.unit);
    println!("Category:      {}", m.category);
    println!("Reorder Point: {}", m.reorder_point);
    println!("Last Updated:  {}", m.last_updated.to_rfc3339());
    if let Some(url) = &m.image_url {
        println!("Image:         {}", url);
    }
    println!();
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Bolts", 10), "Bolts");
        assert_eq!(truncate("Galvanized Steel Plates", 10), "Galvani...");
    }

    #[test]
    fn test_parse_adjust_by_negative() {
        let cli = Cli::try_parse_from(["stockroom", "materials", "adjust", "1", "--by", "-5"]).unwrap();
        match cli.command {
            Some(Commands::Materials(MaterialsCommands::Adjust { id, by, set })) => {
                assert_eq!(id, "1");
                assert_eq!(by, Some(-5));
                assert_eq!(set, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_adjust_requires_amount() {
        assert!(Cli::try_parse_from(["stockroom", "materials", "adjust", "1"]).is_err());
        assert!(Cli::try_parse_from([
            "stockroom", "materials", "adjust", "1", "--by", "1", "--set", "2"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_list_field() {
        let cli = Cli::try_parse_from([
            "stockroom", "materials", "list", "--search", "wood", "--field", "category",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Materials(MaterialsCommands::List { search, field })) => {
                assert_eq!(search.as_deref(), Some("wood"));
                assert_eq!(field, SearchField::Category);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_material_args_into_form_data() {
        let cli = Cli::try_parse_from([
            "stockroom", "materials", "add", "--name", "Bolts", "--quantity", "50", "--unit",
            "box", "--category", "Metal", "--reorder-point", "10",
        ])
        .unwrap();
        let Some(Commands::Materials(MaterialsCommands::Add(args))) = cli.command else {
            panic!("expected materials add");
        };

        let data = MaterialFormData::from(args);
        assert_eq!(data.name, "Bolts");
        assert_eq!(data.reorder_point, 10);
        assert_eq!(data.image_url, None);
    }
}
