use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coursectl_core::CourseConfig;

const TEMPLATE: &str = include_str!("../../.coursectl-config.template.toml");

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a starter config to ~/.coursectl/config.toml
    Init(InitArgs),
    /// Get a config value by dot-notation key (e.g., "lms.page_limit")
    Get(GetArgs),
    /// Show the effective configuration (token masked)
    Show,
    /// Validate the configuration
    Validate,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Dot-notation key (e.g., "browse.debounce_ms")
    pub key: String,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init(args) => run_init(args),
        ConfigCommands::Get(args) => run_get(args),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Validate => run_validate(),
        ConfigCommands::Path => run_path(),
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    let config_path = CourseConfig::config_path();

    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&config_path, TEMPLATE)
        .context(format!("Failed to write config file: {:?}", config_path))?;

    println!("✅ Created config at: {:?}", config_path);
    println!("\nNext steps:");
    println!("  1. Edit the config: $EDITOR {:?}", config_path);
    println!("  2. Export COURSECTL_TOKEN or put it in ~/.coursectl/.env");
    println!("  3. Run: coursectl config validate");

    Ok(())
}

/// Effective config as TOML with the token replaced by a placeholder
fn masked(config: &CourseConfig) -> CourseConfig {
    let mut config = config.clone();
    if config.lms.token.is_some() {
        config.lms.token = Some("********".to_string());
    }
    config
}

fn run_show() -> Result<()> {
    let config = masked(&CourseConfig::load()?);
    let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config to TOML")?;
    println!("{}", toml_str);
    Ok(())
}

fn run_get(args: GetArgs) -> Result<()> {
    let config = masked(&CourseConfig::load()?);
    println!("{}", config_value(&config, &args.key)?);
    Ok(())
}

fn run_validate() -> Result<()> {
    println!("🔍 Validating configuration...");

    let path = CourseConfig::config_path();
    if path.exists() {
        println!("   ✓ Found {}", path.display());
    } else {
        println!("   ⚠ No config file at {}; using defaults", path.display());
    }

    let config = CourseConfig::load()?;
    println!("   ✓ Config loaded successfully");
    println!("   LMS: {}", config.lms.base_url);

    if config.lms.token.is_none() {
        println!("\n⚠️  No LMS token configured.");
        println!("   Set COURSECTL_TOKEN or lms.token = \"${{COURSECTL_TOKEN}}\"");
    }

    println!("\n✅ Configuration valid!");
    Ok(())
}

fn run_path() -> Result<()> {
    println!("{}", CourseConfig::config_path().display());
    Ok(())
}

/// Look up a dot-notation key in the serialized config
fn config_value(config: &CourseConfig, key: &str) -> Result<String> {
    let root = toml::Value::try_from(config).context("Failed to serialize config")?;

    let value = key
        .split('.')
        .try_fold(&root, |value, part| value.get(part))
        .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;

    Ok(match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
