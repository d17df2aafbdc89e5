//! coursectl CLI - browse and search an LMS course catalog
//!
//! This is the main entry point for the coursectl command-line tool, which provides:
//! - Paginated catalog listing and search (`browse`)
//! - Debounced interactive search (`interactive`)
//! - Learning object details (`show`)
//! - Configuration management (`config`)

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use coursectl_core::CourseConfig;

mod commands;
mod config;
mod render;
mod tracing_setup;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "coursectl",
    author,
    version,
    about = "Browse, filter and search an LMS course catalog from the terminal",
    long_about = "Cursor-paginated catalog browsing with type filters and debounced search. \
                  Results of superseded searches are dropped, so what you see always matches \
                  the last query you issued."
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    /// Suppress progress spinners (for script consumption)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List or search the catalog
    Browse(commands::browse::BrowseArgs),
    /// Search interactively; typed lines are debounced into searches
    Interactive(commands::interactive::InteractiveArgs),
    /// Show one learning object
    Show(commands::show::ShowArgs),
    /// Manage coursectl configuration (init, get, show, validate, path)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Load .env files: working directory first, then ~/.coursectl/.env.
/// Variables already set are never overwritten.
fn load_env() {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_path(CourseConfig::config_dir().join(".env"));
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();
    ui::init_quiet_mode(cli.quiet);

    match cli.command {
        Commands::Browse(args) => commands::run_browse(args, &CourseConfig::load()?).await?,
        Commands::Interactive(args) => {
            commands::run_interactive(args, &CourseConfig::load()?).await?
        }
        Commands::Show(args) => commands::run_show(args, &CourseConfig::load()?).await?,
        Commands::Config(args) => config::run_config(args)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
