use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use module_wizard::app::App;
use module_wizard::config::{Config, StoreBackend};
use module_wizard::logging;
use module_wizard::store;
use module_wizard::ui::install_panic_hook;
use module_wizard::wizard::templates::metadata_document;
use module_wizard::wizard::{ModuleWizard, WizardAction};

#[derive(Parser)]
#[command(name = "module-wizard")]
#[command(about = "Step-by-step wizard for adding anonymization modules to a module repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a module without the interactive wizard
    Create {
        /// Module name
        name: String,

        /// Algorithm type (e.g. generalization)
        #[arg(short, long, default_value = "")]
        algorithm_type: String,

        /// Module category (e.g. tabular)
        #[arg(short = 'k', long, default_value = "")]
        category: String,

        /// Python source file; must declare the module's POST route
        #[arg(long)]
        source: Option<PathBuf>,

        /// Metadata JSON file (defaults to the generated template)
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Dockerfile to include
        #[arg(long)]
        dockerfile: Option<PathBuf>,

        /// requirements.txt to include
        #[arg(long)]
        requirements: Option<PathBuf>,
    },

    /// Print the metadata template for a module name
    Metadata {
        /// Module name
        name: String,
    },

    /// List modules in the configured store
    List,

    /// Write a project config file to .module-wizard/config.toml
    Init {
        /// Store GitHub repository (owner/repo); selects the GitHub backend
        #[arg(long)]
        repo: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // Determine if we're running in TUI mode (no subcommand)
    let is_tui_mode = cli.command.is_none();

    // Initialize logging (file-based for TUI, stderr for CLI)
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Create {
            name,
            algorithm_type,
            category,
            source,
            metadata,
            dockerfile,
            requirements,
        }) => {
            let files = InputFiles {
                source,
                metadata,
                dockerfile,
                requirements,
            };
            cmd_create(&config, name, algorithm_type, category, files).await?;
        }
        Some(Commands::Metadata { name }) => {
            cmd_metadata(&name)?;
        }
        Some(Commands::List) => {
            cmd_list(&config).await?;
        }
        Some(Commands::Init { repo, force }) => {
            cmd_init(config, repo, force)?;
        }
        None => {
            // No subcommand = launch the TUI
            run_tui(config, logging_handle.log_file_path).await?;
        }
    }

    Ok(())
}

async fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    let store = store::from_config(&config)?;
    install_panic_hook();

    let mut app = App::new(config, store);
    let result = app.run().await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

/// Optional file contents for the headless create command
struct InputFiles {
    source: Option<PathBuf>,
    metadata: Option<PathBuf>,
    dockerfile: Option<PathBuf>,
    requirements: Option<PathBuf>,
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn cmd_create(
    config: &Config,
    name: String,
    algorithm_type: String,
    category: String,
    files: InputFiles,
) -> Result<()> {
    let store = store::from_config(config)?;
    let mut wizard = ModuleWizard::new();

    // Step 1
    wizard.dispatch(WizardAction::SetModuleName(name))?;
    wizard.dispatch(WizardAction::SetAlgorithmType(algorithm_type))?;
    wizard.dispatch(WizardAction::SetModuleCategory(category))?;
    wizard.advance_with_validation()?;

    // Step 2 starts from the route declaration
    if let Some(path) = &files.source {
        wizard.dispatch(WizardAction::SetSourceCode(read_input(path)?))?;
    }
    wizard.advance_with_validation()?;

    if let Some(path) = &files.metadata {
        wizard.dispatch(WizardAction::SetMetadataDocument(read_input(path)?))?;
    }
    wizard.advance();

    if let Some(path) = &files.dockerfile {
        wizard.dispatch(WizardAction::SetContainerSpec(read_input(path)?))?;
    }
    wizard.advance();

    if let Some(path) = &files.requirements {
        wizard.dispatch(WizardAction::SetDependencySpec(read_input(path)?))?;
    }

    match wizard.submit(store.as_ref()).await {
        Ok(created) => {
            println!("{}", created.message());
            Ok(())
        }
        Err(e) => {
            if let Some(hint) = e.hint() {
                eprintln!("{hint}");
            }
            Err(e.into())
        }
    }
}

fn cmd_metadata(name: &str) -> Result<()> {
    module_wizard::wizard::validate_module_name(name)?;
    println!("{}", metadata_document(name));
    Ok(())
}

async fn cmd_list(config: &Config) -> Result<()> {
    let store = store::from_config(config)?;
    let modules = store.list().await?;

    if modules.is_empty() {
        println!("No modules in {} store", store.name());
        return Ok(());
    }

    println!("Modules ({})", modules.len());
    println!("{}", "─".repeat(40));
    for module in modules {
        println!("{module}");
    }
    Ok(())
}

fn cmd_init(mut config: Config, repo: Option<String>, force: bool) -> Result<()> {
    let path = Config::project_config_path();
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(repo) = repo {
        if store::parse_repo_string(&repo).is_none() {
            bail!("Invalid repository '{repo}', expected owner/repo");
        }
        config.store.backend = StoreBackend::GitHub;
        config.store.github.repo = repo;
    }

    let written = config.save()?;
    println!("Wrote {}", written.display());
    Ok(())
}
