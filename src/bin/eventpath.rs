use clap::{Parser, Subcommand};
use eventpath::compiler::core::Compiler;
use eventpath::compiler::loader::load_document;
use eventpath::config::Settings;
use eventpath::dsl::InterruptSpec;
use eventpath::runtime::catalogue::Catalogue;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Interpreter settings (YAML); built-in defaults when omitted
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a node document
    Check {
        /// Path to the node document (JSON or YAML)
        file: PathBuf,
    },

    /// Print the resolved actions and interrupts for a node / event
    Plan {
        file: PathBuf,

        #[arg(long)]
        node: String,

        #[arg(long, default_value = "")]
        event: String,
    },

    /// Resolve an interrupt expression such as "@popups+CloseTip"
    Interrupts {
        file: PathBuf,

        expr: String,
    },
}

fn compile(file: &Path, settings: &Settings) -> Result<Catalogue> {
    let document = load_document(file)?;
    let catalogue = Compiler::new(settings.catalogue.clone()).compile(document)?;
    Ok(catalogue)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Check { file } => {
            info!("Loading node document from: {:?}", file);
            let catalogue = compile(&file, &settings)?;
            let mut types: Vec<&str> = catalogue.node_types().collect();
            types.sort_unstable();
            debug!(?types, "Node types");
            println!(
                "ok: {} node types, {} events",
                catalogue.len(),
                catalogue.event_count()
            );
        }
        Commands::Plan { file, node, event } => {
            let catalogue = compile(&file, &settings)?;
            let plan = catalogue.resolve_actions(&node, &event)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Interrupts { file, expr } => {
            let catalogue = compile(&file, &settings)?;
            let ids = catalogue.resolve_interrupts(&InterruptSpec::Expr(expr));
            println!("{}", serde_json::to_string_pretty(&ids)?);
        }
    }

    Ok(())
}
