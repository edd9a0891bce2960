// pimaco-labels: Print Pimaco 3x11 member labels for a parish roster

mod communities;
mod error;
mod layout;
mod metrics;
mod render;
mod roster;
mod spreadsheet;

use clap::{ArgGroup, Parser, Subcommand};
use communities::{default_registry_path, CommunityRegistry, Session};
use error::AppError;
use roster::Roster;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Print Pimaco 3x11 labels for a parish roster")]
struct Args {
    /// Community list file (defaults to the user config directory)
    #[arg(long, global = true)]
    communities_file: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the label PDF
    Generate(GenerateArgs),

    /// Manage the community list
    #[command(subcommand)]
    Communities(CommunityCommands),
}

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["excel", "manual", "entry"])))]
struct GenerateArgs {
    /// Spreadsheet with NOME, CÓDIGO and COMUNIDADE/CAPELA columns
    #[arg(short, long)]
    excel: Option<PathBuf>,

    /// Manual entry file with `position;NAME;code` lines ("-" reads stdin)
    #[arg(short, long)]
    manual: Option<PathBuf>,

    /// Manual entry line, may be repeated (e.g. "5; JOÃO DA SILVA; 1234")
    #[arg(long)]
    entry: Vec<String>,

    /// Community printed on manually entered labels
    #[arg(short, long)]
    community: Option<String>,

    /// Output filename (defaults to etiquetas_{timestamp}.pdf on the desktop)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Open the PDF with the system viewer when done
    #[arg(long)]
    open: bool,
}

#[derive(Subcommand, Debug)]
enum CommunityCommands {
    /// Show the registered communities
    List,
    /// Register a new community
    Add { name: String },
    /// Rename a community
    Rename { old: String, new: String },
    /// Delete a community
    Remove { name: String },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), AppError> {
    let registry_path = args
        .communities_file
        .clone()
        .unwrap_or_else(default_registry_path);

    match args.command {
        Commands::Generate(generate) => {
            // Spreadsheets carry their own community column.
            let mut session = if generate.excel.is_some() {
                Session::default()
            } else {
                Session::new(CommunityRegistry::load(&registry_path)?)
            };
            run_generate(&mut session, generate)
        }
        Commands::Communities(command) => {
            let mut session = Session::new(CommunityRegistry::load(&registry_path)?);
            run_communities(&mut session, command, &registry_path)
        }
    }
}

// ============================================================================
// Label Generation
// ============================================================================

fn run_generate(session: &mut Session, args: GenerateArgs) -> Result<(), AppError> {
    let roster = load_source(session, &args)?;
    info!(
        cells = roster.len(),
        pages = layout::page_count(roster.len()),
        "roster ready"
    );
    session.load_roster(roster);

    let output_path = args.output.unwrap_or_else(render::default_output_path);
    let roster = session.roster().ok_or(AppError::EmptyRoster)?;
    let summary = render::generate_pdf(roster, &output_path)?;

    println!("✓ Generated: {}", summary.path.display());
    println!("  Labels: {} ({} cells)", summary.labels, summary.cells);
    println!("  Pages: {}", summary.pages);

    if args.open {
        if let Err(e) = open_file(&summary.path) {
            warn!(error = %e, "could not launch PDF viewer");
            println!("  Could not open the file automatically, open it manually: {}", summary.path.display());
        }
    }

    Ok(())
}

fn load_source(session: &Session, args: &GenerateArgs) -> Result<Roster, AppError> {
    if let Some(path) = &args.excel {
        if args.community.is_some() {
            warn!("--community is ignored for spreadsheets, the COMUNIDADE column is used");
        }
        return spreadsheet::load_roster(path);
    }

    let community = session.registry.resolve(args.community.as_deref())?;
    let text = match &args.manual {
        Some(path) => read_manual_text(path)?,
        None => args.entry.join("\n"),
    };
    roster::parse_manual(&text, &community)
}

fn read_manual_text(path: &Path) -> Result<String, AppError> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn open_file(path: &Path) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    command.arg(path).spawn()?;
    Ok(())
}

// ============================================================================
// Community Management
// ============================================================================

fn run_communities(
    session: &mut Session,
    command: CommunityCommands,
    registry_path: &Path,
) -> Result<(), AppError> {
    match command {
        CommunityCommands::List => {
            for (idx, name) in session.registry.names().iter().enumerate() {
                println!("{:>3}. {}", idx + 1, name);
            }
            return Ok(());
        }
        CommunityCommands::Add { name } => {
            let added = session.registry.add(&name)?;
            println!("✓ Added: {}", added);
        }
        CommunityCommands::Rename { old, new } => {
            session.rename_community(&old, &new)?;
            println!("✓ Renamed: {} -> {}", old.trim().to_uppercase(), new.trim().to_uppercase());
        }
        CommunityCommands::Remove { name } => {
            let removed = session.registry.remove(&name)?;
            println!("✓ Removed: {}", removed);
        }
    }

    session.registry.save(registry_path)
}
