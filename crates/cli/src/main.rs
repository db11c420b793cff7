mod sheet_file;

use anyhow::{Context, Result};
use argsheet_argparse::{DEFAULT_LINE_WIDTH, ParseOutcome, reflow};
use argsheet_schema::ParseReport;
use clap::{Parser, Subcommand};
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};
use tracing_subscriber::{EnvFilter, fmt};

use crate::sheet_file::{load_sheet, write_example_sheet};

#[derive(Parser)]
#[command(name = "argsheet")]
#[command(version, about = "Declarative argument parsing for shell scripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example argsheet.json
    Init(InitArgs),

    /// Parse arguments against a sheet and print the result as JSON
    Parse(ParseArgs),

    /// Print the help text described by a sheet
    ShowHelp(SheetArgs),

    /// Print the usage block described by a sheet
    Usage(SheetArgs),

    /// Re-wrap text to a margin and line width
    Reflow(ReflowArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Directory to write the sheet into (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Replace an existing sheet
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct SheetArgs {
    /// Path to the argument sheet (default: ./argsheet.json)
    #[arg(short, long, value_name = "FILE")]
    sheet: Option<PathBuf>,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the argument sheet (default: ./argsheet.json)
    #[arg(short, long, value_name = "FILE")]
    sheet: Option<PathBuf>,

    /// Index of the first argument to parse; earlier ones name the program
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Arguments to parse, given after `--`
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,
}

#[derive(Parser)]
struct ReflowArgs {
    /// Text file to reflow (default: stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Spaces prefixed to every line
    #[arg(short, long, default_value_t = 0)]
    margin: usize,

    /// Line width including the margin; 0 disables wrapping
    #[arg(short, long, default_value_t = DEFAULT_LINE_WIDTH)]
    width: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Parse(args) => parse(args),
        Commands::ShowHelp(args) => show_help(args),
        Commands::Usage(args) => usage(args),
        Commands::Reflow(args) => reflow_text(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let dest = write_example_sheet(&dir, args.force)?;

    eprintln!("Created: {}", dest.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {} to declare your options", dest.display());
    eprintln!("  2. Run: argsheet parse --sheet {} -- \"$@\"", dest.display());

    Ok(())
}

fn parse(args: ParseArgs) -> Result<()> {
    let loaded = load_sheet(args.sheet.as_deref())?;
    // A help token prints help and exits with status 0.
    let mut parser = loaded.sheet.parser(true)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = parser
        .parse_to(args.args.as_slice(), args.start, &mut out)
        .with_context(|| format!("failed to parse arguments against {}", loaded.path.display()))?;

    match outcome {
        ParseOutcome::HelpShown => {
            tracing::debug!("help shown, skipping report");
        }
        ParseOutcome::Parsed => {
            let report = ParseReport::collect(&parser);
            let json = serde_json::to_string_pretty(&report)?;
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}

fn show_help(args: SheetArgs) -> Result<()> {
    let loaded = load_sheet(args.sheet.as_deref())?;
    let parser = loaded.sheet.parser(false)?;
    print!("{}", parser.help_text());
    Ok(())
}

fn usage(args: SheetArgs) -> Result<()> {
    let loaded = load_sheet(args.sheet.as_deref())?;
    let parser = loaded.sheet.parser(false)?;
    parser.print_usage().context("failed to write usage")?;
    Ok(())
}

fn reflow_text(args: ReflowArgs) -> Result<()> {
    let text = match &args.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => io::read_to_string(io::stdin()).context("failed to read stdin")?,
    };
    println!("{}", reflow(&text, args.margin, args.width));
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
