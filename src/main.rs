mod book;
mod config;
mod editor;
mod error;
mod fragment;
mod ini;
mod model;
mod picker;
mod query;
mod search;
mod ui;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use book::{AbookFile, EditOutcome};
use config::Config;
use editor::ExternalEditor;
use error::AbookError;
use model::{AddressbookData, Record, RecordStore};
use query::Query;

const STDIN_PATH: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "abook-parser", version, about = "Read, convert and edit abook addressbooks")]
struct Cli {
    /// Configuration file (defaults to <config dir>/abook-parser/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse an addressbook and print it as abook text or JSON
    Parse(ParseArgs),
    /// Pick one contact and edit it in $EDITOR
    Edit(EditArgs),
    /// Print one contact without editing it
    Find(FindArgs),
    /// List field names by how many contacts use them
    Fields(FieldsArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputType {
    Abook,
    Json,
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputType::Abook)]
    output_type: OutputType,

    /// Sort contacts by this field before printing
    #[arg(short = 'k', long)]
    sort_key: Option<String>,

    /// Write to this file instead of standard output
    #[arg(long, value_name = "PATH")]
    output_file: Option<PathBuf>,

    /// Addressbook file, or `-` for standard input
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(Args, Debug)]
struct SelectArgs {
    /// Select by `field:pattern` (or `field=pattern`) instead of interactively
    #[arg(short, long)]
    query: Option<String>,

    /// Match the query pattern case-sensitively
    #[arg(long, default_value_t = false)]
    case_sensitive: bool,
}

#[derive(Args, Debug)]
struct EditArgs {
    #[command(flatten)]
    select: SelectArgs,

    /// Addressbook file (defaults to the configured addressbook)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FindArgs {
    #[command(flatten)]
    select: SelectArgs,

    /// Print the contact as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Addressbook file (defaults to the configured addressbook)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FieldsArgs {
    /// Addressbook file, or `-` for standard input
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Err(err) => match err.downcast_ref::<AbookError>() {
            // Nothing matched or the user backed out: report and exit cleanly.
            Some(core) if core.is_benign() => {
                eprintln!("{}", core);
                Ok(())
            }
            _ => Err(err),
        },
        ok => ok,
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    if let Some(path) = &config.config_path {
        log::info!("using configuration from {}", path.display());
    }

    match cli.command {
        Command::Parse(args) => handle_parse(args),
        Command::Edit(args) => handle_edit(args, &config),
        Command::Find(args) => handle_find(args, &config),
        Command::Fields(args) => handle_fields(args),
    }
}

fn handle_parse(args: ParseArgs) -> Result<()> {
    let text = read_input(&args.file)?;
    let mut data = AddressbookData::parse(&text)
        .with_context(|| format!("failed to parse addressbook from {}", describe(&args.file)))?;

    if let Some(sort_key) = &args.sort_key {
        data.sort(sort_key);
    }

    let rendered = match args.output_type {
        OutputType::Abook => data.serialize(),
        OutputType::Json => data.to_json()?,
    };
    write_output(args.output_file.as_deref(), &rendered)
}

fn handle_edit(args: EditArgs, config: &Config) -> Result<()> {
    let path = addressbook_path(args.file, config)?;
    let mut book = AbookFile::load(&path)?;
    let (id, original) = select(&book, &args.select, config)?;

    let mut editor = ExternalEditor::from_config(config.editor.as_ref());
    match book.edit_record(id, &original, &mut editor)? {
        EditOutcome::Updated => println!("Updated contact {} in {}", id, book.path().display()),
        EditOutcome::Unchanged => println!("No changes to contact {}", id),
        EditOutcome::Cancelled => println!("Edit of contact {} cancelled", id),
    }
    Ok(())
}

fn handle_find(args: FindArgs, config: &Config) -> Result<()> {
    let path = addressbook_path(args.file, config)?;
    let book = AbookFile::load(&path)?;
    let (id, record) = select(&book, &args.select, config)?;

    let rendered = if args.json {
        let mut single = RecordStore::new();
        single.insert(id, record);
        model::to_pretty_json(&single)?
    } else {
        fragment::render(id, &record).trim_start().to_string()
    };
    write_output(None, &rendered)
}

fn handle_fields(args: FieldsArgs) -> Result<()> {
    let text = read_input(&args.file)?;
    let data = AddressbookData::parse(&text)
        .with_context(|| format!("failed to parse addressbook from {}", describe(&args.file)))?;

    let mut out = String::new();
    for (field, count) in data.field_frequencies() {
        out.push_str(&format!("{}\t{}\n", field, count));
    }
    write_output(None, &out)
}

/// Resolve a record either through the query engine or the picker.
fn select(book: &AbookFile, args: &SelectArgs, config: &Config) -> Result<(u32, Record)> {
    match &args.query {
        Some(raw) => {
            let query = Query::parse(raw, !args.case_sensitive)?;
            let (id, record) = book.data.find(&query)?;
            Ok((id, record.clone()))
        }
        None => {
            let mut picker = picker::from_config(&config.picker);
            book.find_interactive(picker.as_mut())
        }
    }
}

fn addressbook_path(file: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    let path = file.unwrap_or_else(|| config.addressbook.clone());
    if path.as_os_str() == STDIN_PATH {
        bail!("an addressbook file is required; standard input cannot be written back");
    }
    Ok(path)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == STDIN_PATH {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read addressbook from standard input")?;
        return Ok(text);
    }
    let path = config::expand_tilde(path);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read addressbook at {}", path.display()))
}

fn describe(path: &Path) -> String {
    if path.as_os_str() == STDIN_PATH {
        "standard input".to_string()
    } else {
        path.display().to_string()
    }
}

/// Write `text` to `path`, or to standard output, ending non-empty output
/// with a newline.
fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    let mut text = text.to_string();
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }

    match path {
        Some(path) => fs::write(path, text)
            .with_context(|| format!("failed to write output to {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
