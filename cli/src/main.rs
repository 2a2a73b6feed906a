use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use record_opt::{ArgumentSpec, RecordParser, SchemaDocument};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "record-opt")]
#[command(about = "Compile record schema documents into command-line parsers")]
#[command(version)]
struct Cli {
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse tokens against a schema document and print the reconstructed records.
    Parse(ParseArgs),
    /// Print the resolved argument specifications of a schema document.
    Inspect(InspectArgs),
    /// Print the usage text generated for a schema document.
    Usage(UsageArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Schema document (YAML, or JSON with a .json extension).
    #[arg(long)]
    schema: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Tokens to parse; pass them after `--`.
    #[arg(last = true, allow_hyphen_values = true)]
    tokens: Vec<OsString>,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Schema document (YAML, or JSON with a .json extension).
    #[arg(long)]
    schema: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct UsageArgs {
    /// Schema document (YAML, or JSON with a .json extension).
    #[arg(long)]
    schema: PathBuf,
    /// Show the usage of this sub-command instead of the top level.
    #[arg(long)]
    command: Option<String>,
}

/// Registered arguments of one parser level, with its sub-commands.
#[derive(Debug, Serialize)]
struct ParserReport<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<&'a str>,
    arguments: Vec<&'a ArgumentSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    commands: Vec<ParserReport<'a>>,
}

impl<'a> ParserReport<'a> {
    fn new(parser: &'a RecordParser) -> Self {
        Self {
            name: parser.name(),
            root: parser.root().map(|schema| schema.name()),
            arguments: parser.argument_specs().collect(),
            commands: parser
                .command_names()
                .filter_map(|name| parser.subcommand(name))
                .map(ParserReport::new)
                .collect(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Inspect(args) => run_inspect(args),
        Command::Usage(args) => run_usage(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn load_parser(path: &Path) -> Result<RecordParser, String> {
    let doc = SchemaDocument::load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?;
    let parser = RecordParser::from_document(&doc)
        .map_err(|err| format!("Invalid schema '{}': {err}", path.display()))?;
    info!(
        schema = %path.display(),
        prog = parser.name(),
        commands = parser.command_names().count(),
        "loaded schema document"
    );
    Ok(parser)
}

fn render<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|err| format!("Failed to serialize JSON: {err}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|err| format!("Failed to serialize YAML: {err}"))
        }
    }
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let parser = load_parser(&args.schema)?;
    debug!(tokens = args.tokens.len(), "parsing tokens");
    // Usage errors, help and version requests terminate here with clap's status.
    let outcome = parser.parse_args_from(args.tokens);
    println!("{}", render(&outcome, args.format)?);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<(), String> {
    let parser = load_parser(&args.schema)?;
    println!("{}", render(&ParserReport::new(&parser), args.format)?);
    Ok(())
}

fn run_usage(args: UsageArgs) -> Result<(), String> {
    let parser = load_parser(&args.schema)?;
    let target = match &args.command {
        Some(name) => parser
            .subcommand(name)
            .ok_or_else(|| format!("Unknown command '{name}'"))?,
        None => &parser,
    };
    print!("{}", target.command().render_help());
    Ok(())
}
