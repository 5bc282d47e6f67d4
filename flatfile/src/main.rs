//! Flatfile CLI - read, inspect and rewrite delimited files
//!
//! ```bash
//! flatfile parse input.csv --header            # Rows as JSON objects
//! flatfile schema input.csv --header           # Resolved schema as JSON
//! flatfile convert input.csv out.tsv --to-delimiter tab
//! ```
//!
//! Options are layered: defaults, then `--options` JSON, then `FLATFILE_*`
//! environment variables (a `.env` file is loaded first), then flags.

use clap::{Args, Parser, Subcommand};
use flatfile::config::{self, ENV_DELIMITER};
use flatfile::logs::{
    log_error, log_info, log_info_indent, log_success, log_warning, Component, LogLevel,
    LOG_BROADCASTER,
};
use flatfile::{
    decode_content, detect_delimiter, detect_encoding, populate, MemoryTable, Options, QuoteStyle,
    Reader, Schema, Writer,
};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "flatfile")]
#[command(about = "Read, inspect and rewrite delimited flat files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Only report warnings and errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Args)]
struct InputArgs {
    /// Input file
    input: PathBuf,

    /// Options JSON file
    #[arg(long)]
    options: Option<PathBuf>,

    /// Schema JSON file (default: from header or record width)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Field delimiter, `tab` allowed (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Quote character
    #[arg(short, long)]
    quote: Option<char>,

    /// First record holds column names
    #[arg(long)]
    header: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and output its rows as JSON
    Parse {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the resolved schema as JSON
    Schema {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Rewrite a file with another dialect
    Convert {
        #[command(flatten)]
        input: InputArgs,

        /// Output file
        output: PathBuf,

        /// Output options JSON file (default: same as input)
        #[arg(long)]
        to_options: Option<PathBuf>,

        /// Output delimiter, `tab` allowed
        #[arg(long)]
        to_delimiter: Option<String>,

        /// Quote every output field
        #[arg(long)]
        quote_all: bool,

        /// Drop the header from the output
        #[arg(long)]
        no_header: bool,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    LOG_BROADCASTER.set_echo(Some(if cli.quiet {
        LogLevel::Warning
    } else {
        LogLevel::Info
    }));

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),
        Commands::Schema { input } => cmd_schema(&input),
        Commands::Convert {
            input,
            output,
            to_options,
            to_delimiter,
            quote_all,
            no_header,
        } => cmd_convert(
            &input,
            &output,
            to_options.as_deref(),
            to_delimiter.as_deref(),
            quote_all,
            no_header,
        ),
    };

    if let Err(e) = result {
        log_error(Component::Cli, format!("Error: {}", e));
        std::process::exit(1);
    }
}

/// Options from `--options`, the environment and flags, in that order.
fn load_options(args: &InputArgs) -> CliResult<Options> {
    let base = match &args.options {
        Some(path) => Options::from_json(&fs::read_to_string(path)?)?,
        None => Options::new(),
    };
    let mut options = base.apply_vars(|var| std::env::var(var).ok())?;
    if let Some(d) = &args.delimiter {
        options.delimiter = config::parse_char("--delimiter", d)?;
    }
    if let Some(q) = args.quote {
        options.quote = q;
    }
    if args.header {
        options.is_first_record_schema = true;
    }
    options.dialect()?;
    Ok(options)
}

/// Decode the input and build a reader over it.
fn open_reader(args: &InputArgs) -> CliResult<Reader<Cursor<String>>> {
    log_info(Component::Cli, format!("Reading: {}", args.input.display()));
    let mut options = load_options(args)?;

    let bytes = fs::read(&args.input)?;
    let encoding = detect_encoding(&bytes);
    let content = decode_content(&bytes, &encoding)?;
    log_info_indent(Component::Cli, format!("Encoding: {}", encoding), 1);

    let explicit = args.delimiter.is_some()
        || args.options.is_some()
        || std::env::var(ENV_DELIMITER).is_ok();
    if !explicit {
        options.delimiter = detect_delimiter(&content, options.quote);
        options.dialect()?;
    }
    log_info_indent(
        Component::Cli,
        format!(
            "Delimiter: '{}'{}",
            format_delimiter(options.delimiter),
            if explicit { "" } else { " (auto-detected)" }
        ),
        1,
    );

    let reader = match &args.schema {
        Some(path) => {
            let schema = Schema::from_json(&fs::read_to_string(path)?)?;
            Reader::with_schema(Cursor::new(content), schema, options)?
        }
        None => Reader::new(Cursor::new(content), options)?,
    };
    Ok(reader)
}

fn cmd_parse(args: &InputArgs, output: Option<&Path>) -> CliResult<()> {
    let mut reader = open_reader(args)?;
    let mut table = MemoryTable::new();
    let count = populate(Some(&mut table), Some(&mut reader))?;
    if count == 0 {
        log_warning(Component::Cli, "No data rows found");
    }

    let json = serde_json::to_string_pretty(&table.to_json_records())?;
    write_output(&json, output)
}

fn cmd_schema(args: &InputArgs) -> CliResult<()> {
    let mut reader = open_reader(args)?;
    let schema = reader.schema()?;
    println!("{}", schema.to_json()?);
    Ok(())
}

fn cmd_convert(
    args: &InputArgs,
    output: &Path,
    to_options: Option<&Path>,
    to_delimiter: Option<&str>,
    quote_all: bool,
    no_header: bool,
) -> CliResult<()> {
    let mut reader = open_reader(args)?;
    let schema = reader.shared_schema()?;

    let mut target = match to_options {
        Some(path) => Options::from_json(&fs::read_to_string(path)?)?,
        None => reader.options().clone(),
    };
    if let Some(d) = to_delimiter {
        target.delimiter = config::parse_char("--to-delimiter", d)?;
    }
    if quote_all {
        target.quote_style = QuoteStyle::Always;
    }
    if no_header {
        target.is_first_record_schema = false;
    }

    let mut writer = Writer::create(output, schema, target)?;
    if writer.options().is_first_record_schema {
        writer.write_schema()?;
    }
    for row in reader.by_ref() {
        writer.write(&row?)?;
    }
    let count = writer.rows_written();
    writer.flush()?;

    log_success(Component::Cli, format!("Wrote {} rows to {}", count, output.display()));
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult<()> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_success(Component::Cli, format!("Output written to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
