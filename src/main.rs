use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use colio::data::output::{format_column, format_row, format_table};
use colio::{config, Delimiter, OutputFormat, ParseConfig, Profile, WriteConfig, WriteMode};

#[derive(Parser)]
#[command(
    name = "colio",
    about = "Read and write column-oriented text tables (readcol/writecol)"
)]
struct Cli {
    #[arg(
        long = "config",
        short = 'c',
        global = true,
        help = "JSON profile with default read and write settings"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a column file as a table, selected columns, or a single row
    Read(ReadArgs),
    /// Read a column file and write it back out with different settings
    Convert(ConvertArgs),
}

#[derive(Args)]
struct ParseArgs {
    #[arg(
        long = "header-row",
        conflicts_with = "no_header",
        help = "0-based row holding the column names (blank lines are not counted)"
    )]
    header_row: Option<usize>,

    #[arg(
        long = "no-header",
        help = "The file has no header; columns are named 0, 1, 2, ... and data starts at row 0 unless --data-start or the profile says otherwise"
    )]
    no_header: bool,

    #[arg(long = "data-start", help = "0-based row where the data begins")]
    data_start: Option<usize>,

    #[arg(long = "comment", help = "Skip lines whose first field is exactly this")]
    comment: Option<String>,

    #[arg(
        long = "delimiter",
        short = 'd',
        conflicts_with = "delimiter_regex",
        help = "Characters separating fields, in addition to whitespace"
    )]
    delimiter: Option<String>,

    #[arg(
        long = "delimiter-regex",
        help = "Regular expression separating fields, in addition to whitespace"
    )]
    delimiter_regex: Option<String>,

    #[arg(long = "unique-header", help = "Fail if a column name repeats")]
    unique_header: bool,
}

impl ParseArgs {
    fn apply(&self, config: &mut ParseConfig) {
        if self.no_header {
            config.header_row = None;
            // Without a header the data starts on the first row, unless a
            // profile or --data-start says otherwise.
            if config.data_start == ParseConfig::default().data_start {
                config.data_start = 0;
            }
        }
        if let Some(row) = self.header_row {
            config.header_row = Some(row);
        }
        if let Some(row) = self.data_start {
            config.data_start = row;
        }
        if let Some(comment) = &self.comment {
            config.comment = Some(comment.clone());
        }
        if let Some(chars) = &self.delimiter {
            config.delimiter = Delimiter::Literal(chars.clone());
        }
        if let Some(pattern) = &self.delimiter_regex {
            config.delimiter = Delimiter::Regex(pattern.clone());
        }
        if self.unique_header {
            config.unique_header = true;
        }
    }
}

#[derive(Args)]
struct ReadArgs {
    file: PathBuf,

    #[command(flatten)]
    parse: ParseArgs,

    #[arg(
        long = "column",
        short = 'C',
        help = "Column(s) to print by header name. Repeatable."
    )]
    column: Vec<String>,

    #[arg(
        long = "row",
        short = 'r',
        conflicts_with = "column",
        help = "Print only this 0-based data row"
    )]
    row: Option<usize>,

    #[arg(
        long = "output-format",
        short = 'o',
        default_value = "plain",
        help = "Output format: plain, json, or csv"
    )]
    output_format: String,
}

#[derive(Args)]
struct ConvertArgs {
    source: PathBuf,
    dest: PathBuf,

    #[command(flatten)]
    parse: ParseArgs,

    #[arg(long = "out-delimiter", help = "Field separator to write")]
    out_delimiter: Option<String>,

    #[arg(long = "header-prefix", help = "Text written before the header line")]
    header_prefix: Option<String>,

    #[arg(long = "append", short = 'a', help = "Append to the destination")]
    append: bool,

    #[arg(long = "force", short = 'f', help = "Overwrite an existing destination")]
    force: bool,

    #[arg(long = "drop-header", help = "Write data rows only")]
    drop_header: bool,
}

impl ConvertArgs {
    fn apply(&self, config: &mut WriteConfig) {
        if let Some(delimiter) = &self.out_delimiter {
            config.delimiter = delimiter.clone();
        }
        if let Some(prefix) = &self.header_prefix {
            config.header_prefix = prefix.clone();
        }
        if self.append {
            config.mode = WriteMode::Append;
        }
        if self.force {
            config.overwrite_guard = false;
        }
    }
}

pub fn main() {
    // Reset SIGPIPE to default so writing to a broken pipe exits cleanly
    // instead of panicking.
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "colio=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let profile = match &cli.config {
        Some(path) => {
            info!("Using profile : {:?}", path);
            config::parse_file(path)?
        }
        None => Profile::default(),
    };

    match cli.command {
        Command::Read(args) => read_command(args, profile.parse),
        Command::Convert(args) => convert_command(args, profile),
    }
}

fn read_command(args: ReadArgs, mut parse: ParseConfig) -> Result<()> {
    args.parse.apply(&mut parse);

    let output_format = match args.output_format.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "plain" => OutputFormat::Plain,
        other => {
            return Err(anyhow!(
                "Unknown output format: {other}. Valid formats: plain, json, csv"
            ))
        }
    };

    let table = colio::read(&args.file, &parse)?;
    info!(
        "Parsed table: {} rows, {} columns",
        table.num_rows(),
        table.num_columns()
    );

    let rendered = if let Some(row) = args.row {
        if row >= table.num_rows() {
            return Err(anyhow!(
                "Row {row} is out of range (table has {} rows)",
                table.num_rows()
            ));
        }
        format_row(&table, output_format, row)?
    } else if args.column.is_empty() {
        format_table(&table, output_format)?
    } else {
        let selected = table.select(&args.column).ok_or_else(|| {
            let missing = args
                .column
                .iter()
                .find(|name| table.column_index(name).is_none())
                .map_or("", String::as_str);
            anyhow!(
                "Unknown column name: {missing}. Available columns: {}",
                table.header.join(", ")
            )
        })?;
        (0..selected.num_columns())
            .map(|idx| format_column(&selected, output_format, idx))
            .collect::<Result<Vec<_>>>()?
            .join("\n")
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn convert_command(args: ConvertArgs, profile: Profile) -> Result<()> {
    let Profile {
        mut parse,
        mut write,
    } = profile;
    args.parse.apply(&mut parse);
    args.apply(&mut write);

    let mut table = colio::read(&args.source, &parse)?;
    if args.drop_header {
        table.header.clear();
    }

    let outcome = colio::write(&args.dest, &table, &write)
        .with_context(|| format!("Failed to convert {}", args.source.display()))?;
    info!(
        "{:?} {} ({} rows)",
        outcome,
        args.dest.display(),
        table.num_rows()
    );
    Ok(())
}
