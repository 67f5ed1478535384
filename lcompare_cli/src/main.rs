use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use lcompare_common::{load_config, AppConfig, ComparisonSummary, Discrepancy};
use lcompare_core::{
    compare_records, format_discrepancy, write_report, CompareOptions, ComparisonResult,
    CsvSource, EditDirective, LineComparator, LineRead, LineRewriter, Region, ReplaceMode,
    TextSource,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lcompare")]
#[command(author = "LCompare Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Line-oriented text file comparison and rewriting utility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two text files line by line
    Compare {
        /// Left file path (File A)
        left: PathBuf,

        /// Right file path (File B)
        right: PathBuf,

        /// Delete all whitespace from compared lines
        #[arg(short = 'w', long)]
        ignore_whitespace: bool,

        /// Ignore alphabetical case while comparing
        #[arg(short = 'i', long)]
        case_insensitive: bool,

        /// Restrict comparison to a 1-based window: START_LINE,START_COL,END_LINE,END_COL
        #[arg(long, value_name = "L,C,L,C", conflicts_with = "csv")]
        region: Option<String>,

        /// Where to write the compare log (default: timestamped file in the
        /// report directory; only written when the files differ)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Compare record by record as CSV (header row required, fields trimmed)
        #[arg(long, conflicts_with = "ignore_whitespace")]
        csv: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite lines of a file with a replace directive
    Modify {
        /// File to rewrite in place
        file: PathBuf,

        /// Replace mode (names or the numeric codes 0-3)
        #[arg(short, long, value_enum)]
        mode: ModeArg,

        /// Directive in the form selector];[replacement
        args: String,
    },

    /// Check whether a line contains a substring
    Find {
        /// File to search
        file: PathBuf,

        /// Substring to look for
        needle: String,

        /// 1-based line number to check
        #[arg(short, long)]
        line: usize,
    },

    /// Append a row to a CSV file
    AddRow {
        /// CSV file (first row is the header)
        file: PathBuf,

        /// Field values in header order; missing trailing fields stay empty
        values: Vec<String>,
    },

    /// Append a column to a CSV file
    AddColumn {
        /// CSV file (first row is the header)
        file: PathBuf,

        /// New column title
        title: String,

        /// Column values, top row first; rows past the end stay empty
        values: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Replace every occurrence on the first matching line, then stop
    #[value(alias = "0")]
    First,
    /// Replace every occurrence on every line
    #[value(alias = "1")]
    All,
    /// Replace whole lines selected by number
    #[value(alias = "2")]
    Lines,
    /// Replace every regex match on every line
    #[value(alias = "3")]
    Regex,
}

impl From<ModeArg> for ReplaceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::First => ReplaceMode::First,
            ModeArg::All => ReplaceMode::All,
            ModeArg::Lines => ReplaceMode::Lines,
            ModeArg::Regex => ReplaceMode::Regex,
        }
    }
}

fn main() {
    // Log to stderr so JSON output can go cleanly to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Compare {
            left,
            right,
            ignore_whitespace,
            case_insensitive,
            region,
            report,
            csv,
            json,
        } => run_compare(
            left,
            right,
            ignore_whitespace,
            case_insensitive,
            region,
            report,
            csv,
            json,
        ),
        Commands::Modify { file, mode, args } => run_modify(file, mode, args),
        Commands::Find { file, needle, line } => run_find(file, needle, line),
        Commands::AddRow { file, values } => run_add_row(file, values),
        Commands::AddColumn {
            file,
            title,
            values,
        } => run_add_column(file, title, values),
    };

    match outcome {
        Ok(passed) => {
            if !passed {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("{e:#}");
            std::process::exit(2);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_compare(
    left: PathBuf,
    right: PathBuf,
    ignore_whitespace: bool,
    case_insensitive: bool,
    region: Option<String>,
    report: Option<PathBuf>,
    csv: bool,
    json: bool,
) -> anyhow::Result<bool> {
    if !left.exists() {
        bail!("Left path does not exist: {}", left.display());
    }
    if !right.exists() {
        bail!("Right path does not exist: {}", right.display());
    }

    let loaded = load_config(false)?;
    let config = loaded.config;

    let options = CompareOptions {
        ignore_whitespace: ignore_whitespace || config.ignore_whitespace,
        case_insensitive: case_insensitive || config.case_insensitive,
    };
    let region = region.as_deref().map(parse_region).transpose()?;

    let report_path = resolve_report_path(report, &config)?;

    let result = if csv {
        let mut left_source = CsvSource::new(&left);
        let mut right_source = CsvSource::new(&right);
        let result = compare_records(&mut left_source, &mut right_source, options.case_insensitive)?;
        if !result.discrepancies.is_empty() {
            write_report(&report_path, &result.discrepancies)?;
            info!("compare log saved at {}", report_path.display());
        }
        result
    } else {
        let mut comparator = LineComparator::new().with_options(options);
        if let Some(region) = region {
            comparator = comparator.with_region(region);
        }
        let mut left_source = TextSource::new(&left);
        let mut right_source = TextSource::new(&right);
        comparator.compare_with_report(&mut left_source, &mut right_source, &report_path)?
    };

    if json {
        let output = serde_json::to_string_pretty(&build_json_report(&left, &right, &result))?;
        println!("{output}");
        return Ok(result.equal);
    }

    println!("{}", "=".repeat(80));
    println!("Comparison Results");
    println!("{}", "=".repeat(80));
    println!("File A: {}", left.display());
    println!("File B: {}", right.display());
    println!();

    for discrepancy in &result.discrepancies {
        println!("{}", format_discrepancy(discrepancy));
        println!();
    }

    if result.equal {
        println!("Files are identical ({} lines)", result.left_lines);
    } else {
        println!(
            "Files differ: {} discrepancies (log: {})",
            result.discrepancies.len(),
            report_path.display()
        );
    }
    println!("{}", "=".repeat(80));

    Ok(result.equal)
}

fn run_modify(file: PathBuf, mode: ModeArg, args: String) -> anyhow::Result<bool> {
    let directive = EditDirective::parse(mode.into(), &args)
        .with_context(|| format!("failed to parse directive {args:?}"))?;
    let mut source = TextSource::new(&file);
    LineRewriter::apply(&mut source, &directive)
        .with_context(|| format!("failed to rewrite {}", file.display()))?;
    println!("Modified {}", file.display());
    Ok(true)
}

fn run_find(file: PathBuf, needle: String, line: usize) -> anyhow::Result<bool> {
    let mut source = TextSource::new(&file);
    source
        .open()
        .with_context(|| format!("failed to open {}", file.display()))?;
    let found = source.find(&needle, line)?;
    if found {
        println!("Found {:?} on line {} of {}", needle, line, file.display());
    } else {
        println!(
            "Did not find {:?} on line {} of {}",
            needle,
            line,
            file.display()
        );
    }
    Ok(found)
}

fn run_add_row(file: PathBuf, values: Vec<String>) -> anyhow::Result<bool> {
    let mut source = CsvSource::new(&file);
    source
        .open()
        .with_context(|| format!("failed to open {}", file.display()))?;
    source.add_row(values)?;
    println!("Row added to {}", file.display());
    Ok(true)
}

fn run_add_column(file: PathBuf, title: String, values: Vec<String>) -> anyhow::Result<bool> {
    let mut source = CsvSource::new(&file);
    source
        .open()
        .with_context(|| format!("failed to open {}", file.display()))?;
    source.add_column(&title, &values)?;
    println!("Column {:?} added to {}", title, file.display());
    Ok(true)
}

/// Parses `START_LINE,START_COL,END_LINE,END_COL` into a region.
fn parse_region(spec: &str) -> anyhow::Result<Region> {
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        bail!("region must be START_LINE,START_COL,END_LINE,END_COL, got {spec:?}");
    }
    let mut numbers = [0usize; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .with_context(|| format!("invalid region component {part:?}"))?;
    }
    let [start_line, start_col, end_line, end_col] = numbers;
    if start_line == 0 || start_col == 0 || end_line == 0 || end_col == 0 {
        bail!("region components are 1-based and must be positive");
    }
    if end_line < start_line {
        bail!("region end line {end_line} precedes start line {start_line}");
    }
    Ok(Region {
        start_line,
        start_col,
        end_line,
        end_col,
    })
}

/// Default compare-log location: the configured report directory (or the
/// working directory) with a timestamped file name.
fn resolve_report_path(
    report: Option<PathBuf>,
    config: &AppConfig,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = report {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        return Ok(path);
    }
    let dir = lcompare_common::default_report_dir(config);
    std::fs::create_dir_all(&dir)?;
    let name = format!("Run_{}.log", chrono::Local::now().format("%d-%m-%Y_%H-%M-%S"));
    Ok(dir.join(name))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    left: String,
    right: String,
    equal: bool,
    left_lines: usize,
    right_lines: usize,
    summary: ComparisonSummary,
    discrepancies: &'a [Discrepancy],
}

fn build_json_report<'a>(
    left: &Path,
    right: &Path,
    result: &'a ComparisonResult,
) -> JsonReport<'a> {
    JsonReport {
        left: left.to_string_lossy().to_string(),
        right: right.to_string_lossy().to_string(),
        equal: result.equal,
        left_lines: result.left_lines,
        right_lines: result.right_lines,
        summary: ComparisonSummary::from_discrepancies(&result.discrepancies),
        discrepancies: &result.discrepancies,
    }
}
