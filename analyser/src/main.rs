//! Spend Analyser CLI - clean and analyse procurement spend exports
//!
//! # Main Commands
//!
//! ```bash
//! spend-analyser analyze spend.csv             # Full pipeline + report
//! spend-analyser analyze                       # Pick a file in the current directory
//! spend-analyser clean spend.xlsx -o clean.csv # Clean and export only
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! spend-analyser parse spend.csv               # Raw table as JSON
//! spend-analyser aliases                       # Column synonyms
//! ```

use clap::{Parser, Subcommand};
use spend_analyser::config::{parse_delimiter, parse_top_n};
use spend_analyser::parser::{format_delimiter, records_as_json};
use spend_analyser::{
    analyze, discover_inputs, export_table, logging, prompt_choice, read_table, render_report,
    run_pipeline, write_analysis_json, AnalyserConfig, ChartRenderer, Dashboard, ExportFormat,
    ExportKind, JsonChartRenderer, PipelineResult, DEFAULT_REGISTRY,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spend-analyser")]
#[command(about = "Clean and analyse procurement spend exports", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: read, clean, analyse and report
    Analyze {
        /// Input file (prompt when omitted)
        input: Option<PathBuf>,

        /// Field delimiter (auto-detect if not specified)
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<char>,

        /// Number of suppliers in the top list
        #[arg(short, long, value_parser = parse_top_n)]
        top: Option<usize>,

        /// Export the clean table to this file
        #[arg(short, long)]
        export: Option<PathBuf>,

        /// Export format (csv or xlsx)
        #[arg(short, long)]
        format: Option<ExportKind>,

        /// Write the chart dashboard to this file
        #[arg(long)]
        dashboard: Option<PathBuf>,

        /// Write the analysis as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Clean an input file and export the result
    Clean {
        /// Input file
        input: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Field delimiter (auto-detect if not specified)
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<char>,

        /// Export format (csv or xlsx)
        #[arg(short, long)]
        format: Option<ExportKind>,
    },

    /// Parse an input file and output the raw table as JSON
    Parse {
        /// Input file
        input: PathBuf,

        /// Field delimiter (auto-detect if not specified)
        #[arg(short, long, value_parser = parse_delimiter)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the accepted column names
    Aliases,
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }

    let result = match AnalyserConfig::from_env() {
        Ok(config) => run(cli.command, config),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, mut config: AnalyserConfig) -> CmdResult {
    match command {
        Commands::Analyze {
            input,
            delimiter,
            top,
            export,
            format,
            dashboard,
            json,
        } => {
            if delimiter.is_some() {
                config.pipeline.delimiter = delimiter;
            }
            if let Some(top) = top {
                config.pipeline.top_n = top;
            }
            if let Some(format) = format {
                config.export_format = format;
            }
            cmd_analyze(input, &config, export.as_deref(), dashboard.as_deref(), json.as_deref())
        }

        Commands::Clean {
            input,
            output,
            delimiter,
            format,
        } => {
            if delimiter.is_some() {
                config.pipeline.delimiter = delimiter;
            }
            if let Some(format) = format {
                config.export_format = format;
            }
            cmd_clean(&input, &output, &config)
        }

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter.or(config.pipeline.delimiter), output.as_deref()),

        Commands::Aliases => cmd_aliases(),
    }
}

/// Relative output paths land in the configured output directory.
fn output_path(config: &AnalyserConfig, path: &Path) -> PathBuf {
    config.output_dir.join(path)
}

fn choose_input() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let candidates = discover_inputs(Path::new("."))?;
    let stdin = io::stdin();
    let choice = prompt_choice(&candidates, stdin.lock(), io::stderr())?;
    Ok(choice)
}

fn print_summary(result: &PipelineResult) {
    if let Some(source) = &result.source {
        eprintln!("📄 Input: {}", source.path.display());
        if let (Some(encoding), Some(delimiter)) = (&source.encoding, source.delimiter) {
            eprintln!("   Encoding: {}", encoding);
            eprintln!("   Delimiter: '{}'", format_delimiter(delimiter));
        }
        if !source.sheets.is_empty() {
            eprintln!("   Sheets: {}", source.sheets.join(", "));
        }
        eprintln!("   Rows: {}", source.row_count);
    }
    if !result.unmatched_columns.is_empty() {
        eprintln!("   Unmatched columns: {}", result.unmatched_columns.join(", "));
    }
    eprintln!("🧹 {}", result.stats.summary());
}

fn cmd_analyze(
    input: Option<PathBuf>,
    config: &AnalyserConfig,
    export: Option<&Path>,
    dashboard: Option<&Path>,
    json: Option<&Path>,
) -> CmdResult {
    let input = match input {
        Some(path) => path,
        None => choose_input()?,
    };

    let result = run_pipeline(&input, &config.pipeline)?;
    print_summary(&result);

    let analysis = analyze(&result.table, config.pipeline.top_n);
    print!("{}", render_report(&analysis, &config.currency));

    if let Some(path) = export {
        let outcome = export_table(
            &result.table,
            &output_path(config, path),
            ExportFormat::from(config.export_format),
        )?;
        eprintln!("💾 Clean data written to: {}", outcome.path.display());
    }

    if let Some(path) = dashboard {
        let path = output_path(config, path);
        JsonChartRenderer.render(&Dashboard::from_analysis(&analysis, &config.currency), &path)?;
        eprintln!("📈 Dashboard written to: {}", path.display());
    }

    if let Some(path) = json {
        let path = output_path(config, path);
        write_analysis_json(&analysis, &path)?;
        eprintln!("💾 Analysis written to: {}", path.display());
    }

    Ok(())
}

fn cmd_clean(input: &Path, output: &Path, config: &AnalyserConfig) -> CmdResult {
    let result = run_pipeline(input, &config.pipeline)?;
    print_summary(&result);

    let outcome = export_table(
        &result.table,
        &output_path(config, output),
        ExportFormat::from(config.export_format),
    )?;
    eprintln!(
        "✅ {} clean rows written to: {} ({})",
        result.table.len(),
        outcome.path.display(),
        outcome.format.extension()
    );
    Ok(())
}

fn cmd_parse(input: &Path, delimiter: Option<char>, output: Option<&Path>) -> CmdResult {
    eprintln!("📄 Parsing: {}", input.display());

    let parsed = read_table(input, delimiter)?;
    if let (Some(encoding), Some(used)) = (&parsed.info.encoding, parsed.info.delimiter) {
        eprintln!("   Encoding: {}", encoding);
        eprintln!(
            "   Delimiter: '{}'{}",
            format_delimiter(used),
            if delimiter.is_none() { " (auto-detected)" } else { "" }
        );
    }
    eprintln!("   Columns: {}", parsed.info.headers.join(", "));
    eprintln!("✅ Parsed {} rows", parsed.info.row_count);

    let json = serde_json::to_string_pretty(&records_as_json(&parsed.table))?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_aliases() -> CmdResult {
    println!("Accepted column names (first match wins):\n");
    for (field, aliases) in DEFAULT_REGISTRY.entries() {
        let required = if field.is_required() { "required" } else { "optional" };
        println!("  {:<9} ({}): {}", field.as_str(), required, aliases.join(", "));
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> CmdResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
