use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use prettytable::{Cell, Row as PrettyRow, Table};
use serde_json::json;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;

use rfo_detect::environment;
use rfo_detect::rfo::{
    ClassificationReport, Detection, Priority, RfoDetector, TaxonomyEntry, TaxonomyStore,
};
use rfo_detect::TARGET_CLI;

// Reference expressions for `rfo demo`, with what each one exercises.
const DEMO_CASES: &[(&str, &str)] = &[
    ("BTS, CPRI", "exact match"),
    ("  bts, cpri  ", "surrounding whitespace"),
    ("BTS ,  CPRI", "irregular spacing"),
    ("dbd modul issue", "loose phrasing"),
    ("rectifier hardwar issue", "typo in hardware"),
    ("fueling pump falt", "typo in fault"),
    ("battry cells fault", "typo in battery"),
    ("DG Engine Fault", "missing comma"),
    ("Engine Fault", "partial description"),
    ("fiber cut", "shared prefix"),
    ("cable stolen", "shorter phrasing"),
    ("", "empty string"),
    ("   ", "whitespace only"),
    ("Unknown Issue", "no match expected"),
    ("xyz123", "random string"),
];

#[derive(Parser)]
#[command(author, version, about = "Classify reason-for-outage text against the RFO taxonomy", long_about = None)]
struct Cli {
    /// Taxonomy file (code, description, priority); overrides RFO_TAXONOMY_PATH
    #[arg(short, long, global = true)]
    taxonomy: Option<PathBuf>,

    /// Fuzzy match threshold (0.0-1.0); overrides RFO_FUZZY_THRESHOLD
    #[arg(long, global = true)]
    threshold: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single expression
    Detect {
        /// Free-text reason for outage
        text: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the taxonomy entry for a code
    Code {
        /// Code exactly as it appears in the taxonomy, e.g. 00001
        code: String,
    },

    /// List entries with a priority (critical, moderate, minor, contextual)
    #[command(name = "priority")]
    ByPriority {
        priority: String,
    },

    /// List entries whose description contains a term
    Search {
        term: String,
    },

    /// Classify one expression per line from a file or stdin
    Classify {
        /// Input file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display taxonomy statistics
    Stats,

    /// Run the reference expressions and print each result
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = environment::log_dir();
    rfo_detect::logging::configure_logging(log_dir.as_deref())?;

    let detector = build_detector(&cli)?;

    match cli.command {
        Commands::Detect { text, json } => {
            let detection = detector.detect_expression(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&detection)?);
            } else {
                print_detection(&text, &detection);
            }
        }

        Commands::Code { code } => {
            let entry = detector
                .get_by_code(&code)
                .ok_or_else(|| anyhow!("No taxonomy entry with code {}", code))?;
            println!("Code:        {}", entry.code());
            println!("Description: {}", entry.description());
            println!("Priority:    {}", colorize_priority(entry.priority()));
            println!("Normalized:  {}", entry.normalized_description());
        }

        Commands::ByPriority { priority } => {
            let priority = parse_priority(&priority)?;
            let entries = detector.get_by_priority(priority);
            println!("{} entries with priority {}", entries.len(), priority);
            print_entries(&entries);
        }

        Commands::Search { term } => {
            let entries = detector.search(&term);
            if entries.is_empty() {
                println!("No taxonomy entries contain '{}'", term);
            } else {
                println!("{} entries contain '{}'", entries.len(), term);
                print_entries(&entries);
            }
        }

        Commands::Classify { input, json } => {
            let raw = read_input(input.as_ref())?;
            let report = detector.classify_all(raw.lines());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Stats => {
            let by_priority: serde_json::Map<String, serde_json::Value> = Priority::ALL
                .iter()
                .map(|p| (p.label().to_string(), json!(detector.get_by_priority(*p).len())))
                .collect();
            let stats = json!({
                "taxonomy": detector.store().stats(),
                "threshold": detector.threshold(),
                "by_priority": by_priority,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Demo => {
            println!("{}", "=== RFO Detection Results ===".bold());
            for (expression, purpose) in DEMO_CASES {
                println!("\nTest: '{}' ({})", expression, purpose);
                print_detection(expression, &detector.detect_expression(expression));
            }

            println!("\n{}", "=== Queries ===".bold());
            println!(
                "{} critical impact entries",
                detector.get_by_priority(Priority::CriticalImpact).len()
            );
            println!("{} power-related entries", detector.search("power").len());
            if let Some(entry) = detector.get_by_code("00001") {
                println!(
                    "Code 00001: {} ({})",
                    entry.description(),
                    colorize_priority(entry.priority())
                );
            }
        }
    }

    Ok(())
}

/// Build the detector from flags, falling back to the environment.
fn build_detector(cli: &Cli) -> Result<RfoDetector> {
    let store = match cli.taxonomy.clone().or_else(environment::taxonomy_path) {
        Some(path) => {
            info!(target: TARGET_CLI, "Loading taxonomy from {}", path.display());
            TaxonomyStore::from_path(&path)?
        }
        None => TaxonomyStore::embedded(),
    };

    let threshold = match cli.threshold {
        Some(threshold) => threshold,
        None => environment::fuzzy_threshold()?,
    };

    RfoDetector::new(store)
        .with_threshold(threshold)
        .context("Invalid fuzzy threshold")
}

fn read_input(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read expressions from stdin")?;
            Ok(buffer)
        }
    }
}

/// Parse priority string into Priority enum
fn parse_priority(priority: &str) -> Result<Priority> {
    priority.parse::<Priority>().map_err(|e| anyhow!(e))
}

fn colorize_priority(priority: Priority) -> ColoredString {
    match priority {
        Priority::CriticalImpact => priority.label().red().bold(),
        Priority::ModerateImpact => priority.label().yellow(),
        Priority::MinorImpact => priority.label().green(),
        Priority::ContextualFactor => priority.label().blue(),
    }
}

// prettytable style specs matching `colorize_priority`
fn priority_style(priority: Priority) -> &'static str {
    match priority {
        Priority::CriticalImpact => "Frb",
        Priority::ModerateImpact => "Fy",
        Priority::MinorImpact => "Fg",
        Priority::ContextualFactor => "Fb",
    }
}

fn print_detection(expression: &str, detection: &Detection<'_>) {
    match detection {
        Detection::Matched(m) => {
            let score = m
                .score
                .map(|s| format!(" {:.3}", s))
                .unwrap_or_default();
            println!(
                "{} {} [{}] via {}{}",
                m.code().bold(),
                m.description(),
                colorize_priority(m.priority()),
                m.strategy,
                score
            );
        }
        Detection::EmptyExpression => {
            println!("{}", detection.to_string().as_str().yellow());
        }
        Detection::NeedsUpgrade => {
            println!("{}: '{}'", detection.to_string().as_str().red(), expression.trim());
        }
    }
}

fn print_entries(entries: &[&TaxonomyEntry]) {
    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("Code"),
        Cell::new("Description"),
        Cell::new("Priority"),
    ]));

    for entry in entries {
        table.add_row(PrettyRow::new(vec![
            Cell::new(entry.code()),
            Cell::new(entry.description()),
            Cell::new(entry.priority().label()).style_spec(priority_style(entry.priority())),
        ]));
    }

    table.printstd();
}

fn print_report(report: &ClassificationReport<'_>) {
    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("Expression"),
        Cell::new("Code"),
        Cell::new("Description"),
        Cell::new("Priority"),
        Cell::new("Strategy"),
    ]));

    for result in &report.results {
        let row = match &result.detection {
            Detection::Matched(m) => vec![
                Cell::new(&result.expression),
                Cell::new(m.code()),
                Cell::new(m.description()),
                Cell::new(m.priority().label()).style_spec(priority_style(m.priority())),
                Cell::new(&m.strategy.to_string()),
            ],
            other => vec![
                Cell::new(&result.expression),
                Cell::new("-"),
                Cell::new(&other.to_string()),
                Cell::new("-"),
                Cell::new("-"),
            ],
        };
        table.add_row(PrettyRow::new(row));
    }

    table.printstd();

    println!(
        "\n{} expressions: {} matched, {} empty, {} need taxonomy upgrade",
        report.results.len(),
        report.matched,
        report.empty,
        report.needs_upgrade
    );
    for (priority, count) in &report.by_priority {
        println!("  {}: {}", colorize_priority(*priority), count);
    }

    if !report.upgrade_candidates.is_empty() {
        println!("\n{}", "Expressions needing taxonomy upgrade:".red().bold());
        for expression in &report.upgrade_candidates {
            println!("  - {}", expression);
        }
    }
}
