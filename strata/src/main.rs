//! Strata - parser and validator for the geology DSL
//!
//! This is the main entry point for the Strata CLI.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use strata_core::config::ConfigLoader;
use strata_dsl::{write_report, Diagnostic, Validator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Strata - check geological histories written in the Strata DSL
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Validator configuration file (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print its document as JSON
    Parse {
        /// Source file, or `-` for stdin
        file: String,
    },

    /// Run every check on a file
    Validate {
        /// Source file, or `-` for stdin
        file: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },

    /// Print a file in canonical layout
    Fmt {
        /// Source file, or `-` for stdin
        file: String,

        /// Rewrite the file in place
        #[arg(long)]
        write: bool,

        /// Let --write drop comments and unknown fields
        #[arg(long, requires = "write")]
        force: bool,
    },

    /// List events oldest first
    Order {
        /// Source file, or `-` for stdin
        file: String,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

/// A loaded source text and the name used in reports
struct Input {
    name: String,
    text: String,
}

impl Input {
    fn read(file: &str) -> anyhow::Result<Self> {
        if file == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            return Ok(Self {
                name: "<stdin>".to_string(),
                text,
            });
        }
        let text = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
        Ok(Self {
            name: file.to_string(),
            text,
        })
    }

    fn report<'a>(&self, diagnostics: impl IntoIterator<Item = &'a Diagnostic>) -> anyhow::Result<()> {
        let stderr = std::io::stderr();
        let color = stderr.is_terminal();
        write_report(stderr.lock(), &self.name, &self.text, diagnostics, color)
            .context("Failed to write diagnostics")
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = ConfigLoader::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(?config, "validator configuration");
    let validator = Validator::new(config);

    let ok = match cli.command {
        Commands::Parse { file } => {
            let input = Input::read(&file)?;
            let result = validator.parse(&input.text);
            input.report(result.warnings.iter().chain(result.errors.iter()))?;
            println!("{}", serde_json::to_string_pretty(&result.document)?);
            result.is_ok()
        }

        Commands::Validate { file, format } => {
            let input = Input::read(&file)?;
            tracing::info!("Validating {}", input.name);
            let result = validator.validate(&input.text)?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                Format::Human => {
                    input.report(result.warnings.iter().chain(result.errors.iter()))?;
                    let verdict = if result.is_valid { "valid" } else { "invalid" };
                    println!(
                        "{}: {} ({} rocks, {} depositions, {} erosions, {} intrusions; {} errors, {} warnings)",
                        input.name,
                        verdict,
                        result.rocks_count,
                        result.depositions_count,
                        result.erosions_count,
                        result.intrusions_count,
                        result.errors.len(),
                        result.warnings.len(),
                    );
                }
            }
            result.is_valid
        }

        Commands::Fmt { file, write, force } => {
            if write && file == "-" {
                bail!("--write needs a file path, not stdin");
            }
            let input = Input::read(&file)?;
            let result = validator.parse(&input.text);
            input.report(result.warnings.iter().chain(result.errors.iter()))?;

            if !result.is_ok() {
                false
            } else {
                // the canonical form keeps neither comments nor unknown fields
                let comments = strata_dsl::parser::tokenize(&input.text).comments.len();
                let dropped = result.warnings.len();
                if comments > 0 {
                    tracing::warn!("{} comment(s) in {} are not kept by fmt", comments, input.name);
                }

                let formatted = strata_dsl::to_dsl(&result.document);
                if write {
                    if (comments > 0 || dropped > 0) && !force {
                        bail!(
                            "refusing to rewrite {}: formatting drops {} comment(s) and {} field(s) with warnings; pass --force to write anyway",
                            file,
                            comments,
                            dropped
                        );
                    }
                    std::fs::write(Path::new(&file), formatted)
                        .with_context(|| format!("Failed to write {}", file))?;
                    tracing::info!("Formatted {}", file);
                } else {
                    print!("{}", formatted);
                }
                true
            }
        }

        Commands::Order { file } => {
            let input = Input::read(&file)?;
            let analysis = validator.analyze(&input.text)?;
            if !analysis.report.is_clean() {
                input.report(analysis.report.errors.iter())?;
                false
            } else {
                match analysis.graph.chronological_order() {
                    Some(order) => {
                        for id in order {
                            match analysis.graph.node(id).and_then(|n| n.time.as_ref()) {
                                Some(time) => println!("{}\t{}", id, time.value),
                                None => println!("{}", id),
                            }
                        }
                        true
                    }
                    None => bail!("event graph has a cycle that was not reported"),
                }
            }
        }

        Commands::Version => {
            println!("strata {}", strata_core::VERSION);
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
