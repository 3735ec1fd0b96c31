use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};

use payroll_insights::{call_operation_json, store, tool_definitions, Column, TimeSeriesStore};

#[derive(Parser)]
#[command(name = "payroll-insights")]
#[command(about = "Answers questions about an employee's payroll history", long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .args(["csv", "sample"])
        .multiple(false)
))]
struct Cli {
    /// Payroll export to load
    #[arg(long, global = true, env = "PAYROLL_CSV")]
    csv: Option<PathBuf>,
    /// Use the built-in sample history
    #[arg(long, global = true)]
    sample: bool,
    /// Fallback log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one operation and print its JSON response
    Call {
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the operation registry as tool-calling schemas
    Tools,
    /// List the columns a query may reference
    Columns,
    /// Print how many months are loaded and their span
    Info,
}

fn init_tracing(fallback_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_store(cli: &Cli) -> anyhow::Result<TimeSeriesStore> {
    if cli.sample {
        return store::sample_store().context("failed to build sample history");
    }
    let path = cli
        .csv
        .as_ref()
        .context("pass --csv <path>, set PAYROLL_CSV, or use --sample")?;
    let store = TimeSeriesStore::from_csv(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!(records = store.len(), path = %path.display(), "payroll history loaded");
    Ok(store)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match &cli.command {
        Commands::Call { name, args, pretty } => {
            let store = load_store(&cli)?;
            let response = call_operation_json(&store, name, args);
            let output = if *pretty {
                serde_json::to_string_pretty(&response)?
            } else {
                serde_json::to_string(&response)?
            };
            println!("{output}");
        }
        Commands::Tools => {
            println!("{}", serde_json::to_string_pretty(&tool_definitions())?);
        }
        Commands::Columns => {
            for column in Column::ALL {
                println!("{column}");
            }
        }
        Commands::Info => {
            let store = load_store(&cli)?;
            match (store.records().first(), store.records().last()) {
                (Some(first), Some(last)) => println!(
                    "{} months loaded, {} to {}.",
                    store.len(),
                    first.at(),
                    last.at()
                ),
                _ => println!("No records loaded."),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn csv_and_sample_are_exclusive() {
        let result = Cli::try_parse_from(["payroll-insights", "--csv", "folha.csv", "--sample", "info"]);
        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::ArgumentConflict));
    }

    #[test]
    fn sample_alone_is_accepted() {
        let cli = Cli::try_parse_from(["payroll-insights", "--sample", "info"]).unwrap();
        assert!(cli.sample);
    }
}
