mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ExtractSubcommand, RunArgs};
use sitescore::config;
use sitescore::core::{self as scoring, RunOptions, extract, report};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Score(args) => run_score(args),
        Commands::Init(args) => {
            let cwd = std::env::current_dir()?;
            let path = config::init_target(args.config.as_deref(), &cwd);
            config::write_default_config(&path)?;
            println!("created {}", path.display());
            Ok(0)
        }
        Commands::Extract { command } => {
            let value = match command {
                ExtractSubcommand::Currency(args) => extract::extract_currency_midpoint(&args.text),
                ExtractSubcommand::Income(args) => extract::extract_income_value(&args.text),
                ExtractSubcommand::Traffic(args) => extract::extract_traffic_value(&args.text),
                ExtractSubcommand::MaxPrice(args) => extract::extract_max_price(&args.text),
            };
            println!("{value}");
            Ok(0)
        }
    }
}

fn run_score(args: RunArgs) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let loaded = config::load_config(args.config.as_deref(), &cwd)?;
    let fixtures = resolve_path(&cwd, &args.path);
    tracing::debug!(path = %fixtures.display(), "scoring fixtures");

    let report = scoring::run_scoring(
        &fixtures,
        &loaded.config,
        RunOptions {
            include_existing: args.all,
        },
    )?;

    let output_json = args.json || loaded.config.general.json;
    if output_json {
        let json_report = report::JsonReport::from(&report);
        println!("{}", serde_json::to_string_pretty(&json_report)?);
    } else {
        report::print_human(&report);
    }

    if report.exit.ok { Ok(0) } else { Ok(1) }
}

fn resolve_path(cwd: &Path, path: &PathBuf) -> PathBuf {
    if path.is_absolute() {
        path.clone()
    } else {
        cwd.join(path)
    }
}
