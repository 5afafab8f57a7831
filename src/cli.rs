use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "sitescore",
    version,
    about = "Viability scoring for planned activity-center sites"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Score location fixtures and print a ranked report
    Score(RunArgs),
    /// Write a default sitescore.toml
    Init(InitArgs),
    /// Run a single text extractor against a piece of research prose
    Extract {
        #[command(subcommand)]
        command: ExtractSubcommand,
    },
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Fixture file or directory of *.json fixtures
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub json: bool,
    /// Also score existing (non-planned) locations
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write the default config here instead of ./sitescore.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ExtractSubcommand {
    Currency(ExtractArgs),
    Income(ExtractArgs),
    Traffic(ExtractArgs),
    MaxPrice(ExtractArgs),
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    pub text: String,
}
