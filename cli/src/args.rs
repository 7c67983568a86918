use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use cost_centers_core::model::OutputFormat;

use crate::logger::LogLevel;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Break a monthly AWS Cost and Usage Report down by cost center"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,
    #[arg(long, global = true)]
    pub json_output: bool,
    #[arg(long, global = true)]
    pub json_only: bool,
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process one month from the bucket, as a storage event or timer would.
    Run(RunArgs),
    /// Process local billing and account CSV files.
    Summarize(SummarizeArgs),
    Config(ConfigCommandArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Event payload (S3 notification or EventBridge JSON). Omit for a timer run.
    #[arg(long)]
    pub event: Option<PathBuf>,
    #[arg(long)]
    pub bucket: Option<String>,
    /// Directory holding one subdirectory per bucket.
    #[arg(long)]
    pub storage_root: Option<PathBuf>,
    #[arg(long, default_value = "text")]
    pub format: OutputFormatArg,
    #[arg(long)]
    pub json: bool,
    #[arg(long)]
    pub pretty: bool,
    #[arg(long)]
    pub show_counts: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct SummarizeArgs {
    #[arg(long)]
    pub billing: PathBuf,
    #[arg(long)]
    pub accounts: PathBuf,
    /// Billing period as YYYY-MM; defaults to the current month.
    #[arg(long)]
    pub period: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub html_out: Option<PathBuf>,
    #[arg(long)]
    pub dataset_out: Option<PathBuf>,
    #[arg(long, default_value = "text")]
    pub format: OutputFormatArg,
    #[arg(long)]
    pub json: bool,
    #[arg(long)]
    pub pretty: bool,
    #[arg(long)]
    pub show_counts: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ConfigCommandArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Validate(ConfigArgs),
    Dump(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(long)]
    pub format: Option<OutputFormatArg>,
    #[arg(long)]
    pub pretty: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn format(&self) -> OutputFormat {
        match self {
            Self::Validate(args) => args.format.map(Into::into).unwrap_or(OutputFormat::Text),
            Self::Dump(args) => args.format.map(Into::into).unwrap_or(OutputFormat::Json),
        }
    }

    pub fn pretty(&self) -> bool {
        match self {
            Self::Validate(args) | Self::Dump(args) => args.pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}
