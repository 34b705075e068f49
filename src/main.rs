mod cli;
mod core;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::report_cmd::{self, ReportArgs};
use crate::core::config::AppConfig;
use crate::core::period::{Granularity, PeriodSelectors, ReportKind};

#[derive(Parser)]
#[command(name = "costrep", about = "AWS cost reporting CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text|json|csv)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Flags every report subcommand accepts.
#[derive(Args)]
struct ReportFlags {
    /// Dimension to group costs by (service|account|region|tag)
    #[arg(long)]
    group_by: Option<String>,

    /// Tag key to group by (required with --group-by tag)
    #[arg(long)]
    tag_key: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// AWS profile name
    #[arg(long)]
    profile: Option<String>,

    /// AWS region
    #[arg(long)]
    region: Option<String>,
}

impl From<ReportFlags> for ReportArgs {
    fn from(flags: ReportFlags) -> Self {
        Self {
            group_by: flags.group_by,
            tag_key: flags.tag_key,
            output: flags.output,
            profile: flags.profile,
            region: flags.region,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Costs for the last 30 days (or an explicit range), bucketed by day
    Daily {
        /// First day of the range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Day after the last day of the range (YYYY-MM-DD, exclusive)
        #[arg(long)]
        end: Option<NaiveDate>,

        #[command(flatten)]
        flags: ReportFlags,
    },
    /// Costs for one calendar month (default: previous month), by day
    Monthly {
        /// Month number (1-12)
        #[arg(long)]
        month: Option<u32>,

        /// Year (YYYY)
        #[arg(long)]
        year: Option<i32>,

        #[command(flatten)]
        flags: ReportFlags,
    },
    /// Costs for one quarter (default: current quarter)
    Quarterly {
        /// Quarter number (1-4)
        #[arg(long)]
        quarter: Option<u32>,

        /// Year (YYYY)
        #[arg(long)]
        year: Option<i32>,

        /// Bucket size (daily|monthly)
        #[arg(long)]
        granularity: Option<String>,

        #[command(flatten)]
        flags: ReportFlags,
    },
    /// Costs for one year (default: previous year)
    Yearly {
        /// Year (YYYY)
        #[arg(long)]
        year: Option<i32>,

        /// Bucket size (monthly|quarterly)
        #[arg(long)]
        granularity: Option<String>,

        #[command(flatten)]
        flags: ReportFlags,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Print the effective configuration
    Show,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "costrep=debug" } else { "costrep=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_granularity(flag: Option<String>) -> anyhow::Result<Option<Granularity>> {
    Ok(flag.as_deref().map(Granularity::parse).transpose()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load().unwrap_or_default();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        let id = cli
            .format
            .as_deref()
            .unwrap_or(&config.settings.default_format);
        match OutputFormat::parse(id) {
            Some(format) => format,
            None => {
                eprintln!("Unknown output format: '{}'", id);
                std::process::exit(2);
            }
        }
    };
    let use_color = match config.settings.color.as_str() {
        "always" => !cli.no_color,
        "never" => false,
        _ => cli::output::detect_color(!cli.no_color),
    };
    let output_opts = OutputOptions {
        format,
        pretty: cli.pretty,
        use_color,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Daily { start, end, flags } => {
            let selectors = PeriodSelectors {
                start,
                end,
                ..Default::default()
            };
            report_cmd::run(ReportKind::Daily, selectors, flags.into(), &output_opts).await?;
        }
        Commands::Monthly { month, year, flags } => {
            let selectors = PeriodSelectors {
                month,
                year,
                ..Default::default()
            };
            report_cmd::run(ReportKind::Monthly, selectors, flags.into(), &output_opts).await?;
        }
        Commands::Quarterly {
            quarter,
            year,
            granularity,
            flags,
        } => {
            let selectors = PeriodSelectors {
                quarter,
                year,
                granularity: parse_granularity(granularity)?,
                ..Default::default()
            };
            report_cmd::run(ReportKind::Quarterly, selectors, flags.into(), &output_opts).await?;
        }
        Commands::Yearly {
            year,
            granularity,
            flags,
        } => {
            let selectors = PeriodSelectors {
                year,
                granularity: parse_granularity(granularity)?,
                ..Default::default()
            };
            report_cmd::run(ReportKind::Yearly, selectors, flags.into(), &output_opts).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => cli::config_cmd::check(&output_opts)?,
            ConfigAction::Show => cli::config_cmd::show(&output_opts)?,
        },
    }

    Ok(())
}
