mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use agrilog_core::grouping::GroupingStrategy;

#[derive(Parser)]
#[command(
    name = "agrilog",
    version,
    about = "Farm operations reporting from the intervention journal"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// One mix per parcel and day
    ByParcel,
    /// Parcels sprayed with the same products and doses share a mix
    BySignature,
}

impl From<Strategy> for GroupingStrategy {
    fn from(strategy: Strategy) -> GroupingStrategy {
        match strategy {
            Strategy::ByParcel => GroupingStrategy::ByParcel,
            Strategy::BySignature => GroupingStrategy::BySignature,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    /// Technical itinerary, every intervention by nature
    Itk,
    /// Phytosanitary register
    Phyto,
    /// Fertilization balance
    Ferti,
}

#[derive(Subcommand)]
enum Commands {
    /// List the campaign years present in the journal, newest first
    Campaigns {
        /// Path to the farm workbook (xlsx)
        workbook: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// List planned treatment mixes for a campaign
    Mixes {
        /// Path to the farm workbook (xlsx)
        workbook: PathBuf,

        /// Campaign year
        #[arg(short, long)]
        campaign: i32,

        #[arg(short, long, value_enum, default_value_t = Strategy::ByParcel)]
        strategy: Strategy,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Render per-parcel campaign reports
    Report {
        /// Path to the farm workbook (xlsx)
        workbook: PathBuf,

        /// Campaign year
        #[arg(short, long)]
        campaign: i32,

        #[arg(short, long, value_enum)]
        kind: ReportKind,

        /// Restrict to one parcel
        #[arg(short, long)]
        parcel: Option<String>,

        /// Output directory
        #[arg(short = 'O', long = "out", default_value = "rapports")]
        out: PathBuf,
    },
    /// Render the tank preparation sheet for one mix
    Prep {
        /// Path to the farm workbook (xlsx)
        workbook: PathBuf,

        /// Campaign year
        #[arg(short, long)]
        campaign: i32,

        /// Mix label, or 1-based position in the `mixes` listing
        #[arg(short, long)]
        mix: String,

        /// Spray volume in L/ha, overriding the journal value
        #[arg(long)]
        volume: Option<Decimal>,

        /// Output file
        #[arg(short = 'O', long = "out")]
        out: Option<PathBuf>,
    },
    /// Mark the spray event behind a scanned group id as realized
    Validate {
        /// Path to the farm workbook (xlsx)
        workbook: PathBuf,

        /// Group id, e.g. "A2_Buissons_20240415"
        group_id: String,

        /// Status written on the matched rows
        #[arg(long)]
        status: Option<String>,
    },
    /// Monthly irrigation billing per water meter
    Irrigation {
        /// Path to the farm workbook (xlsx)
        workbook: PathBuf,

        #[arg(short, long)]
        year: i32,

        #[arg(short, long)]
        month: u32,

        /// Hand the bills to the mail sender (dry-run transport)
        #[arg(long)]
        send: bool,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Campaigns { workbook, output } => commands::campaigns::run(workbook, &output),
        Commands::Mixes {
            workbook,
            campaign,
            strategy,
            output,
        } => commands::mixes::run(workbook, campaign, strategy.into(), &output),
        Commands::Report {
            workbook,
            campaign,
            kind,
            parcel,
            out,
        } => commands::report::run(workbook, campaign, kind, parcel.as_deref(), out),
        Commands::Prep {
            workbook,
            campaign,
            mix,
            volume,
            out,
        } => commands::prep::run(workbook, campaign, &mix, volume, out),
        Commands::Validate {
            workbook,
            group_id,
            status,
        } => commands::validate::run(workbook, &group_id, status.as_deref()),
        Commands::Irrigation {
            workbook,
            year,
            month,
            send,
            output,
        } => commands::irrigation::run(workbook, year, month, send, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
