//! Command implementations for WXR CLI.
//!
//! Each subcommand loads a directory of ISD-Lite yearly files for one
//! station, computes an index and writes tables for the chart tooling.

use clap::Subcommand;

pub mod analyze;
pub mod density;
pub mod load;
pub mod records;
pub mod winter;

use density::DensityArgs;
use records::{KindArg, RecordOutputs};

#[derive(Subcommand)]
pub enum Command {
    /// Hellmann winter severity curves per winter
    Winter {
        /// Directory with the station's ISD-Lite yearly files (plain or .gz)
        #[arg(short = 'i', long)]
        input_dir: String,

        /// Output path for the per-day severity curves CSV
        #[arg(short = 'o', long)]
        output_csv: String,

        /// Output path for the per-winter score and class CSV
        #[arg(long = "summary")]
        summary_csv: Option<String>,
    },

    /// Per calendar day temperature records and their history
    Records {
        /// Directory with the station's ISD-Lite yearly files (plain or .gz)
        #[arg(short = 'i', long)]
        input_dir: String,

        /// Output path for the record evolution CSV
        #[arg(short = 'o', long)]
        output_csv: String,

        /// Track record highs or record lows
        #[arg(long, value_enum, default_value_t = KindArg::High)]
        kind: KindArg,

        /// Year to age records against (defaults to the last year in the data)
        #[arg(long)]
        reference_year: Option<i32>,

        /// Output path for the record age histogram CSV
        #[arg(long = "histogram")]
        histogram_csv: Option<String>,

        /// Split the histogram by the month each record was set in
        #[arg(long)]
        by_month: bool,

        /// Output path for the current record per day of year
        #[arg(long = "table")]
        table_csv: Option<String>,

        /// Output path for the number of records broken per year
        #[arg(long = "per-year")]
        per_year_csv: Option<String>,
    },

    /// Temperature density estimates over a sliding window of years
    Density {
        /// Directory with the station's ISD-Lite yearly files (plain or .gz)
        #[arg(short = 'i', long)]
        input_dir: String,

        /// Output path for the density windows JSON
        #[arg(short = 'o', long)]
        output_json: String,

        #[command(flatten)]
        density: DensityArgs,
    },

    /// Compute every index concurrently and write all tables to a directory
    Analyze {
        /// Directory with the station's ISD-Lite yearly files (plain or .gz)
        #[arg(short = 'i', long)]
        input_dir: String,

        /// Directory the tables are written to (created if missing)
        #[arg(short = 'd', long)]
        output_dir: String,

        /// Year to age records against (defaults to the last year in the data)
        #[arg(long)]
        reference_year: Option<i32>,

        #[command(flatten)]
        density: DensityArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Winter {
            input_dir,
            output_csv,
            summary_csv,
        } => winter::run_winter(&input_dir, &output_csv, summary_csv.as_deref()).await,
        Command::Records {
            input_dir,
            output_csv,
            kind,
            reference_year,
            histogram_csv,
            by_month,
            table_csv,
            per_year_csv,
        } => {
            let outputs = RecordOutputs {
                histogram_csv,
                by_month,
                table_csv,
                per_year_csv,
            };
            records::run_records(&input_dir, &output_csv, kind.into(), reference_year, &outputs)
                .await
        }
        Command::Density {
            input_dir,
            output_json,
            density,
        } => density::run_density(&input_dir, &output_json, &density).await,
        Command::Analyze {
            input_dir,
            output_dir,
            reference_year,
            density,
        } => analyze::run_analyze(&input_dir, &output_dir, reference_year, &density).await,
    }
}
