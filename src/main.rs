use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod db;
mod models;
mod report;
mod risk;
mod stats;
mod trend;

use models::StatsFilter;
use report::{EmptyReport, StatsOutcome};

#[derive(Parser)]
#[command(name = "mood-stats")]
#[command(about = "Employee mood check statistics for WorkPulse HR", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import employees and mood checks from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record one mood check for an employee
    CheckIn {
        #[arg(long)]
        contact: String,
        #[arg(long)]
        mood: String,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Attach a free-text comment to an employee's check on a date
    Comment {
        #[arg(long)]
        contact: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        text: String,
    },
    /// Generate the mood statistics report as JSON
    Stats {
        /// Repeatable; a single id is treated as a one-element set.
        /// Ignored when --group-id is given.
        #[arg(long = "company-id")]
        company_ids: Vec<Uuid>,
        #[arg(long)]
        group_id: Option<Uuid>,
        #[arg(long)]
        start_date: Option<NaiveDate>,
        #[arg(long)]
        end_date: Option<NaiveDate>,
        /// Write the report here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// The four non-fatal exits, in order: no filter, empty population, no
/// records, no valid mood values. Store failures propagate as errors.
async fn run_stats(pool: &PgPool, filter: &StatsFilter) -> anyhow::Result<StatsOutcome> {
    let Some(selection) = filter.selection() else {
        return Ok(StatsOutcome::Empty(EmptyReport::no_filter()));
    };

    let population = db::fetch_employee_ids(pool, &selection)
        .await
        .context("failed to resolve employee population")?;
    if population.is_empty() {
        return Ok(StatsOutcome::Empty(EmptyReport::no_employees()));
    }

    let records = db::fetch_mood_records(pool, &population, filter.start_date, filter.end_date)
        .await
        .context("failed to load mood records")?;

    Ok(report::build_report(filter, population.len(), &records))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} mood checks from {}.", csv.display());
        }
        Commands::CheckIn {
            contact,
            mood,
            date,
            comment,
        } => {
            let checked_on = date.unwrap_or_else(|| Utc::now().date_naive());
            let check_id =
                db::record_check_in(&pool, &contact, &mood, checked_on, comment.as_deref())
                    .await?;
            println!("Recorded mood {mood} on {checked_on} (check {check_id}).");
        }
        Commands::Comment {
            contact,
            date,
            text,
        } => {
            let annotated = db::attach_comment(&pool, &contact, date, &text).await?;
            if annotated == 0 {
                println!("No mood check found on {date} for that contact.");
            } else {
                println!("Annotated {annotated} check(s) on {date}.");
            }
        }
        Commands::Stats {
            company_ids,
            group_id,
            start_date,
            end_date,
            out,
        } => {
            let filter = StatsFilter {
                company_ids: if company_ids.is_empty() {
                    None
                } else {
                    Some(company_ids)
                },
                group_id,
                start_date,
                end_date,
            };
            let outcome = run_stats(&pool, &filter).await?;
            let payload = serde_json::to_string_pretty(&outcome)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, payload)?;
                    println!("Report written to {}.", path.display());
                }
                None => println!("{payload}"),
            }
        }
    }

    Ok(())
}
