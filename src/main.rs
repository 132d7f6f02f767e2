use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing::{info, warn};

use cf_problems::fetcher::{self, Fetcher};
use cf_problems::{db, extract_problem, ProblemRecord, Settings};

#[derive(Parser)]
#[command(name = "cf_problems", about = "Codeforces problem statement extractor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a problem page and print the extracted record
    Fetch {
        url: String,
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Also store the record in the database
        #[arg(long)]
        save: bool,
    },
    /// Extract records from saved HTML files
    Parse {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// URL to record instead of the file path
        #[arg(long)]
        url: Option<String>,
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Fetch every URL in a file (one per line) and store the results
    Batch { file: PathBuf },
    /// Stored problems overview table
    List {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Filter by difficulty (Easy, Medium, Hard, Unknown)
        #[arg(short, long)]
        difficulty: Option<String>,
    },
    /// Show database statistics
    Stats,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("loading settings")?;

    let result = match cli.command {
        Commands::Fetch { url, format, save } => {
            let fetcher = Fetcher::new(&settings)?;
            let record = fetcher.scrape(&url).await?;
            if save {
                let conn = db::connect(&settings.db_path)?;
                db::init_schema(&conn)?;
                db::save_problem(&conn, &record)?;
                info!(url = %record.url, "saved");
            }
            println!("{}", render(&[record], format)?);
            Ok(())
        }
        Commands::Parse { files, url, format } => {
            let results: Vec<_> = files
                .par_iter()
                .map(|path| parse_file(path, url.as_deref()))
                .collect();

            let mut records = Vec::new();
            for (path, result) in files.iter().zip(results) {
                match result {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
                }
            }
            if records.is_empty() {
                bail!("no problem could be extracted from {} file(s)", files.len());
            }
            println!("{}", render(&records, format)?);
            Ok(())
        }
        Commands::Batch { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let urls = fetcher::read_url_list(&text);
            if urls.is_empty() {
                println!("No URLs in {}.", file.display());
                return Ok(());
            }
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            println!("Scraping {} problems (streaming to DB)...", urls.len());
            let fetcher = Arc::new(Fetcher::new(&settings)?);
            let stats = fetcher::scrape_batch(&conn, fetcher, urls, settings.concurrency).await?;
            println!(
                "Done: {} scraped ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::List { limit, difficulty } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn, difficulty.as_deref(), limit)?;
            if rows.is_empty() {
                println!("No problems found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<8} | {:<32} | {:<10} | {:>6} | {:>3} | {:<30}",
                "#", "Problem", "Title", "Difficulty", "Rating", "Ex", "Tags"
            );
            println!("{}", "-".repeat(110));

            for (i, r) in rows.iter().enumerate() {
                let rating = if r.rating.is_empty() { "-" } else { r.rating.as_str() };
                println!(
                    "{:>3} | {:<8} | {:<32} | {:<10} | {:>6} | {:>3} | {:<30}",
                    i + 1,
                    r.problem_id,
                    truncate(&r.title, 32),
                    r.difficulty,
                    rating,
                    r.examples_count,
                    truncate(&r.tags, 30)
                );
            }

            println!("\n{} problems", rows.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Problems:    {}", s.problems);
            for (difficulty, count) in &s.by_difficulty {
                println!("  {:<10} {}", difficulty, count);
            }
            println!("Failures:    {}", s.failures);
            println!("Unresolved:  {}", s.failed_urls);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }

    result
}

fn parse_file(path: &Path, url: Option<&str>) -> anyhow::Result<ProblemRecord> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let url = url.map(str::to_string).unwrap_or_else(|| path.display().to_string());
    Ok(extract_problem(&html, &url)?)
}

/// One record prints as an object, several as an array.
fn render(records: &[ProblemRecord], format: Format) -> anyhow::Result<String> {
    Ok(match (format, records) {
        (Format::Json, [record]) => serde_json::to_string_pretty(record)?,
        (Format::Json, _) => serde_json::to_string_pretty(records)?,
        (Format::Text, _) => records
            .iter()
            .map(ProblemRecord::to_text)
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
