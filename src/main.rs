mod config;
mod db;
mod fetch;
mod logging;
mod mirror;
mod model;
mod monitor;
mod sites;
mod specs;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::error;

use crate::config::Settings;
use crate::db::Store;
use crate::fetch::HttpClient;

#[derive(Parser)]
#[command(name = "notebook_monitor", about = "Notebook price monitor for Brazilian marketplaces")]
struct Cli {
    /// Settings file (default: ./monitor.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides settings)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search every site for every model and store the prices
    Run {
        /// Result pages per site (overrides settings)
        #[arg(short = 'p', long)]
        pages: Option<u32>,
        /// Mirror file path (overrides settings)
        #[arg(long, conflicts_with = "no_mirror")]
        mirror: Option<PathBuf>,
        /// Skip the mirror file
        #[arg(long)]
        no_mirror: bool,
    },
    /// Create the database schema
    Init,
    /// Most recently stored products
    Latest {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Stored product counts per site
    Stats,
    /// Print the specs extracted from a listing title
    Extract { title: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        settings.database_path = db;
    }
    logging::init(settings.log_file.as_deref());

    let t0 = Instant::now();

    let result = match cli.command {
        Commands::Run {
            pages,
            mirror,
            no_mirror,
        } => {
            if let Some(p) = pages {
                settings.pages_per_site = p;
            }
            let mirror_path = if no_mirror {
                None
            } else {
                mirror.or_else(|| settings.mirror_path.clone())
            };

            // Nothing is fetched unless results can be stored.
            let store = Store::open(&settings.database_path).inspect_err(|e| {
                error!("Persistence unavailable, aborting run: {}", e);
            })?;
            let http = HttpClient::new(settings.request_timeout(), settings.user_agents.clone())?;
            let sites = sites::all(&settings);

            let summary =
                monitor::run(&settings, &store, &http, &sites, mirror_path.as_deref()).await?;
            store.close()?;
            println!(
                "Found {} | persisted {} | failed {} | mirrored {} | {}",
                summary.found,
                summary.persisted,
                summary.failed,
                summary.mirrored,
                format_duration(summary.elapsed)
            );
            Ok(())
        }
        Commands::Init => {
            let store = Store::open(&settings.database_path)?;
            store.close()?;
            println!("Schema ready at {}", settings.database_path.display());
            Ok(())
        }
        Commands::Latest { limit } => {
            let store = Store::open(&settings.database_path)?;
            let rows = store.latest(limit)?;
            if rows.is_empty() {
                println!("No products stored yet. Run 'run' first.");
                return Ok(());
            }

            println!(
                "{:>5} | {:<12} | {:<40} | {:<14} | {:<12} | {:<6} | {:<10} | {:<10} | {:<6} | Link",
                "id", "Site", "Title", "Price", "CPU", "RAM", "Storage", "GPU", "Screen"
            );
            println!("{}", "-".repeat(150));
            for r in &rows {
                println!(
                    "{:>5} | {:<12} | {:<40} | {:<14} | {:<12} | {:<6} | {:<10} | {:<10} | {:<6} | {}",
                    r.id,
                    truncate(&r.site, 12),
                    truncate(&r.titulo, 40),
                    truncate(&r.preco, 14),
                    truncate(&r.processador, 12),
                    r.ram,
                    r.armazenamento,
                    truncate(&r.gpu, 10),
                    r.tela,
                    r.link
                );
            }
            println!("\n{} products | last seen {}", rows.len(), rows[0].data_hora);
            Ok(())
        }
        Commands::Stats => {
            let store = Store::open(&settings.database_path)?;
            let s = store.stats()?;
            println!("Products: {}", s.total);
            for (site, count) in &s.per_site {
                println!("  {:<14} {}", site, count);
            }
            println!("Last run: {}", s.last_run.as_deref().unwrap_or("-"));
            Ok(())
        }
        Commands::Extract { title } => {
            let specs = specs::extract(&title);
            let json = serde_json::to_string_pretty(&specs).context("Failed to encode specs")?;
            println!("{}", json);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "notebook_monitor",
            "--db",
            "x.sqlite",
            "run",
            "-p",
            "1",
            "--no-mirror",
        ]);
        assert_eq!(cli.db, Some(PathBuf::from("x.sqlite")));
        assert!(matches!(
            cli.command,
            Commands::Run {
                pages: Some(1),
                no_mirror: true,
                mirror: None
            }
        ));
    }

    #[test]
    fn truncate_and_durations() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Notebook Asus Vivobook", 10), "Noteboo...");
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
    }
}
