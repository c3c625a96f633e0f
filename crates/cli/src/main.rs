use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use docstore::{Document, MemoryDatabase};
use ranking::{Page, RankMode, RecommendRequest};
use serde_json::Value;
use server::{Config, ListingQuery, PetCatalog};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

const CATEGORIES: [&str; 4] = ["dog", "cat", "rabbit", "bird"];
const LOCATIONS: [&str; 4] = ["Dhaka", "Chittagong", "Sylhet", "Khulna"];

/// PawRecs - pet listing pages and recommendations
#[derive(Parser)]
#[command(name = "paw-recs")]
#[command(about = "Browse and rank pet adoption listings", long_about = None)]
struct Cli {
    /// Directory holding pets.json and users.json (default: $PAW_DATA_DIR or ./data)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through available (un-adopted) pets, newest first
    List {
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive substring of the pet's name
        #[arg(long)]
        search: Option<String>,

        /// Page size; non-numeric values fall back to the default
        #[arg(long)]
        limit: Option<String>,

        /// Offset of the first listing on the page
        #[arg(long)]
        cursor: Option<String>,
    },

    /// Page through one lister's own pets, adopted ones included
    Mine {
        #[arg(long)]
        lister: String,

        #[arg(long)]
        limit: Option<String>,

        #[arg(long)]
        cursor: Option<String>,
    },

    /// Recommend pets for a set of categories near a location
    Recommend {
        /// Category to include (repeatable)
        #[arg(long = "category", required = true)]
        categories: Vec<String>,

        #[arg(long)]
        location: String,

        /// Number of recommendations (capped at the configured ceiling)
        #[arg(long)]
        limit: Option<usize>,

        /// Rank by location and freshness score instead of recency
        #[arg(long)]
        advanced: bool,
    },

    /// Show a single listing with its lister's public profile
    Show {
        #[arg(long)]
        id: String,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    println!("Loading listings from {}...", config.data_dir.display());
    let start = Instant::now();
    let db = MemoryDatabase::load_from_dir(&config.data_dir)
        .context("Failed to load seed data")?;
    println!("{} Loaded listings in {:?}", "✓".green(), start.elapsed());

    let catalog = PetCatalog::from_database(&db, &config)?;

    match cli.command {
        Commands::List {
            category,
            search,
            limit,
            cursor,
        } => {
            let query = ListingQuery {
                category,
                search,
                lister: None,
            };
            let page = catalog
                .available_pets(&query, limit.as_deref(), cursor.as_deref())
                .await?;
            print_page("Available pets", &page);
        }
        Commands::Mine {
            lister,
            limit,
            cursor,
        } => {
            let page = catalog
                .listings_by(&lister, limit.as_deref(), cursor.as_deref())
                .await?;
            print_page(&format!("Pets added by {lister}"), &page);
        }
        Commands::Recommend {
            categories,
            location,
            limit,
            advanced,
        } => {
            let limit = limit.unwrap_or(catalog.recommend_limits().default);
            let mode = if advanced {
                RankMode::Advanced
            } else {
                RankMode::Basic
            };
            let request = RecommendRequest::new(categories, location, limit);
            let ranked = catalog.recommend(&request, mode).await?;
            print_recommendations(&ranked, mode);
        }
        Commands::Show { id } => handle_show(&catalog, &id).await?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(catalog, requests, concurrent).await?,
    }

    Ok(())
}

async fn handle_show(catalog: &PetCatalog, id: &str) -> Result<()> {
    let pet = catalog.listing(id).await?;

    println!("{}", format!("Listing {}", id).bold().blue());
    for field in ["name", "category", "location", "adopted", "created_at"] {
        println!("{}{}: {}", "• ".green(), field, field_text(&pet, field));
    }
    match pet.get("added_by").and_then(Value::as_object) {
        Some(lister) => println!(
            "{}Listed by: {} ({})",
            "• ".cyan(),
            field_text(lister, "name"),
            field_text(lister, "photo")
        ),
        None => println!("{}Listed by: unknown", "• ".cyan()),
    }
    Ok(())
}

/// Fire a mix of page and recommendation requests with bounded concurrency.
async fn handle_benchmark(catalog: PetCatalog, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));

    let wall = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for i in 0..requests {
        let catalog = catalog.clone();
        let permits = permits.clone();
        let cursor = (rand::random::<u32>() % 20).to_string();
        let category = CATEGORIES[rand::random::<u32>() as usize % CATEGORIES.len()];
        let location = LOCATIONS[rand::random::<u32>() as usize % LOCATIONS.len()];

        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let start = Instant::now();
            match i % 3 {
                0 => {
                    catalog
                        .available_pets(&ListingQuery::default(), None, Some(&cursor))
                        .await?;
                }
                1 => {
                    let request = RecommendRequest::new([category], location, 12);
                    catalog.recommend(&request, RankMode::Basic).await?;
                }
                _ => {
                    let request = RecommendRequest::new([category], location, 12);
                    catalog.recommend(&request, RankMode::Advanced).await?;
                }
            }
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall = wall.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let avg = total / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p) as usize];
    let throughput = requests as f64 / wall.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Wall time: {:?}", wall);
    println!("Average latency: {:?}", avg);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_page(title: &str, page: &Page) {
    println!(
        "{}",
        format!("{} ({} of {}):", title, page.items.len(), page.total)
            .bold()
            .blue()
    );
    for (i, pet) in page.items.iter().enumerate() {
        println!(
            "{}. {} [{}] {}",
            (page.cursor + i + 1).to_string().green(),
            field_text(pet, "name"),
            field_text(pet, "category"),
            field_text(pet, "location")
        );
    }

    let previous = page.previous_id.map(|p| p.to_string());
    let next = page.next_id.map(|n| n.to_string());
    println!(
        "previous: {}  next: {}",
        previous.as_deref().unwrap_or("-"),
        next.as_deref().unwrap_or("-")
    );
}

fn print_recommendations(ranked: &[Document], mode: RankMode) {
    println!("{}", format!("{:?} recommendations:", mode).bold().blue());
    for (i, pet) in ranked.iter().enumerate() {
        let lister = pet
            .get("added_by")
            .and_then(Value::as_object)
            .map(|l| field_text(l, "name"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}. {} [{}] {} - listed by {}",
            (i + 1).to_string().green(),
            field_text(pet, "name"),
            field_text(pet, "category"),
            field_text(pet, "location"),
            lister
        );
    }
}

fn field_text(doc: &Document, field: &str) -> String {
    match doc.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}
