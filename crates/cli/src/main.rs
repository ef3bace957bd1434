use anyhow::{bail, Context, Result};
use chrono::{Duration as DateDelta, NaiveDate};
use clap::{Parser, Subcommand};
use colored::Colorize;
use feature_store::{BookingForm, BookingRequest, Cuisine, CustomerId, FeatureStore};
use rand::Rng;
use recommender::{ArtifactBundle, ArtifactConfig, DishRecommender, Prediction, DEFAULT_TOP_K};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// DishRecs - Dish recommendations for hotel bookings
#[derive(Parser)]
#[command(name = "dish-recs")]
#[command(about = "Recommend dishes for a hotel booking using fitted model artifacts", long_about = None)]
struct Cli {
    /// Directory holding feature tables, encoder, model and label artifacts
    #[arg(short, long, env = "DISH_RECS_ARTIFACTS", default_value = "artifacts")]
    artifacts_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend dishes for a booking
    Recommend {
        /// Existing customer id; a new one is issued when omitted
        #[arg(long)]
        customer_id: Option<CustomerId>,

        /// Preferred cuisine (South Indian, North Indian, Multi)
        #[arg(long)]
        cuisine: Cuisine,

        /// Guest age (18-120)
        #[arg(long)]
        age: u32,

        /// Check-in date, YYYY-MM-DD
        #[arg(long)]
        check_in: NaiveDate,

        /// Check-out date, YYYY-MM-DD
        #[arg(long)]
        check_out: NaiveDate,

        /// Number of guests staying (1-3)
        #[arg(long, default_value = "1")]
        stayers: u32,

        /// Booking paid with loyalty points
        #[arg(long)]
        points: bool,

        /// Number of dishes to recommend
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Also print the probability of every dish
        #[arg(long)]
        all: bool,
    },

    /// List the loaded feature tables
    Tables,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ArtifactConfig::from_dir(&cli.artifacts_dir)
        .context("Failed to read artifact configuration")?;

    match cli.command {
        Commands::Recommend {
            customer_id,
            cuisine,
            age,
            check_in,
            check_out,
            stayers,
            points,
            top,
            all,
        } => {
            let form = BookingForm {
                customer_id: customer_id.unwrap_or_else(new_customer_id),
                preferred_cuisine: cuisine,
                age,
                check_in_date: check_in,
                check_out_date: check_out,
                booked_through_points: points,
                number_of_stayers: stayers,
            };
            let recommender = load_recommender(&config)?.with_top_k(top);
            handle_recommend(&recommender, form, customer_id.is_none(), all)?
        }
        Commands::Tables => handle_tables(&config)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(load_recommender(&config)?, requests, concurrent).await?,
    }

    Ok(())
}

fn load_recommender(config: &ArtifactConfig) -> Result<DishRecommender> {
    println!("Loading artifacts...");
    let start = Instant::now();
    let bundle = ArtifactBundle::load(config).context("Failed to load model artifacts")?;
    println!("{} Loaded artifacts in {:?}", "✓".green(), start.elapsed());
    Ok(DishRecommender::new(Arc::new(bundle)))
}

/// Customer ids issued to guests booking for the first time
fn new_customer_id() -> CustomerId {
    rand::rng().random_range(10001..=99999)
}

fn coupon_code() -> String {
    format!("HOTEL{}", rand::rng().random_range(1000..=9999))
}

/// Handle the 'recommend' command
fn handle_recommend(
    recommender: &DishRecommender,
    form: BookingForm,
    new_customer: bool,
    all: bool,
) -> Result<()> {
    let booking = BookingRequest::new(form).context("Invalid booking")?;

    if new_customer {
        println!(
            "{} Issued customer id {}",
            "•".cyan(),
            booking.customer_id().to_string().bold()
        );
    }
    if booking.stay().stay_duration < 0 {
        println!(
            "{} Check-out is before check-in ({} nights)",
            "!".yellow(),
            booking.stay().stay_duration
        );
    }

    let recommendations = recommender
        .recommend(&booking)
        .context("Failed to compute recommendations")?;
    print_recommendations(&recommendations);

    if all {
        let distribution = recommender
            .distribution(&booking)
            .context("Failed to compute dish probabilities")?;
        println!("{}", "All dishes:".bold());
        for dish in &distribution {
            println!("  {:<24} {:.4}", dish.label, dish.probability);
        }
    }

    println!(
        "\n{} Booking confirmed. Discount coupon: {}",
        "✓".green(),
        coupon_code().bold().yellow()
    );
    Ok(())
}

/// Handle the 'tables' command
fn handle_tables(config: &ArtifactConfig) -> Result<()> {
    let tables: Vec<&str> = config.tables.iter().map(String::as_str).collect();
    let store = FeatureStore::load_tables(&config.features_dir, &tables)
        .context("Failed to load feature tables")?;

    println!(
        "{}",
        format!("Feature tables in {}:", config.features_dir.display())
            .bold()
            .blue()
    );
    for table in store.tables() {
        let key = table
            .join_key()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "none".red().to_string());
        println!(
            "  {:<30} key: {:<18} rows: {:<6} features: {}",
            table.name(),
            key,
            table.row_count(),
            table.feature_columns().collect::<Vec<_>>().join(", ")
        );
    }

    let (table_count, row_count) = store.counts();
    println!("{} tables, {} rows", table_count, row_count);
    Ok(())
}

/// A plausible booking drawn at random
fn random_booking(rng: &mut impl Rng, first_day: NaiveDate) -> Result<BookingRequest> {
    let cuisines = [Cuisine::SouthIndian, Cuisine::NorthIndian, Cuisine::Multi];
    let check_in = first_day + DateDelta::days(rng.random_range(0..365));
    let check_out = check_in + DateDelta::days(rng.random_range(1..=7));

    let booking = BookingRequest::new(BookingForm {
        customer_id: rng.random_range(10001..=99999),
        preferred_cuisine: cuisines[rng.random_range(0..cuisines.len())].clone(),
        age: rng.random_range(18..=75),
        check_in_date: check_in,
        check_out_date: check_out,
        booked_through_points: rng.random_bool(0.3),
        number_of_stayers: rng.random_range(1..=3),
    })?;
    Ok(booking)
}

/// Latency at quantile `q` of an ascending list
fn percentile(sorted: &[Duration], q: f64) -> Duration {
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[idx]
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    recommender: DishRecommender,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    if requests == 0 {
        bail!("Benchmark needs at least one request");
    }

    let first_day = NaiveDate::from_ymd_opt(2026, 1, 1).context("Invalid benchmark start date")?;
    let bookings: Vec<BookingRequest> = {
        let mut rng = rand::rng();
        (0..requests)
            .map(|_| random_booking(&mut rng, first_day))
            .collect::<Result<_>>()?
    };

    info!(
        "Starting benchmark: {} requests, {} concurrent",
        requests, concurrent
    );

    // Bound the number of in-flight requests
    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();

    let mut handles = Vec::with_capacity(requests);
    for booking in bookings {
        let recommender = recommender.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                recommender.recommend(&booking)?;
                Ok::<_, anyhow::Error>(start.elapsed())
            })
            .await?
        }));
    }

    let mut timings = Vec::with_capacity(requests);
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(&timings, 0.50));
    println!("P95 latency: {:?}", percentile(&timings, 0.95));
    println!("P99 latency: {:?}", percentile(&timings, 0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[Prediction]) {
    println!("{}", "Recommended dishes:".bold().blue());
    for (rank, dish) in recommendations.iter().enumerate() {
        println!(
            "{}. {} - probability {:.3}",
            (rank + 1).to_string().green(),
            dish.label.bold(),
            dish.probability
        );
    }
}
