//! Nutrilog CLI
//!
//! Command-line front end for the nutrition log:
//! - Search foods and look up nutrition
//! - Run an interactive logging session
//! - Print chart data for a sample day

use clap::{Parser, Subcommand};
use nutrilog::client::{HttpClient, NutritionLookup};
use nutrilog::config::{generate_default_config, Config, LoggingConfig};
use nutrilog::model::{FoodId, FoodRecord};
use nutrilog::projection::Projection;
use nutrilog::session::Session;
use nutrilog::sync::{Notification, RemoteStatus, SelectOutcome};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "nutrilog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Daily nutrition log with chart-ready totals")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the food catalog
    Search {
        /// Free-text query
        query: String,
    },

    /// Show nutrition for one food
    Nutrition {
        /// Food ID
        id: String,
    },

    /// Interactive session: search, select, log and chart
    Session {
        /// Commit a food as soon as it is selected
        #[arg(long)]
        auto_commit: bool,
    },

    /// Print the projection of a sample breakfast
    Demo,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.client.base_url = url.clone();
    }

    init_tracing(&config.logging);

    let json = cli.format == "json";

    match cli.command {
        Commands::Search { query } => {
            let session = Session::from_config(&config)?;
            let outcome = session.coordinator().search(&query).await;

            if let Some(error) = outcome.failure {
                anyhow::bail!(error);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome.results)?);
            } else {
                print_results(&outcome.results);
            }
        }

        Commands::Nutrition { id } => {
            let client = HttpClient::new(config.client.clone())?;
            let profile = client.resolve(&parse_food_id(&id)).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Calories: {:.1}", profile.calories());
                println!("Protein:  {:.1} g", profile.protein());
                println!("Carbs:    {:.1} g", profile.carbs());
                println!("Fat:      {:.1} g", profile.fat());
            }
        }

        Commands::Session { auto_commit } => {
            if auto_commit {
                config.session.auto_commit_on_select = true;
            }
            run_session(&config, json).await?;
        }

        Commands::Demo => {
            let session = Session::from_config(&config)?;
            session.seed_demo().await;
            print_projection(&session.projection().await, json)?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so command output stays pipeable
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nutrilog={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

const SESSION_HELP: &str = "Commands:
  search <query>   Search the catalog
  select <n>       Resolve nutrition for result n
  log              Log the current selection
  chart            Show totals and per-meal data
  status           Show session status
  retry            Retry entries that failed to reach the backend
  reset            Clear the log
  demo             Replace the log with a sample breakfast
  help             Show this help
  quit             Exit";

async fn run_session(config: &Config, json: bool) -> anyhow::Result<()> {
    let mut session = Session::from_config(config)?;
    session.start_background_retry();
    let coordinator = session.coordinator().clone();

    let mut notifications = coordinator.subscribe();
    let notifier = tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            match notification {
                Notification::Failed { message, .. } => eprintln!("! {}", message),
                Notification::OutboxDelivered { delivered, remaining } => {
                    eprintln!("! delivered {} queued entries, {} left", delivered, remaining)
                }
                Notification::Committed { .. } => {}
            }
        }
    });

    println!("Nutrilog session against {}", config.client.base_url);
    println!("{}", SESSION_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {}
            "search" => {
                let outcome = coordinator.search(arg).await;
                if !outcome.stale && outcome.failure.is_none() {
                    print_results(&outcome.results);
                }
            }
            "select" => {
                let results = coordinator.search_results().await;
                let Some(record) = arg
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| results.get(i).cloned())
                else {
                    println!("No result {:?}; run search first", arg);
                    continue;
                };

                match coordinator.select(record).await {
                    SelectOutcome::Selected(entry) => {
                        println!(
                            "Selected {} ({:.1} kcal); type 'log' to add it",
                            entry.title(),
                            entry.nutrition.calories()
                        );
                    }
                    SelectOutcome::Committed(entry, commit) => {
                        print_commit(entry.title(), commit.position, &commit.remote);
                    }
                    SelectOutcome::Failed(_) | SelectOutcome::Stale => {}
                }
            }
            "log" => match coordinator.log_selected().await {
                Some(commit) => {
                    let title = session
                        .snapshot()
                        .await
                        .get(commit.position)
                        .map(|e| e.title().to_string())
                        .unwrap_or_default();
                    print_commit(&title, commit.position, &commit.remote);
                }
                None => println!("Nothing selected"),
            },
            "chart" => print_projection(&session.projection().await, json)?,
            "status" => {
                let status = coordinator.status().await;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            "retry" => {
                let report = coordinator.retry_outbox().await;
                println!("Delivered {}, {} still queued", report.delivered, report.remaining);
            }
            "reset" => {
                session.reset().await;
                println!("Log cleared");
            }
            "demo" => {
                session.seed_demo().await;
                print_projection(&session.projection().await, json)?;
            }
            "help" => println!("{}", SESSION_HELP),
            "quit" | "exit" => break,
            other => println!("Unknown command {:?}; type 'help'", other),
        }
    }

    notifier.abort();
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_commit(title: &str, position: usize, remote: &RemoteStatus) {
    match remote {
        RemoteStatus::Persisted => println!("Logged {} as meal {}", title, position + 1),
        RemoteStatus::Queued(error) => println!(
            "Logged {} as meal {} locally; backend copy queued ({})",
            title,
            position + 1,
            error
        ),
    }
}

fn print_results(results: &[FoodRecord]) {
    if results.is_empty() {
        println!("No results found");
        return;
    }

    println!("{:>3}  {:<12} Title", "#", "ID");
    println!("{}", "-".repeat(48));
    for (i, record) in results.iter().enumerate() {
        println!("{:>3}  {:<12} {}", i + 1, record.id.to_string(), record.title);
    }
}

fn print_projection(projection: &Projection, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&projection.chart_datasets())?);
        return Ok(());
    }

    if projection.per_meal.is_empty() {
        println!("No meals logged yet");
        return Ok(());
    }

    println!(
        "{:<8} {:<24} {:>9} {:>9} {:>9} {:>9}",
        "Meal", "Food", "Calories", "Protein", "Carbs", "Fat"
    );
    println!("{}", "-".repeat(72));
    for point in &projection.per_meal {
        println!(
            "{:<8} {:<24} {:>9.1} {:>9.1} {:>9.1} {:>9.1}",
            point.meal_label, point.label, point.calories, point.protein, point.carbs, point.fat
        );
    }
    println!("{}", "-".repeat(72));

    let totals = &projection.running_totals;
    println!(
        "{:<33} {:>9.1} {:>9.1} {:>9.1} {:>9.1}",
        "Total", totals.calories, totals.protein, totals.carbs, totals.fat
    );

    Ok(())
}

fn parse_food_id(raw: &str) -> FoodId {
    match raw.trim().parse::<i64>() {
        Ok(n) => FoodId::Numeric(n),
        Err(_) => FoodId::Text(raw.trim().to_string()),
    }
}
