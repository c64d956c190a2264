use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use healthscore::output::{self, ScoredRow};
use healthscore::scoring::{self, ClientPhase, HealthConfig};
use healthscore::store::{self, MemoryStore, WorkspaceData};
use healthscore::sync;

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every project, worst first (default if no subcommand)
    Projects,
    /// Score every client relationship, worst first
    Clients,
    /// Recompute project scores and write them back to the workspace file
    Sync {
        /// Projects scored at once (overrides the config file)
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Validate the config file and report every problem
    Check,
}

#[derive(Parser, Debug)]
#[command(name = "healthscore")]
#[command(about = "Project and client health scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Show the factors behind each score
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print tab-separated rows instead of a table
    #[arg(long, global = true)]
    tsv: bool,

    /// Path to config file (defaults to ~/.config/healthscore/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to workspace file (defaults to ~/.config/healthscore/workspace.json)
    #[arg(short, long, global = true)]
    data: Option<String>,

    /// Log filter, e.g. "info" or "healthscore=debug"
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose && cli.log_level == "warn" {
        "debug"
    } else {
        cli.log_level.as_str()
    };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_data(path: &std::path::Path) -> WorkspaceData {
    match store::load_workspace(path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Workspace error: {:#}", e);
            std::process::exit(EXIT_DATA);
        }
    }
}

fn print_rows(rows: &[ScoredRow], tsv: bool, use_colors: bool) {
    if tsv {
        println!("{}", output::format_tsv(rows));
    } else {
        println!("{}", output::format_scored_table(rows, use_colors));
    }
}

#[tokio::main]
async fn main() {
    let mut cli = Cli::parse();
    init_logging(&cli);

    let command = cli.command.take().unwrap_or(Commands::Projects);
    let start_time = Instant::now();
    let now = Utc::now();

    // Load config
    let config_path = cli.config.clone().map(PathBuf::from);
    let config = match healthscore::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate scoring config at startup
    let scoring_config = config.scoring.clone().unwrap_or_default();
    if let Err(errors) = scoring::validate_scoring(&scoring_config) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
    let base: HealthConfig = match scoring_config.resolve() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if matches!(command, Commands::Check) {
        println!("Config OK");
        std::process::exit(EXIT_SUCCESS);
    }

    let data_path = cli
        .data
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(store::get_workspace_path);
    let data = load_data(&data_path);
    let use_colors = output::should_use_colors();

    if cli.verbose {
        eprintln!(
            "Loaded workspace {} ({} projects, {} clients)",
            data.id,
            data.projects.len(),
            data.clients.len()
        );
    }

    match command {
        Commands::Projects => {
            let effective = data.settings.apply(&base);
            let mut scored: Vec<_> = data
                .projects
                .iter()
                .map(|p| (p, scoring::score_project(p, &effective, now)))
                .collect();

            // Worst first, then oldest activity first for ties
            scored.sort_by(|a, b| {
                a.1.score.cmp(&b.1.score).then_with(|| {
                    a.0.subject
                        .last_activity(now)
                        .cmp(&b.0.subject.last_activity(now))
                })
            });

            let rows: Vec<ScoredRow> = scored
                .iter()
                .map(|(p, result)| ScoredRow {
                    id: &p.subject.id,
                    name: &p.subject.title,
                    score: result.score,
                    status: result.status,
                    note: Some(format!(
                        "idle {}",
                        output::format_age(now - p.subject.last_activity(now))
                    )),
                })
                .collect();

            print_rows(&rows, cli.tsv, use_colors);

            if cli.verbose && !cli.tsv {
                for (p, result) in &scored {
                    println!();
                    println!("{} ({})", p.subject.title, result.score);
                    println!("{}", output::format_breakdown(&result.breakdown, use_colors));
                }
                println!();
                println!(
                    "Workspace average: {}",
                    scoring::average_health(data.projects.iter().map(|p| &p.subject))
                );
            }
        }
        Commands::Clients => {
            let effective = data.settings.apply(&base);
            let mut scored: Vec<_> = data
                .clients
                .iter()
                .map(|c| (c, scoring::score_client(c, &effective, now)))
                .collect();
            scored.sort_by(|a, b| a.1.score.cmp(&b.1.score));

            let rows: Vec<ScoredRow> = scored
                .iter()
                .map(|(c, result)| {
                    let note = match (result.phase, result.override_applied, result.worst_tier) {
                        (ClientPhase::Learning, _, _) => Some("learning".to_string()),
                        (_, true, _) => Some("payment override".to_string()),
                        (_, false, Some(tier)) => Some(format!("{} overdue", tier)),
                        _ => None,
                    };
                    ScoredRow {
                        id: &c.client.id,
                        name: &c.client.name,
                        score: result.score,
                        status: result.status,
                        note,
                    }
                })
                .collect();

            print_rows(&rows, cli.tsv, use_colors);

            if cli.verbose && !cli.tsv {
                for (c, result) in &scored {
                    println!();
                    println!("{} ({})", c.client.name, result.score);
                    println!("{}", output::format_breakdown(&result.breakdown, use_colors));
                }
            }
        }
        Commands::Sync { concurrency } => {
            let concurrency = concurrency
                .or(config.sync_concurrency)
                .unwrap_or(sync::DEFAULT_CONCURRENCY);
            let workspace_id = data.id.clone();
            let memory = MemoryStore::new(data);

            let report =
                match sync::sync_workspace_health(&memory, &workspace_id, &base, now, concurrency)
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        eprintln!("Sync error: {}", e);
                        std::process::exit(EXIT_DATA);
                    }
                };

            let updated = match memory.into_inner() {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("Sync error: {}", e);
                    std::process::exit(EXIT_DATA);
                }
            };
            if let Err(e) = store::save_workspace(&data_path, &updated) {
                eprintln!("Failed to save workspace: {:#}", e);
                std::process::exit(EXIT_DATA);
            }

            for alert in report.alerts() {
                println!("{}", output::format_alert(alert, use_colors));
            }
            for (project_id, error) in &report.failures {
                eprintln!("Failed to sync {}: {}", project_id, error);
            }
            println!(
                "Synced {} projects ({} failed)",
                report.outcomes.len(),
                report.failures.len()
            );
        }
        // Handled before the workspace is loaded
        Commands::Check => {}
    }

    if cli.verbose {
        eprintln!("Done in {:?}", start_time.elapsed());
    }

    std::process::exit(EXIT_SUCCESS);
}
