//! Roadmap CLI
//!
//! Serves the planner API, prints the curriculum, asks the tutor, generates
//! study content for one task, and writes progress reports.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use roadmap_core::{
    create_router, report_input, week_title, AppState, Config, ContentGateway, ContentRequest,
    DailyPlan, GeminiClient, GeneratedContent, TaskStore, TOTAL_WEEKS,
};
use roadmap_report::{json::JsonGenerator, MarkdownGenerator, ReportGenerator};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

/// TOEIC 800 Roadmap - 21-day study planner with an AI tutor
#[derive(Parser, Debug)]
#[command(name = "roadmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: roadmap.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the planner HTTP API
    Serve {
        /// Port for the HTTP API server
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Print the 21-day curriculum
    Curriculum {
        /// Only print one week (1-3)
        #[arg(
            short,
            long,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(TOTAL_WEEKS))
        )]
        week: Option<u32>,

        /// Print JSON instead of a checklist
        #[arg(long)]
        json: bool,
    },
    /// Ask the AI tutor a question
    Ask {
        /// The question
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Session-context label (default from config)
        #[arg(long)]
        context: Option<String>,
    },
    /// Generate study content for a task
    Study {
        /// Task id, e.g. d3-2
        #[arg(value_name = "TASK_ID")]
        task_id: String,
    },
    /// Write a progress report
    Report {
        /// Task ids to mark as completed before reporting
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        completed: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Md)]
        format: ReportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ReportFormat {
    /// Markdown
    Md,
    /// Pretty-printed JSON
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, "Config file");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Curriculum { week, json } => print_curriculum(week, json),
        Command::Ask { question, context } => ask(&config, &question, context.as_deref()).await,
        Command::Study { task_id } => study(&config, &task_id).await,
        Command::Report {
            completed,
            format,
            output,
        } => report(&completed, format, output.as_deref()),
    }
}

/// Loads configuration from a file or the current directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Resolves the credential and builds the model client.
fn connect(config: &Config) -> anyhow::Result<Arc<GeminiClient>> {
    let client = GeminiClient::from_env(config).map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::debug!(base_url = %config.api_base_url, model = %config.model, "Model client ready");
    Ok(Arc::new(client))
}

// ============================================================================
// Commands
// ============================================================================

async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let model = connect(&config)?;
    print_config(&config);

    let router = create_router(AppState::new(config, model));
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Use --port to specify a different port"
        )
    })?;

    println!("Roadmap API running on http://{addr}");
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
}

fn print_curriculum(week: Option<u32>, json: bool) -> anyhow::Result<()> {
    let store = TaskStore::new();
    let days: Vec<&DailyPlan> = store
        .plans()
        .iter()
        .filter(|plan| week.map_or(true, |w| plan.week() == w))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    let mut current_week = 0;
    for plan in days {
        if plan.week() != current_week {
            current_week = plan.week();
            println!();
            println!("== {} ==", week_title(current_week).unwrap_or_default());
        }
        println!();
        println!("Day {:>2} · {} ({}분)", plan.day, plan.theme, plan.total_minutes());
        for task in &plan.tasks {
            let check = if task.is_completed { "x" } else { " " };
            println!(
                "  [{check}] {:<6} {:<9} {:>3}분  {}",
                task.id,
                task.kind.to_string(),
                task.duration,
                task.title
            );
        }
    }
    Ok(())
}

async fn ask(config: &Config, question: &str, context: Option<&str>) -> anyhow::Result<()> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("Question must not be blank");
    }

    let gateway = ContentGateway::new(connect(config)?, config);
    let context = context.unwrap_or(config.tutor_context.as_str());
    let reply = gateway.tutor_reply(question, context).await;
    println!("{reply}");
    Ok(())
}

async fn study(config: &Config, task_id: &str) -> anyhow::Result<()> {
    let store = TaskStore::new();
    let Some(task) = store.find_task(task_id) else {
        anyhow::bail!(
            "Unknown task '{task_id}'\n\nSuggestion: Run `roadmap curriculum` to list task ids"
        );
    };

    let gateway = ContentGateway::new(connect(config)?, config);
    let request = ContentRequest::for_task(task);
    let plan = request.plan();
    println!(
        "Generating {} min session for {} ({} quizzes, {} examples)...",
        task.duration, task.title, plan.quiz_count, plan.example_count
    );

    match gateway.study_content(&request).await {
        Some(content) => {
            print_content(&content);
            Ok(())
        }
        None => anyhow::bail!("Study content is unavailable. Try again in a moment."),
    }
}

fn report(completed: &[String], format: ReportFormat, output: Option<&Path>) -> anyhow::Result<()> {
    let mut store = TaskStore::new();
    for id in completed {
        let outcome = store.toggle(id.trim());
        if !outcome.found() {
            tracing::warn!(task_id = %id, "Unknown task id ignored");
        }
    }

    let input = report_input(&store);
    let report = ReportGenerator::new(&input).generate()?;

    match (format, output) {
        (ReportFormat::Json, Some(path)) => JsonGenerator::new(&report).write_to_file(path, true)?,
        (ReportFormat::Json, None) => {
            println!("{}", JsonGenerator::new(&report).generate_pretty()?);
        }
        (ReportFormat::Md, Some(path)) => {
            std::fs::write(path, MarkdownGenerator::new(&report).generate())?;
        }
        (ReportFormat::Md, None) => print!("{}", MarkdownGenerator::new(&report).generate()),
    }

    if let Some(path) = output {
        println!("Report written to {}", path.display());
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Model: {}", config.model);
    println!("  API base URL: {}", config.api_base_url);
    println!("  Tutor temperature: {}", config.tutor_temperature);
}

fn print_content(content: &GeneratedContent) {
    println!();
    println!("{}", content.lesson);

    println!();
    println!("Examples:");
    for (i, example) in content.examples.iter().enumerate() {
        println!("  {}. {}", i + 1, example.sentence);
        println!("     {}", example.translation);
    }

    for (i, quiz) in content.quizzes.iter().enumerate() {
        println!();
        println!("Quiz {}/{}: {}", i + 1, content.quizzes.len(), quiz.question);
        for (j, option) in quiz.options.iter().enumerate() {
            let marker = if quiz.is_correct(j) { "*" } else { " " };
            println!("  {marker} {}) {option}", j + 1);
        }
        println!("  → {}", quiz.explanation);
    }
}
