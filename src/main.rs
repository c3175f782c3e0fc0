//! localmind - a local-first personal assistant for the command line.

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::ProgressBar;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use localmind::agent::run_agent;
use localmind::config::Config;
use localmind::debug::DebugSession;
use localmind::error::{MindError, Result};
use localmind::llm::{ModelClient, OllamaClient};
use localmind::modes::{self, PromptMode};
use localmind::report;
use localmind::store::{LogRecord, LogStore};
use localmind::sysmon;

#[derive(Parser)]
#[command(name = "localmind")]
#[command(version = "0.1.0")]
#[command(about = "Local-first personal AI assistant", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Working root (defaults to the configured root, then the current directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Ollama model override
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Break a task into clear, actionable steps
    Plan {
        /// The task to plan
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Reflect on a journal entry and track wellbeing metrics
    Journal {
        /// The journal entry
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Generate production-ready code for a task
    Code {
        /// What to build
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Analyze behavior patterns
    Reflect {
        /// The reflection text
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// One-shot debugging advice
    Debug {
        /// The problem description
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },

    /// Interactive multi-turn debugging with confirmation-gated fixes
    DebugInteractive {
        /// The initial problem statement; referenced files are auto-loaded
        #[arg(required = true, trailing_var_arg = true)]
        problem: Vec<String>,
    },

    /// Review a source file
    Codefile {
        /// Path of the file to review
        path: PathBuf,
    },

    /// Multi-step goal planning
    Agent {
        /// The goal to plan for
        #[arg(required = true, trailing_var_arg = true)]
        goal: Vec<String>,
    },

    /// Weekly activity and wellbeing summary
    Weekly,

    /// Read-only system health report
    Sysmon,

    /// Search stored prompts
    Search {
        /// Keyword to search for
        keyword: String,
    },

    /// Delete log records older than the retention window
    Cleanup {
        /// Days of history to keep
        #[arg(default_value = "7")]
        days: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "error:".red().bold());
        std::process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "localmind=debug"
    } else {
        "localmind=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let launch_dir = std::env::current_dir()?;
    let config_root = cli.root.clone().unwrap_or_else(|| launch_dir.clone());
    let mut config = Config::load(&config_root)?;
    if let Some(model) = cli.model {
        config.model = model;
    }

    let root = match cli.root {
        Some(root) => root,
        None => config.resolved_root(&launch_dir),
    };
    let store = LogStore::open(&root)?;
    let client = OllamaClient::new(&config.model).with_timeout(config.timeout_secs);

    match cli.command {
        Commands::Plan { message } => {
            run_prompt_mode(PromptMode::Plan, &message.join(" "), &client, &store).await
        }
        Commands::Journal { message } => {
            run_prompt_mode(PromptMode::Journal, &message.join(" "), &client, &store).await
        }
        Commands::Code { message } => {
            run_prompt_mode(PromptMode::Code, &message.join(" "), &client, &store).await
        }
        Commands::Reflect { message } => {
            run_prompt_mode(PromptMode::Reflect, &message.join(" "), &client, &store).await
        }
        Commands::Debug { message } => {
            run_prompt_mode(PromptMode::Debug, &message.join(" "), &client, &store).await
        }
        Commands::DebugInteractive { problem } => {
            run_debug_interactive(&problem.join(" "), &root, &config, &client, &store).await
        }
        Commands::Codefile { path } => run_codefile(&path, &client, &store).await,
        Commands::Agent { goal } => {
            let goal = goal.join(" ");
            let mut stdout = std::io::stdout();
            let review = run_agent(&client, &goal, &mut stdout).await?;
            store.append(&LogRecord::new("agent", goal, review))?;
            Ok(())
        }
        Commands::Weekly => {
            let cutoff = chrono::Utc::now() - chrono::Duration::days(7);
            let records = store.since(cutoff)?;
            let mut stdout = std::io::stdout();
            report::render(&records, &mut stdout)?;
            Ok(())
        }
        Commands::Sysmon => {
            let mut stdout = std::io::stdout();
            sysmon::run_sysmon(&client, &mut stdout).await
        }
        Commands::Search { keyword } => run_search(&keyword, &store),
        Commands::Cleanup { days } => {
            let removed = store.purge_older_than(days)?;
            if removed == 0 {
                println!("No old logs to clean up.");
            } else {
                println!(
                    "{} Deleted {removed} log entries older than {days} days",
                    "✓".green()
                );
            }
            Ok(())
        }
    }
}

fn thinking_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Run a one-shot prompt mode: build the prompt, query, print, log.
async fn run_prompt_mode(
    mode: PromptMode,
    message: &str,
    client: &dyn ModelClient,
    store: &LogStore,
) -> Result<()> {
    let prompt = mode.build_prompt(message);
    let spinner = thinking_spinner("Thinking...");
    let response = client.query(&prompt).await;
    spinner.finish_and_clear();

    let mut record = LogRecord::new(mode.name(), message, response.clone());

    if mode == PromptMode::Journal {
        if let Some(journal) = modes::parse_journal_response(&response) {
            println!("{}", journal.reflection);
            if let Some(rec) = &journal.recommendation {
                println!("\n{} {rec}", "Suggestion:".cyan());
            }
            println!(
                "\nfocus {}  clarity {}  stress {}",
                score(journal.focus),
                score(journal.clarity),
                score(journal.stress)
            );
            record = record.with_metrics(journal.focus, journal.clarity, journal.stress);
            store.append(&record)?;
            return Ok(());
        }
    }

    println!("{response}");
    store.append(&record)?;
    Ok(())
}

fn score(value: Option<u8>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}/10"))
}

async fn run_codefile(path: &Path, client: &dyn ModelClient, store: &LogStore) -> Result<()> {
    if !path.is_file() {
        return Err(MindError::Other(anyhow::anyhow!(
            "file not found: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    let prompt = modes::build_codefile_prompt(&path.display().to_string(), &content);

    let spinner = thinking_spinner("Reviewing...");
    let response = client.query(&prompt).await;
    spinner.finish_and_clear();

    println!("{response}");
    store.append(&LogRecord::new(
        "codefile",
        path.display().to_string(),
        response,
    ))?;
    Ok(())
}

async fn run_debug_interactive(
    problem: &str,
    root: &Path,
    config: &Config,
    client: &dyn ModelClient,
    store: &LogStore,
) -> Result<()> {
    let session = DebugSession::new(root, client).with_max_turns(config.max_turns);

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout();
    let outcome = session.run(problem, &mut input, &mut stdout).await?;

    writeln!(
        stdout,
        "\nDebug session complete: {} turn(s), {} patch(es) applied.",
        outcome.turns_taken,
        outcome.patches.len()
    )?;

    // One summary record, not the transcript.
    store.append(&LogRecord::new(
        "debug-interactive",
        problem,
        outcome.final_summary(),
    ))?;
    Ok(())
}

fn run_search(keyword: &str, store: &LogStore) -> Result<()> {
    let hits = store.search(keyword)?;
    if hits.is_empty() {
        println!("No entries match '{keyword}'.");
        return Ok(());
    }
    for record in hits {
        let when = record.timestamp.format("%Y-%m-%d %H:%M");
        let preview: String = record.prompt.chars().take(60).collect();
        println!("{when}  {:<17} {preview}", record.mode.cyan());
    }
    Ok(())
}
