//! Brainlift CLI
//!
//! Command-line front end for the expert ranking engine:
//! - Inspecting the expert roster of a document
//! - Building evidence profiles with fallback scores
//! - Running a full refresh (oracle or fallback) into an expert ledger
//! - Managing stored experts (follow, unfollow, delete)

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brainlift_evidence::{
    batch_max_citations, build_profiles, estimate_score, parse_roster, BrainliftDocument,
    CitationOverrides, NoOverrides, StaticOverrides,
};
use brainlift_oracle::{
    BackendChoice, ConfigOverrides, OracleConfig, RankingAdapter, RefreshCoordinator,
};
use brainlift_storage::{ExpertId, ExpertLedger, ExpertStore};

mod render;

#[derive(Parser)]
#[command(name = "brainlift")]
#[command(author, version, about = "Brainlift: rank the experts behind a fact ledger")]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the expert roster parsed from a plain-text document
    Roster {
        /// Document text file
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Build evidence profiles and fallback scores for a brainlift
    Profiles {
        /// Brainlift JSON (id, title, originalContent, facts, readingList)
        input: PathBuf,
        /// Citation overrides: none, curated, or a JSON file of name → count
        #[arg(long, default_value = "none")]
        overrides: String,
        #[arg(long)]
        json: bool,
    },

    /// Refresh a brainlift's experts: profile, rank, and store
    Rank {
        /// Brainlift JSON
        input: PathBuf,
        /// Oracle backend: auto, none, openrouter, openai, anthropic
        #[arg(long, env = "BRAINLIFT_ORACLE_BACKEND")]
        backend: Option<BackendChoice>,
        /// Oracle timeout in seconds
        #[arg(long, env = "BRAINLIFT_ORACLE_TIMEOUT_SECS")]
        timeout_secs: Option<u64>,
        #[arg(long, default_value = "none")]
        overrides: String,
        /// Expert ledger file; results are not persisted without it
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },

    /// Stored expert management
    Experts {
        #[command(subcommand)]
        command: ExpertCommands,
    },
}

#[derive(Subcommand)]
enum ExpertCommands {
    /// All experts of a brainlift, highest score first
    List {
        brainlift_id: i64,
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Followed experts of a brainlift
    Following {
        brainlift_id: i64,
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Followed experts as name/handle pairs for downstream search
    Prioritized {
        brainlift_id: i64,
        #[arg(long)]
        store: PathBuf,
    },
    Follow {
        expert_id: ExpertId,
        #[arg(long)]
        store: PathBuf,
    },
    Unfollow {
        expert_id: ExpertId,
        #[arg(long)]
        store: PathBuf,
    },
    Delete {
        expert_id: ExpertId,
        #[arg(long)]
        store: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Roster { input, json } => cmd_roster(&input, json),
        Commands::Profiles {
            input,
            overrides,
            json,
        } => cmd_profiles(&input, &overrides, json),
        Commands::Rank {
            input,
            backend,
            timeout_secs,
            overrides,
            store,
            json,
        } => {
            let config = OracleConfig::from_env(&ConfigOverrides {
                backend,
                timeout_secs,
            })
            .context("invalid oracle configuration")?;
            cmd_rank(&input, config, &overrides, store.as_deref(), json).await
        }
        Commands::Experts { command } => cmd_experts(command),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn load_document(path: &Path) -> Result<BrainliftDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a brainlift JSON document", path.display()))
}

fn load_overrides(choice: &str) -> Result<Arc<dyn CitationOverrides>> {
    let overrides: Arc<dyn CitationOverrides> = match choice.trim() {
        "" | "none" => Arc::new(NoOverrides),
        "curated" => Arc::new(StaticOverrides::curated()),
        path => Arc::new(StaticOverrides::from_json_file(Path::new(path))?),
    };
    Ok(overrides)
}

fn open_store(path: &Path) -> Result<ExpertLedger> {
    ExpertLedger::open(path).with_context(|| format!("failed to open ledger {}", path.display()))
}

fn cmd_roster(input: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let mentions = parse_roster(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&mentions)?);
    } else {
        render::print_roster(&mentions);
    }
    Ok(())
}

fn cmd_profiles(input: &Path, overrides: &str, json: bool) -> Result<()> {
    let document = load_document(input)?;
    let overrides = load_overrides(overrides)?;
    let profiles = build_profiles(
        &parse_roster(&document.original_content),
        &document.facts,
        &document.original_content,
        &document.reading_list,
        overrides.as_ref(),
    );
    let max = batch_max_citations(&profiles);
    let scored: Vec<_> = profiles
        .iter()
        .map(|p| (p, estimate_score(p, max)))
        .collect();

    if json {
        let rows: Vec<_> = scored
            .iter()
            .map(|(profile, score)| -> Result<serde_json::Value> {
                let mut row = serde_json::to_value(profile)?;
                row["fallbackScore"] = serde_json::json!(score);
                Ok(row)
            })
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        render::print_profiles(&document, &scored);
    }
    Ok(())
}

async fn cmd_rank(
    input: &Path,
    config: OracleConfig,
    overrides: &str,
    store: Option<&Path>,
    json: bool,
) -> Result<()> {
    let document = load_document(input)?;
    let overrides = load_overrides(overrides)?;
    let ledger: Arc<dyn ExpertStore> = match store {
        Some(path) => Arc::new(open_store(path)?),
        None => Arc::new(ExpertLedger::in_memory()),
    };

    tracing::info!(backend = config.backend.name(), timeout = ?config.timeout, "ranking");
    let coordinator = RefreshCoordinator::new(ledger, RankingAdapter::from_config(&config), overrides);
    let outcome = coordinator.refresh(&document).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.stored)?);
    } else {
        render::print_outcome(&document, &outcome);
        if let Some(path) = store {
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
    }
    Ok(())
}

fn cmd_experts(command: ExpertCommands) -> Result<()> {
    match command {
        ExpertCommands::List {
            brainlift_id,
            store,
            json,
        } => {
            let rows = open_store(&store)?.experts_for(brainlift_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                render::print_stored(brainlift_id, &rows);
            }
        }
        ExpertCommands::Following {
            brainlift_id,
            store,
            json,
        } => {
            let rows = open_store(&store)?.followed_experts(brainlift_id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                render::print_stored(brainlift_id, &rows);
            }
        }
        ExpertCommands::Prioritized {
            brainlift_id,
            store,
        } => {
            let rows = open_store(&store)?.prioritized_experts(brainlift_id)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        ExpertCommands::Follow { expert_id, store } => {
            set_following(&store, expert_id, true)?;
        }
        ExpertCommands::Unfollow { expert_id, store } => {
            set_following(&store, expert_id, false)?;
        }
        ExpertCommands::Delete { expert_id, store } => {
            open_store(&store)?
                .delete_expert(expert_id)
                .map_err(|e| anyhow!("cannot delete expert: {e}"))?;
            eprintln!("{} deleted expert {}", "ok".green().bold(), expert_id);
        }
    }
    Ok(())
}

fn set_following(store: &Path, expert_id: ExpertId, following: bool) -> Result<()> {
    let row = open_store(store)?
        .set_following(expert_id, following)
        .map_err(|e| anyhow!("cannot update expert: {e}"))?;
    eprintln!(
        "{} {} {}",
        "ok".green().bold(),
        if following { "following" } else { "unfollowed" },
        row.expert.name.bold()
    );
    Ok(())
}
