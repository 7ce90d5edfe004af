//! # Review Harness CLI (`rvw`)
//!
//! The `rvw` binary drives the review pipeline: initialize the index,
//! review a repository, browse saved reports, ask questions over the
//! accumulated reviews, and start the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! rvw --config ./config/review.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rvw init` | Create the SQLite review index (idempotent) |
//! | `rvw review <url-or-path>` | Clone (or use a local tree) and review every file |
//! | `rvw reports list` | List saved review reports for a scope |
//! | `rvw reports show <n>` | Print one report by sequence id |
//! | `rvw ask "<question>"` | Answer a question over the indexed reviews |
//! | `rvw user register <name>` | Register a user in the flat-file store |
//! | `rvw serve` | Start the HTTP server |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use review_harness::clone;
use review_harness::collect;
use review_harness::config;
use review_harness::db;
use review_harness::embedding::create_embedder;
use review_harness::index::ReviewIndex;
use review_harness::llm::OllamaGenerator;
use review_harness::migrate;
use review_harness::models::{ReviewStatus, ScopeKey};
use review_harness::progress::{ProgressMode, ReviewProgressEvent};
use review_harness::qa;
use review_harness::reports::ReportStore;
use review_harness::review::{run_review, RunOptions};
use review_harness::server;
use review_harness::users::UserStore;

/// Review Harness CLI — a local-first automated code review pipeline with
/// vector-indexed review search.
#[derive(Parser)]
#[command(
    name = "rvw",
    about = "Review Harness — a local-first automated code review pipeline",
    version,
    long_about = "Review Harness clones a repository, sends each file to a locally \
    hosted model for review, stores the reviews as embeddings in a SQLite vector \
    index, and answers follow-up questions over the accumulated reviews."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/review.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the review index schema.
    ///
    /// Creates the SQLite database file and the review_vectors table.
    /// Running it multiple times is safe.
    Init,

    /// Review a repository.
    ///
    /// The target is cloned when it looks like a URL, otherwise treated as
    /// a local project root. Every file matching the configured extensions
    /// is reviewed; per-file failures are recorded, never fatal.
    Review {
        /// Repository URL or local project directory.
        target: String,

        /// Project name the run is scoped under. Defaults to the
        /// repository name when --user is set, otherwise to the shared
        /// single-user scope.
        #[arg(long)]
        project: Option<String>,

        /// User the run is scoped under (multi-user layout).
        #[arg(long)]
        user: Option<String>,

        /// Review at most this many files.
        #[arg(long)]
        limit: Option<usize>,

        /// Progress output: off, human, or json. Defaults to human when
        /// stderr is a TTY.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Browse saved review reports.
    Reports {
        #[command(subcommand)]
        action: ReportsAction,
    },

    /// Answer a question over the indexed reviews.
    Ask {
        /// The question text.
        question: String,

        /// Number of reviews retrieved as context.
        #[arg(long, default_value_t = qa::DEFAULT_TOP_K)]
        top_k: usize,

        /// Scope the question to a project.
        #[arg(long)]
        project: Option<String>,

        /// Scope the question to a user's project.
        #[arg(long)]
        user: Option<String>,
    },

    /// Manage the flat-file user store.
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Start the HTTP server.
    Serve,
}

#[derive(Subcommand)]
enum ReportsAction {
    /// List all reports in a scope, in sequence order.
    List {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Print one report by sequence id.
    Show {
        n: u32,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user.
    Register {
        name: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Review index initialized successfully.");
        }
        Commands::Review {
            target,
            project,
            user,
            limit,
            progress,
        } => {
            run_review_command(&cfg, &target, user, project, limit, progress).await?;
        }
        Commands::Reports { action } => match action {
            ReportsAction::List { project, user } => {
                let store = ReportStore::new(&cfg.store.data_root, &cfg.store.user_root);
                let scope = ScopeKey::resolve(user, project);
                let records = store.list(&scope)?;
                if records.is_empty() {
                    println!("No reports found.");
                } else {
                    for record in &records {
                        println!(
                            "{:>4}  [{}]  {}",
                            record.sequence_id,
                            status_label(record.status),
                            record.file
                        );
                    }
                }
            }
            ReportsAction::Show { n, project, user } => {
                let store = ReportStore::new(&cfg.store.data_root, &cfg.store.user_root);
                let scope = ScopeKey::resolve(user, project);
                let record = store.load(&store.report_path(&scope, n))?;
                println!("--- Report {} ---", record.sequence_id);
                println!("file:    {}", record.file);
                println!("status:  {}", status_label(record.status));
                println!();
                println!("{}", record.summary);
            }
        },
        Commands::Ask {
            question,
            top_k,
            project,
            user,
        } => {
            let pool = db::connect(&cfg).await?;
            migrate::apply_schema(&pool).await?;
            let index = ReviewIndex::new(pool);
            let generator = OllamaGenerator::new(&cfg.llm)?;
            let embedder = create_embedder(&cfg.embedding)?;
            let scope = ScopeKey::resolve(user, project);

            let answer = qa::answer_question(
                &scope,
                &question,
                top_k,
                &generator,
                embedder.as_ref(),
                &index,
            )
            .await?;
            println!("{}", answer);
        }
        Commands::User { action } => match action {
            UserAction::Register { name, password } => {
                let store = UserStore::new(&cfg.store.user_root);
                store.register(&name, &password)?;
                println!("Registered user '{}'.", name);
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

async fn run_review_command(
    cfg: &config::Config,
    target: &str,
    user: Option<String>,
    project: Option<String>,
    limit: Option<usize>,
    progress: Option<String>,
) -> Result<()> {
    let mode = match progress.as_deref() {
        None => ProgressMode::default_for_tty(),
        Some("off") => ProgressMode::Off,
        Some("human") => ProgressMode::Human,
        Some("json") => ProgressMode::Json,
        Some(other) => anyhow::bail!("Unknown progress mode: {}. Use off, human, or json.", other),
    };
    let reporter = mode.reporter();

    // Default the project scope to the repository name when running
    // under a user, so reports land in a meaningful directory.
    let project = project.or_else(|| user.as_ref().map(|_| clone::project_name(target)));
    let scope = ScopeKey::resolve(user, project);

    let root = if clone::looks_like_url(target) {
        reporter.report(ReviewProgressEvent::Cloning {
            url: target.to_string(),
        });
        clone::clone_repo(target, &cfg.store.clone_dir)?
    } else {
        PathBuf::from(target)
    };

    reporter.report(ReviewProgressEvent::Collecting);
    let mut files = collect::collect(&root, &cfg.review.extensions)?;
    if let Some(lim) = limit {
        files.truncate(lim);
    }

    let pool = db::connect(cfg).await?;
    migrate::apply_schema(&pool).await?;
    let index = ReviewIndex::new(pool);
    let reports = ReportStore::new(&cfg.store.data_root, &cfg.store.user_root);
    let generator = Arc::new(OllamaGenerator::new(&cfg.llm)?);
    let embedder = create_embedder(&cfg.embedding)?;

    let opts = RunOptions {
        scope,
        prompt_template: cfg.review.prompt_template.clone(),
        max_content_chars: cfg.review.max_content_chars,
        per_call_timeout: Duration::from_secs(cfg.review.per_call_timeout_secs),
    };

    let result = run_review(
        files,
        &opts,
        generator,
        embedder.as_ref(),
        &index,
        &reports,
        reporter.as_ref(),
    )
    .await?;

    println!("review {}", opts.scope.collection());
    println!("  run id: {}", result.run_id);
    println!("  total files: {}", result.total_files);
    println!("  completed: {}", result.completed);
    println!("  failed: {}", result.failed);
    println!("  timed out: {}", result.timed_out);
    println!("ok");

    Ok(())
}

fn status_label(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Completed => "completed",
        ReviewStatus::Failed => "failed",
        ReviewStatus::TimedOut => "timed_out",
    }
}
