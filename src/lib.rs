//! # Review Harness
//!
//! A local-first automated code review pipeline.
//!
//! Review Harness clones a source repository, sends each reviewable file
//! to a locally hosted language model for review, embeds the file content,
//! and persists every review twice: as a JSON report on disk and as a row
//! in a SQLite-backed vector index. Follow-up questions are answered over
//! the accumulated reviews via retrieval-augmented generation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────────────┐   ┌───────────────┐
//! │  Clone + │──▶│      Orchestrator       │──▶│ SQLite vectors │
//! │  Collect │   │ prompt → LLM → embed    │   │ + JSON reports │
//! └──────────┘   └─────────────────────────┘   └───────┬───────┘
//!                                                      │
//!                                  ┌───────────────────┤
//!                                  ▼                   ▼
//!                             ┌──────────┐       ┌──────────┐
//!                             │   CLI    │       │   HTTP   │
//!                             │  (rvw)   │       │  (axum)  │
//!                             └──────────┘       └──────────┘
//! ```
//!
//! Each file is processed strictly sequentially under a per-call time
//! budget; a single file's failure or timeout is recorded in its review
//! record and never aborts the run.
//!
//! ## Quick Start
//!
//! ```bash
//! rvw init                                   # create the review index
//! rvw review https://github.com/org/repo.git # clone + review every file
//! rvw reports list                           # browse saved reports
//! rvw ask "what are the worst issues?"       # RAG over the reviews
//! rvw serve                                  # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`clone`] | Repository cloning |
//! | [`collect`] | Reviewable file collection |
//! | [`llm`] | Text generation client |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`review`] | The review pipeline orchestrator |
//! | [`index`] | SQLite vector index |
//! | [`reports`] | JSON report persistence |
//! | [`qa`] | Question answering over reviews |
//! | [`users`] | Flat-file user store |
//! | [`progress`] | Run progress reporting |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod clone;
pub mod collect;
pub mod config;
pub mod db;
pub mod embedding;
pub mod index;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod qa;
pub mod reports;
pub mod review;
pub mod server;
pub mod users;
