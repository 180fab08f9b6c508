//! FVMerger
//!
//! Collects attachments from a Gmail mailbox over a chosen date range,
//! turns them into PDFs, and merges everything into a single document
//! with a human-readable summary.
//!
//! # Overview
//!
//! The pipeline runs in fixed stages:
//! - **Authentication**: OAuth2 installed flow with token caching
//! - **Date range**: a period selector resolved to a half-open interval
//! - **Search**: Gmail query built from the interval plus a filter expression
//! - **Processing**: PDFs persisted as-is, JPEGs rendered onto PDF pages,
//!   everything renamed to a deterministic date/sender scheme
//! - **Aggregation**: all produced PDFs merged, in order, into one file
//! - **Reporting**: a summary letter plus run statistics
//!
//! # Example Usage
//!
//! ```no_run
//! use fvmerger::{auth, client::GmailMailClient, config::Config, pdf::LopdfEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         config.gmail.credentials_path.as_ref(),
//!         config.gmail.token_cache_path.as_ref(),
//!     )
//!     .await?;
//!
//!     let mail = GmailMailClient::new(hub);
//!     let pdf = LopdfEngine::new();
//!
//!     // Drive the pipeline through cli::run_pipeline
//!     // ...
//!     let _ = (mail, pdf);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Mailbox access trait and the Gmail implementation
//! - [`classifier`] - Attachment routing (pass through, convert, skip)
//! - [`cli`] - Command-line interface and pipeline orchestration
//! - [`config`] - Configuration management
//! - [`date_range`] - Period selectors and interval resolution
//! - [`error`] - Error types and result aliases
//! - [`naming`] - Deterministic destination filenames
//! - [`pdf`] - PDF rendering and merging
//! - [`processor`] - Per-attachment persistence and conversion
//! - [`aggregator`] - Final merge and scratch cleanup
//! - [`report`] - Run summary rendering
//! - [`models`] - Core data structures

pub mod aggregator;
pub mod auth;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod date_range;
pub mod error;
pub mod models;
pub mod naming;
pub mod pdf;
pub mod processor;
pub mod report;

// Re-export commonly used types for convenience
pub use error::{MergerError, Result};

// Core data models
pub use models::{AttachmentMeta, MessageEnvelope, OriginKind, ProducedFile, RunResult};

// Date range types
pub use date_range::{DateInterval, Period};

// Config types
pub use config::{Config, GmailConfig, OutputConfig, RangeConfig, ReportConfig};

// Mailbox and PDF seams
pub use client::{GmailMailClient, MailClient};
pub use pdf::{LopdfEngine, PdfEngine};

// Pipeline stages
pub use aggregator::PdfAggregator;
pub use classifier::AttachmentKind;
pub use processor::{AttachmentProcessor, OutputDirs};
pub use report::SummaryReporter;

// CLI types (for binary usage)
pub use cli::Cli;
