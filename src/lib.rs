//! # Patient Triage
//!
//! Pulls patient records from a paginated, rate-limited assessment API,
//! scores each patient's vital signs, groups them into alert cohorts and
//! optionally submits those cohorts back for grading.
//!
//! ## Usage
//!
//! ```bash
//! patient-triage run [--submit] [--json] [--limit N]
//! patient-triage fetch
//! patient-triage serve --port 8080
//! ```
//!
//! ## Modules
//!
//! - `client` - Retrying HTTP client, pagination and submission
//! - `cli` - Command-line front end
//! - `cohort` - Cohort categorization and summaries
//! - `config` - Layered configuration (file, environment, flags)
//! - `error` - Crate error type and retry classification
//! - `patient` - Patient records and lenient vital-sign values
//! - `progress` - Progress events fanned out to observers
//! - `run` - One end-to-end assessment run
//! - `scoring` - Deterministic vital-sign risk scoring
//! - `server` - HTTP forwarding endpoints
//! - `testing` - Test doubles for the patient API
pub mod cli;
pub mod client;
pub mod cohort;
pub mod config;
pub mod error;
pub mod patient;
pub mod progress;
pub mod run;
pub mod scoring;
pub mod server;

pub mod testing;

pub use error::{Error, Result};
