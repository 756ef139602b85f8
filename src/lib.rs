//! # GitHub Repository Harvesting
//!
//! A Rust library for exhaustively enumerating GitHub repositories matching
//! a topic/language filter and harvesting a named configuration file from
//! each of them, built around an adaptive bucketing and pagination engine
//! that stays inside the search API's fixed 1000-result cap and its rate
//! limits.
//!
//! ## Main Components
//!
//! - [`RepoHarvester`]: the top-level run controller driving all phases
//! - [`Args`]: command line argument structure
//! - [`partition`]: adaptive star-axis bucketing against a count seam
//! - [`collector`]: cursor pagination with overflow re-querying and dedup
//! - [`content`]: per-repository file search, blob fetch and decoding
//! - [`rate_limit`]: quota-gated, retrying call wrapper
//!
//! ## Example
//!
//! ```no_run
//! use github_repo_harvesting_lib::{Args, RepoHarvester};
//! use clap::Parser;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), github_repo_harvesting_lib::HarvestError> {
//!     let args = Args::parse();
//!     let mut harvester = RepoHarvester::new(&args)?;
//!     let summary = harvester.run().await?;
//!     println!("{} repositories matched", summary.matched_repositories);
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod collector;
pub mod content;
pub mod error;
pub mod github;
pub mod models;
pub mod partition;
pub mod query;
pub mod rate_limit;
pub mod snapshot;

mod repo_harvester;

pub use crate::args::Args;
pub use crate::error::{HarvestError, Result};
pub use crate::repo_harvester::{HarvestSummary, RepoHarvester};
