//! Crawl configuration.
//!
//! This module contains the configuration structures passed into a crawl:
//! - `CrawlOptions`: top-level options, loadable from JSON
//! - `LimitOptions`: inclusion rule patterns per object category
//! - `FilterOptions` / `GrepOptions`: table reduction settings
//! - `RetrievalStrategies`: retrieval strategy per metadata category
//! - `MatchKeyOptions`: weak-association prefix selection thresholds
//!
//! Every component receives its configuration explicitly. There is no
//! global state.

mod crawl;
mod filter;
mod limit;
mod retrieval;

pub use crawl::{CrawlOptions, MatchKeyOptions};
pub use filter::{FilterOptions, GrepOptions};
pub use limit::{LimitOptions, LimitRules};
pub use retrieval::{MetadataCategory, RetrievalStrategies, RetrievalStrategy};
