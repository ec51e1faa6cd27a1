//! Output module for run summaries and classification statistics
//!
//! This module handles:
//! - Per-prefix doc/non-doc statistics and prefix suggestion
//! - Printing index, pull, push and listing summaries

pub mod stats;
mod summary;

pub use stats::{ancestor_prefixes, suggest_prefix, PrefixCounts, PrefixStats};
pub use summary::{
    format_local_table, format_remote_table, print_index_outcome, print_local_docsets,
    print_pull_outcome, print_push_report, print_remote_docsets,
};
