//! sharezip - bundle chosen items of a directory into a zip archive
//!
//! This library lists a directory's children, lets a [`Selector`] pick some of
//! them, stages the picks into a named subfolder, zips that subfolder and then
//! removes both the staging copy and the picked originals.

pub mod archive;
pub mod cli;
pub mod config;
pub mod copy;
pub mod entry;
pub mod error;
pub mod filter;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod remove;

pub use config::{ConfigError, ListingRules, ShareConfig};
pub use entry::{DirectoryEntry, EntryKind, list_entries};
pub use error::{ShareError, ShareResult};
pub use filter::{FilterMode, distinct_extensions, filter_by_mode};
pub use pipeline::{PipelineConfig, RunOutcome, RunReport, Selector, run_pipeline};
pub use prompt::{PresetSelector, PromptSelector};
