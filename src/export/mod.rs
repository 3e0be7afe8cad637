// Export module - runs the compositor across a batch of source files and
// encodes the results.
mod error;
pub mod formats;
mod pipeline;
mod types;

pub use error::ExportError;
pub use pipeline::{destination_path, run_batch};
pub use types::{BatchReport, ExportSpec, ItemOutcome, NamingRule, OutputFormat};
