//! Core conversion logic.
//!
//! This module contains:
//! - [`models`] - The intermediate representation
//! - [`sanitize`] - Field-length limits of the destination
//! - [`threading`] - Thread assembly and timestamp de-duplication
//! - [`attachments`] - Copying uploaded files
//! - [`transform`] - The conversion pipeline
//! - [`stats`] - Run counters
//! - [`output`] - Bulk-import writer
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # fn main() -> slack2mm::Result<()> {
//! use slack2mm::config::TransformConfig;
//! use slack2mm::core::{Transformer, write_bulk_import};
//! use slack2mm::parsing::ExportReader;
//!
//! let export = ExportReader::read("slack-export")?;
//! let mut transformer = Transformer::new("myteam");
//! transformer.transform(&TransformConfig::new(), &export)?;
//! write_bulk_import(&transformer.intermediate, "myteam", "bulk-export.jsonl")?;
//! # Ok(())
//! # }
//! ```

pub mod attachments;
pub mod models;
pub mod output;
pub mod sanitize;
pub mod stats;
pub mod threading;
pub mod transform;

// Re-export main types for convenience
pub use models::{ChannelType, Intermediate, IntermediateChannel, IntermediatePost, IntermediateUser};
pub use output::{to_bulk_import, write_bulk_import};
pub use stats::TransformStats;
pub use threading::{Placement, TimestampLedger, add_post_to_threads};
pub use transform::Transformer;
