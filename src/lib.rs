//! # slack2mm
//!
//! A Rust library for converting Slack workspace exports into Mattermost
//! bulk-import files.
//!
//! ## Overview
//!
//! A conversion reads a Slack export (zip or unpacked), builds an intermediate model
//! of users, channels and posts, and writes it as JSONL:
//!
//! 1. [`parsing::ExportReader`] loads the export
//! 2. [`core::Transformer`] converts users, channels and posts, assembling
//!    replies into threads
//! 3. [`core::write_bulk_import`] writes the import file
//!
//! Thread assembly keeps roots in a [`store::ThreadStore`]. By default the
//! store lives in memory for one channel; with a [`config::RedisConfig`] it is
//! backed by Redis, so replies exported apart from their root in an earlier
//! run are still attached to it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slack2mm::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let export = ExportReader::read("slack-export.zip")?;
//!
//!     let config = TransformConfig::new().with_attachments_dir("attachments");
//!     let mut transformer = Transformer::new("myteam");
//!     transformer.transform(&config, &export)?;
//!
//!     write_bulk_import(&transformer.intermediate, "myteam", "bulk-export.jsonl")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`parsing`] - Slack export types and reader
//! - [`config`] - [`TransformConfig`](config::TransformConfig), [`RedisConfig`](config::RedisConfig)
//! - [`core`] - Intermediate model, thread assembly, transformation, output
//! - [`store`] - Thread stores (in-memory, cache-backed, Redis)
//! - [`cli`] - CLI arguments (feature `cli`)
//! - [`error`] - Unified error types ([`MigrateError`], [`Result`])
//! - [`prelude`] - Convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod parsing;
pub mod store;

// Re-export the main types at the crate root for convenience
pub use error::{MigrateError, Result};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use slack2mm::prelude::*;
/// ```
pub mod prelude {
    // Error types
    pub use crate::error::{MigrateError, Result};

    // Configuration
    pub use crate::config::{RedisConfig, TransformConfig};

    // Export reading
    pub use crate::parsing::{ExportReader, SlackExport};

    // Intermediate model
    pub use crate::core::models::{
        ChannelType, Intermediate, IntermediateChannel, IntermediatePost, IntermediateUser,
    };

    // Transformation
    pub use crate::core::{TransformStats, Transformer};

    // Output
    pub use crate::core::output::{to_bulk_import, write_bulk_import};

    // Thread stores
    pub use crate::store::{MemoryStoreFactory, StoreFactory, ThreadStore, open_factory};
}
