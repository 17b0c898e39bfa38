//! Output writers.
//!
//! - [`write_bulk_import`] / [`to_bulk_import`] - Mattermost bulk-import JSONL
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> slack2mm::Result<()> {
//! use slack2mm::core::models::Intermediate;
//! use slack2mm::core::output::{to_bulk_import, write_bulk_import};
//!
//! let intermediate = Intermediate::default();
//!
//! write_bulk_import(&intermediate, "myteam", "bulk-export.jsonl")?;
//!
//! // Or get as a string
//! let jsonl = to_bulk_import(&intermediate, "myteam")?;
//! assert!(jsonl.starts_with(r#"{"type":"version""#));
//! # Ok(())
//! # }
//! ```

mod jsonl_writer;

pub use jsonl_writer::{to_bulk_import, write_bulk_import};
