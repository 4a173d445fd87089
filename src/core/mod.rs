//! Core types shared across the repair pipeline.

mod error;
mod language;
mod source_file;
mod types;

pub use error::{Error, Result};
pub use language::Language;
pub use source_file::{byte_of_line, SourceFile};
pub use types::{RepositoryMetadata, SuspiciousLocation};
