//! Source extraction pipeline.
//!
//! The pipeline only sees an archive through the [`Archive`] and
//! [`ArchiveEntry`] traits: an ordered entry list and a way to read one
//! entry as text. [`ZipArchive`](crate::zip::ZipArchive) is the production
//! implementation; tests plug in their own.
//!
//! - [`registry`]: the recognized code-file extensions and [`is_code_file`]
//! - [`report`]: the per-file block written into the report
//! - [`naming`]: the report file name derived from the archive name
//! - [`pipeline`]: [`run`], which ties the above together

pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod report;

pub use naming::{archive_display_name, build_output_filename};
pub use pipeline::{EntryOutcome, ExtractionResult, Progress, RunObserver, run};
pub use registry::{ExtensionRegistry, is_code_file};
pub use report::format_block;

use async_trait::async_trait;

use crate::error::ExtractResult;

/// One file or directory record of an archive.
pub trait ArchiveEntry {
    fn path(&self) -> &str;

    fn is_directory(&self) -> bool;
}

/// An opened archive, as consumed by the pipeline.
#[async_trait]
pub trait Archive: Send + Sync {
    type Entry: ArchiveEntry + Send + Sync;

    /// Entries in enumeration order.
    fn entries(&self) -> &[Self::Entry];

    /// Read an entry's content as text. Failures are [`ExtractError::Decode`](crate::ExtractError::Decode).
    async fn read_text(&self, entry: &Self::Entry) -> ExtractResult<String>;
}
