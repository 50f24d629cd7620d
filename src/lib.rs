//! # zipcat
//!
//! Concatenate the source files inside a ZIP archive into one annotated
//! text report.
//!
//! Every non-directory entry whose extension is a recognized code or text
//! extension is read as UTF-8 and appended to the report under a header
//! naming its path. Entries that cannot be read are reported as failed
//! without stopping the run.
//!
//! Archives can come from the local filesystem, from memory (stdin) or from
//! an HTTP/HTTPS URL, which is read with Range requests.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use zipcat::{LocalFileReader, ZipArchive, build_output_filename, run};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Arc::new(LocalFileReader::new(Path::new("project.zip"))?);
//!     let archive = ZipArchive::open(reader).await?;
//!
//!     let result = run(&archive, &mut ()).await?;
//!     for entry in &result.entries {
//!         println!("{} {}", if entry.succeeded { "ok " } else { "err" }, entry.path);
//!     }
//!
//!     std::fs::write(build_output_filename("project.zip", None), result.aggregated_text)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod extract;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use error::{ExtractError, ExtractResult};
pub use extract::{
    Archive, ArchiveEntry, EntryOutcome, ExtensionRegistry, ExtractionResult, Progress,
    RunObserver, archive_display_name, build_output_filename, format_block, is_code_file, run,
};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use zip::{ZipArchive, ZipFileEntry};
