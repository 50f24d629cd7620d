//! ZIP archive reading.
//!
//! - [`structures`]: records of the ZIP format (EOCD, ZIP64 records, entries)
//! - [`parser`]: locating and decoding those records from a [`ReadAt`](crate::io::ReadAt) source
//! - [`archive`]: [`ZipArchive`], the opened archive handed to the extraction pipeline
//!
//! The End of Central Directory is read first, from the tail of the source,
//! then the whole Central Directory. Entry data is only touched when an
//! entry is read, which keeps listing cheap over HTTP Range requests.
//!
//! Supported: ZIP64, STORED and DEFLATE entries, CRC-32 verification.
//! Not supported: encryption, multi-disk archives, other compression methods.

mod archive;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use parser::ZipParser;
pub use structures::*;
