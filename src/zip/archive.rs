use async_trait::async_trait;
use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;

use crate::error::{ExtractError, ExtractResult};
use crate::extract::Archive;
use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An opened ZIP archive with its Central Directory loaded.
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipFileEntry>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Parse the archive's Central Directory.
    ///
    /// Any structural problem is reported as [`ExtractError::InvalidArchive`].
    pub async fn open(reader: Arc<R>) -> ExtractResult<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser
            .list_files()
            .await
            .map_err(|e| ExtractError::InvalidArchive(format!("{:#}", e)))?;

        log::debug!("Opened archive with {} entries", entries.len());
        Ok(Self { parser, entries })
    }

    pub fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    /// Read and decompress an entry, verifying its size and CRC-32.
    pub async fn read_bytes(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_directory {
            bail!("Entry is a directory");
        }
        if entry.is_encrypted() {
            bail!("Encrypted entries are not supported");
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let source_size = self.parser.reader().size();
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > source_size)
        {
            bail!(
                "Entry data ({} bytes at offset {}) runs past the end of the archive ({} bytes)",
                entry.compressed_size,
                data_offset,
                source_size
            );
        }

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // One byte past the declared size is enough to detect an overrun
                let limit = entry.uncompressed_size.saturating_add(1);
                let mut out = Vec::new();
                DeflateDecoder::new(raw.as_slice())
                    .take(limit)
                    .read_to_end(&mut out)?;
                if out.len() as u64 > entry.uncompressed_size {
                    bail!(
                        "Inflated data exceeds the declared size of {} bytes",
                        entry.uncompressed_size
                    );
                }
                out
            }
            method @ CompressionMethod::Unknown(_) => {
                bail!("Unsupported compression method: {}", method.as_u16())
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "Size mismatch: expected {} bytes, got {}",
                entry.uncompressed_size,
                data.len()
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC mismatch: expected {:08x}, got {:08x}",
                entry.crc32,
                crc.sum()
            );
        }

        Ok(data)
    }

    /// Read an entry as UTF-8 text, dropping a leading byte order mark.
    pub async fn read_text(&self, entry: &ZipFileEntry) -> ExtractResult<String> {
        let mut data = self
            .read_bytes(entry)
            .await
            .map_err(|e| ExtractError::decode(&entry.file_name, format!("{:#}", e)))?;

        if data.starts_with(UTF8_BOM) {
            data.drain(..UTF8_BOM.len());
        }

        String::from_utf8(data)
            .map_err(|e| ExtractError::decode(&entry.file_name, format!("not UTF-8 text: {}", e)))
    }
}

#[async_trait]
impl<R: ReadAt> Archive for ZipArchive<R> {
    type Entry = ZipFileEntry;

    fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    async fn read_text(&self, entry: &ZipFileEntry) -> ExtractResult<String> {
        ZipArchive::read_text(self, entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::{CDFH_SIGNATURE, LFH_SIGNATURE};
    use std::io::{Cursor, Write};

    fn build_zip(files: &[(&str, &[u8], ::zip::CompressionMethod)]) -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content, method) in files {
            let options = ::zip::write::SimpleFileOptions::default().compression_method(*method);
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    async fn open(data: Vec<u8>) -> ZipArchive<MemoryReader> {
        ZipArchive::open(Arc::new(MemoryReader::new(data)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_stored_and_deflated() {
        let source = "fn main() {\n    println!(\"hi\");\n}\n".repeat(20);
        let archive = open(build_zip(&[
            ("a.rs", source.as_bytes(), ::zip::CompressionMethod::Stored),
            ("b.rs", source.as_bytes(), ::zip::CompressionMethod::Deflated),
        ]))
        .await;

        let entries = archive.entries();
        assert_eq!(entries[1].compression_method, CompressionMethod::Deflate);
        assert!(entries[1].compressed_size < entries[1].uncompressed_size);

        assert_eq!(archive.read_text(&entries[0]).await.unwrap(), source);
        assert_eq!(archive.read_text(&entries[1]).await.unwrap(), source);
    }

    #[tokio::test]
    async fn test_bom_is_stripped() {
        let archive = open(build_zip(&[(
            "notes.txt",
            b"\xEF\xBB\xBFhello",
            ::zip::CompressionMethod::Stored,
        )]))
        .await;

        let entry = &archive.entries()[0];
        assert_eq!(archive.read_text(entry).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decode_error() {
        let archive = open(build_zip(&[(
            "data.json",
            &[0xFF, 0xFE, 0x00, 0x7B],
            ::zip::CompressionMethod::Stored,
        )]))
        .await;

        let err = archive.read_text(&archive.entries()[0]).await.unwrap_err();
        assert!(matches!(err, ExtractError::Decode { ref path, .. } if path == "data.json"));
    }

    #[tokio::test]
    async fn test_crc_mismatch_is_detected() {
        let mut data = build_zip(&[("x.py", b"print(1)", ::zip::CompressionMethod::Stored)]);
        let pos = data
            .windows(8)
            .position(|w| w == b"print(1)")
            .unwrap();
        data[pos + 6] = b'2';

        let archive = open(data).await;
        let err = archive.read_text(&archive.entries()[0]).await.unwrap_err();
        assert!(err.to_string().contains("CRC mismatch"));
    }

    /// An entry written byte by byte, for archives the `zip` writer refuses to produce.
    struct RawEntry<'a> {
        name: &'a str,
        method: u16,
        data: Vec<u8>,
        crc32: u32,
        uncompressed_size: u32,
        /// Stored in a ZIP64 extra field of the Central Directory record
        zip64_compressed_size: Option<u64>,
    }

    impl<'a> RawEntry<'a> {
        fn stored(name: &'a str, content: &[u8]) -> Self {
            let mut crc = Crc::new();
            crc.update(content);
            Self {
                name,
                method: 0,
                data: content.to_vec(),
                crc32: crc.sum(),
                uncompressed_size: content.len() as u32,
                zip64_compressed_size: None,
            }
        }

        fn deflated(name: &'a str, content: &[u8], declared_size: u32) -> Self {
            let mut encoder =
                flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(content).unwrap();
            let mut crc = Crc::new();
            crc.update(content);
            Self {
                name,
                method: 8,
                data: encoder.finish().unwrap(),
                crc32: crc.sum(),
                uncompressed_size: declared_size,
                zip64_compressed_size: None,
            }
        }
    }

    fn build_raw_zip(entries: &[RawEntry]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut cd = Vec::new();

        for entry in entries {
            let lfh_offset = out.len() as u32;
            let data_len = entry.data.len() as u32;

            out.extend_from_slice(LFH_SIGNATURE);
            out.extend_from_slice(&20u16.to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(&entry.method.to_le_bytes());
            out.extend_from_slice(&[0; 4]);
            out.extend_from_slice(&entry.crc32.to_le_bytes());
            out.extend_from_slice(&data_len.to_le_bytes());
            out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&entry.data);

            let mut extra = Vec::new();
            let compressed_size = match entry.zip64_compressed_size {
                Some(size) => {
                    extra.extend_from_slice(&0x0001u16.to_le_bytes());
                    extra.extend_from_slice(&8u16.to_le_bytes());
                    extra.extend_from_slice(&size.to_le_bytes());
                    0xFFFF_FFFF
                }
                None => data_len,
            };

            cd.extend_from_slice(CDFH_SIGNATURE);
            cd.extend_from_slice(&20u16.to_le_bytes());
            cd.extend_from_slice(&20u16.to_le_bytes());
            cd.extend_from_slice(&0u16.to_le_bytes());
            cd.extend_from_slice(&entry.method.to_le_bytes());
            cd.extend_from_slice(&[0; 4]);
            cd.extend_from_slice(&entry.crc32.to_le_bytes());
            cd.extend_from_slice(&compressed_size.to_le_bytes());
            cd.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
            cd.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
            cd.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            cd.extend_from_slice(&[0; 8]);
            cd.extend_from_slice(&lfh_offset.to_le_bytes());
            cd.extend_from_slice(entry.name.as_bytes());
            cd.extend_from_slice(&extra);
        }

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&cd);
        out.extend_from_slice(b"PK\x05\x06");
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&(cd.len() as u32).to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[tokio::test]
    async fn test_raw_builder_round_trips() {
        let archive = open(build_raw_zip(&[
            RawEntry::stored("a.py", b"print(1)"),
            RawEntry::deflated("b.py", b"print(2)", 8),
        ]))
        .await;

        assert_eq!(archive.read_text(&archive.entries()[0]).await.unwrap(), "print(1)");
        assert_eq!(archive.read_text(&archive.entries()[1]).await.unwrap(), "print(2)");
    }

    #[tokio::test]
    async fn test_oversized_compressed_size_fails_entry() {
        let mut huge = RawEntry::stored("huge.py", b"print('huge')");
        huge.zip64_compressed_size = Some(u64::MAX - 15);
        let mut past_end = RawEntry::stored("past_end.py", b"print('past')");
        past_end.zip64_compressed_size = Some(1 << 20);

        let archive = open(build_raw_zip(&[
            RawEntry::stored("ok.py", b"print('ok')"),
            huge,
            past_end,
        ]))
        .await;
        assert_eq!(archive.entries()[1].compressed_size, u64::MAX - 15);

        let result = crate::extract::run(&archive, &mut ()).await.unwrap();

        assert!(result.entries[0].succeeded);
        for outcome in &result.entries[1..] {
            assert!(!outcome.succeeded);
            assert!(outcome.error.as_deref().unwrap().contains("past the end"));
        }
        assert_eq!(
            result.aggregated_text,
            crate::extract::format_block("ok.py", "print('ok')")
        );
    }

    #[tokio::test]
    async fn test_inflate_stops_at_declared_size() {
        let content = "x = 1\n".repeat(50_000);
        let archive = open(build_raw_zip(&[RawEntry::deflated(
            "bomb.py",
            content.as_bytes(),
            1024,
        )]))
        .await;

        let err = archive.read_text(&archive.entries()[0]).await.unwrap_err();
        assert!(matches!(err, ExtractError::Decode { ref path, .. } if path == "bomb.py"));
        assert!(err.to_string().contains("exceeds the declared size of 1024 bytes"));
    }

    #[tokio::test]
    async fn test_unsupported_method_is_named() {
        let mut entry = RawEntry::stored("a.py", b"print(1)");
        entry.method = 12;
        let archive = open(build_raw_zip(&[entry])).await;

        let err = archive.read_text(&archive.entries()[0]).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported compression method: 12"));
    }

    #[tokio::test]
    async fn test_open_garbage_is_invalid_archive() {
        let result = ZipArchive::open(Arc::new(MemoryReader::new(b"%PDF-1.7".to_vec()))).await;
        assert!(matches!(result, Err(ExtractError::InvalidArchive(_))));
    }
}
