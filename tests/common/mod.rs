use std::io::{Cursor, Write};
use std::sync::Arc;

use ::zip::CompressionMethod;
use ::zip::write::SimpleFileOptions;
use zipcat::{MemoryReader, ZipArchive};

/// One member of a fixture archive.
pub enum Member<'a> {
    Dir(&'a str),
    Stored(&'a str, &'a [u8]),
    Deflated(&'a str, &'a [u8]),
}

/// Build an in-memory ZIP archive with the given members, in order.
pub fn build_zip(members: &[Member]) -> Vec<u8> {
    let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for member in members {
        match member {
            Member::Dir(name) => writer.add_directory(*name, stored).unwrap(),
            Member::Stored(name, data) => {
                writer.start_file(*name, stored).unwrap();
                writer.write_all(data).unwrap();
            }
            Member::Deflated(name, data) => {
                writer.start_file(*name, deflated).unwrap();
                writer.write_all(data).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

pub async fn open_zip(data: Vec<u8>) -> ZipArchive<MemoryReader> {
    ZipArchive::open(Arc::new(MemoryReader::new(data)))
        .await
        .expect("fixture archive should open")
}

/// First bytes of a PNG file, enough to be binary.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\xff\xd8";
