use chrono::{DateTime, Utc};
use std::path::Path;

const OUTPUT_SUFFIX: &str = "_extracted_codes";
const OUTPUT_EXTENSION: &str = ".txt";

/// Report file name for an archive.
///
/// A single trailing `.zip` (exact case) is removed, then
/// `_extracted_codes`, the optional UTC timestamp (`2024-05-01T09-30-00`) and
/// `.txt` are appended. Names without `.zip` are kept as they are.
pub fn build_output_filename(archive_name: &str, timestamp: Option<DateTime<Utc>>) -> String {
    let stem = archive_name.strip_suffix(".zip").unwrap_or(archive_name);

    match timestamp {
        Some(ts) => format!(
            "{}{}_{}{}",
            stem,
            OUTPUT_SUFFIX,
            ts.format("%Y-%m-%dT%H-%M-%S"),
            OUTPUT_EXTENSION
        ),
        None => format!("{}{}{}", stem, OUTPUT_SUFFIX, OUTPUT_EXTENSION),
    }
}

/// Archive name as a user would see it for a path, URL or stdin (`-`).
pub fn archive_display_name(source: &str) -> String {
    if source == "-" {
        return "stdin".to_string();
    }

    if let Some(rest) = source
        .strip_prefix("http://")
        .or_else(|| source.strip_prefix("https://"))
    {
        let path = rest.split(['?', '#']).next().unwrap_or(rest);
        return path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("download")
            .to_string();
    }

    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}
