use clap::Parser;
use std::path::{Path, PathBuf};

use crate::extract::{archive_display_name, build_output_filename};

#[derive(Parser, Debug)]
#[command(name = "zipcat")]
#[command(version)]
#[command(about = "Concatenate the source files of a ZIP archive into one text report", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipcat project.zip                 write project_extracted_codes_<time>.txt\n  \
  zipcat -p project.zip | less       send the report through a pipe\n  \
  zipcat -l https://example.com/repo.zip   list the code files of a remote ZIP\n  \
  cat project.zip | zipcat -o out.txt -    read the archive from stdin")]
pub struct Cli {
    /// ZIP file path, HTTP URL, or - for stdin
    #[arg(value_name = "ARCHIVE")]
    pub file: String,

    /// Write the report to this file
    #[arg(short = 'o', long = "output", value_name = "FILE", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Directory for the generated report name
    #[arg(short = 'd', long = "output-dir", value_name = "DIR", env = "ZIPCAT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write the report to stdout, no messages
    #[arg(short = 'p', long = "pipe", conflicts_with_all = ["output", "output_dir"])]
    pub pipe: bool,

    /// List code files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List all entries verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Leave the timestamp out of the generated report name
    #[arg(long = "no-timestamp")]
    pub no_timestamp: bool,

    /// Accept archives whose name does not end in .zip
    #[arg(long = "force")]
    pub force: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_stdin(&self) -> bool {
        self.file == "-"
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn archive_name(&self) -> String {
        archive_display_name(&self.file)
    }

    /// Whether the source looks like a ZIP archive by name. Stdin always passes.
    pub fn has_zip_name(&self) -> bool {
        self.is_stdin() || self.force || self.archive_name().to_lowercase().ends_with(".zip")
    }

    /// Where the report goes when it is not piped.
    pub fn output_path(&self, timestamp: chrono::DateTime<chrono::Utc>) -> PathBuf {
        if let Some(ref path) = self.output {
            return path.clone();
        }

        let stamp = (!self.no_timestamp).then_some(timestamp);
        let name = build_output_filename(&self.archive_name(), stamp);
        match self.output_dir {
            Some(ref dir) => dir.join(name),
            None => Path::new(&name).to_path_buf(),
        }
    }
}
