//! Main entry point for the zipstream CLI application.
//!
//! Validates the trailer chain of a local ZIP64 archive and optionally lists
//! its central directory.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Read, Seek};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use zipstream::{Cli, LocalFileReader, ZipEntry, ZipStream};

/// Application entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let reader = LocalFileReader::open(Path::new(&cli.file))
        .with_context(|| format!("failed to open {}", cli.file))?;
    let size = reader.size();
    let mut zip = ZipStream::new(reader);

    let location = zip
        .read()
        .with_context(|| format!("{} is not a valid zip64 archive", cli.file))?;

    if !cli.is_listing() {
        println!("Archive:            {} ({})", cli.file, format_size(size));
        println!("Central directory:  offset {}", location.offset);
        println!("                    size {}", format_size(location.size));
        println!("Entries:            {}", location.entries);
        return Ok(());
    }

    zip.read_central_directory()
        .with_context(|| format!("failed to read central directory of {}", cli.file))?;
    list_files(&zip, cli.verbose)
}

/// List entries in the archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just entry names, one per line
/// - Verbose format (`-v`): Table with sizes, method and timestamps
fn list_files<R: Read + Seek>(zip: &ZipStream<R>, verbose: bool) -> Result<()> {
    if !verbose {
        for name in zip.file_names() {
            println!("{name}");
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>7}  {:>10}  {:>5}  Name",
        "Length", "Size", "Method", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut totals = ListingTotals::default();

    for (_, header) in zip.entries() {
        let entry = header.entry()?;
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        let method = match entry.compression_method {
            zipstream::zip::CompressionMethod::Store => "Stored".to_string(),
            zipstream::zip::CompressionMethod::Deflate => "Defl:N".to_string(),
            zipstream::zip::CompressionMethod::Unknown(m) => format!("Unk:{m:03}"),
        };

        println!(
            "{:>10}  {:>10}  {:>7}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            method,
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        totals.add(&entry);
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {:>30}  {} files",
        totals.uncompressed, totals.compressed, "", totals.files
    );

    Ok(())
}

/// Running totals for the verbose listing footer.
///
/// Zip64 sizes may each be close to `u64::MAX`, so the sums saturate.
#[derive(Debug, Default, PartialEq, Eq)]
struct ListingTotals {
    uncompressed: u64,
    compressed: u64,
    files: usize,
}

impl ListingTotals {
    /// Count a file entry; directories are skipped.
    fn add(&mut self, entry: &ZipEntry) {
        if entry.is_directory {
            return;
        }
        self.uncompressed = self.uncompressed.saturating_add(entry.uncompressed_size);
        self.compressed = self.compressed.saturating_add(entry.compressed_size);
        self.files += 1;
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
