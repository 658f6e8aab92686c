//! pdfcarve - Recover stream objects from PDF files
//!
//! Lists, extracts and hashes the decoded streams found by a forward scan
//! of each input file. No cross-reference table is needed, so truncated or
//! damaged files still yield whatever objects survive.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{ArgAction, Parser, Subcommand};
use pdfcarve_core::{PdfContainer, PdfObject, ScanOptions};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "pdfcarve", version, about = "Recover embedded stream objects from PDF files")]
struct Args {
    /// Use debug logging level
    #[arg(short = 'd', long, global = true, action = ArgAction::SetTrue)]
    debug: bool,

    /// Smallest file size, in bytes, accepted as a PDF
    #[arg(long = "min-size", global = true, value_name = "BYTES")]
    min_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one line per recovered object
    List {
        /// PDF files, or directories scanned one level deep
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print a JSON array instead of text
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Write recovered objects to a directory
    Extract {
        /// PDF file to carve
        file: PathBuf,

        /// Output directory, created when missing
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Only extract the named objects (repeatable)
        #[arg(long = "object", value_name = "NAME", action = ArgAction::Append)]
        objects: Vec<String>,
    },
    /// Print the SHA-256 of every recovered object
    Hash {
        /// PDF files, or directories scanned one level deep
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Serialize)]
struct ObjectRow {
    file: String,
    name: String,
    objid: u32,
    packed_size: usize,
    unpacked_size: usize,
    filters: Vec<&'static str>,
    extension: &'static str,
}

impl ObjectRow {
    fn new(file: &Path, object: &PdfObject) -> Self {
        Self {
            file: file.display().to_string(),
            name: object.name(),
            objid: object.objid(),
            packed_size: object.packed_size(),
            unpacked_size: object.unpacked_size(),
            filters: object.filters().iter().map(|f| f.name()).collect(),
            extension: object.extension(),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber is already installed");
    }
}

/// Expand directories one level deep; plain paths pass through.
fn collect_inputs(paths: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        entries.sort();
        files.extend(entries);
    }
    Ok(files)
}

/// Probe and open `path`, reporting files that are not usable PDFs.
fn open_pdf(path: &Path, options: ScanOptions) -> Option<Arc<PdfContainer>> {
    if let Err(e) = PdfContainer::probe_with_options(path, &options) {
        eprintln!("Skipping {}: {e}", path.display());
        return None;
    }
    match PdfContainer::open_with_options(path, options) {
        Ok(container) => Some(container),
        Err(e) => {
            eprintln!("Skipping {}: {e}", path.display());
            None
        }
    }
}

fn list<W: Write>(out: &mut W, paths: &[PathBuf], json: bool, options: ScanOptions) -> io::Result<()> {
    let mut objects = Vec::new();
    for path in collect_inputs(paths)? {
        let Some(container) = open_pdf(&path, options) else {
            continue;
        };
        match container.scan_all() {
            Ok(found) => objects.extend(found.into_iter().map(|object| (path.clone(), object))),
            Err(e) => warn!(file = %path.display(), error = %e, "scan aborted"),
        }
    }

    if json {
        let rows: Vec<ObjectRow> = objects.iter().map(|(path, object)| ObjectRow::new(path, object)).collect();
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        return Ok(());
    }

    let mut current: Option<&Path> = None;
    for (path, object) in &objects {
        if current != Some(path.as_path()) {
            writeln!(out, "=== {} ===", path.display())?;
            current = Some(path.as_path());
        }
        let filters: Vec<&str> = object.filters().iter().map(|f| f.name()).collect();
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            object.name(),
            object.packed_size(),
            object.unpacked_size(),
            filters.join(" ")
        )?;
    }
    Ok(())
}

fn extract<W: Write>(
    out: &mut W,
    file: &Path,
    output: &Path,
    names: &[String],
    options: ScanOptions,
) -> Result<usize, Box<dyn core::error::Error>> {
    let container = PdfContainer::open_with_options(file, options)?;
    let objects = container.scan_all()?;
    fs::create_dir_all(output)?;

    let names: Vec<String> = if names.is_empty() {
        objects.iter().map(|o| o.name()).collect()
    } else {
        names.to_vec()
    };

    let mut written = 0;
    for name in &names {
        match container.extract_to(name, output) {
            Ok(path) => {
                writeln!(out, "{}", path.display())?;
                written += 1;
            }
            Err(e) => eprintln!("Error: {name}: {e}"),
        }
    }
    Ok(written)
}

fn hash<W: Write>(out: &mut W, paths: &[PathBuf], options: ScanOptions) -> io::Result<()> {
    for path in collect_inputs(paths)? {
        let Some(container) = open_pdf(&path, options) else {
            continue;
        };
        writeln!(out, "=== {} ===", path.display())?;

        let started = Instant::now();
        let objects = match container.scan_all() {
            Ok(objects) => objects,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "scan aborted");
                container.objects()
            }
        };

        let mut extracted = 0;
        for object in &objects {
            let name = object.name();
            match container.extract_to_memory(&name) {
                Ok(data) => {
                    writeln!(out, "{name} = {:x}", Sha256::digest(&data))?;
                    extracted += 1;
                }
                Err(e) => debug!(name = %name, error = %e, "extraction failed"),
            }
        }
        writeln!(out, "Extracted files: {extracted} of {}", objects.len())?;
        writeln!(out, "Execution time: {} ms", started.elapsed().as_millis())?;
    }
    Ok(())
}

fn main() -> core::result::Result<(), Box<dyn core::error::Error>> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut options = ScanOptions::default();
    if let Some(size) = args.min_size {
        options = options.with_min_file_size(size);
    }

    let mut output = BufWriter::new(io::stdout());
    match &args.command {
        Command::List { paths, json } => list(&mut output, paths, *json, options)?,
        Command::Extract { file, output: dir, objects } => {
            let written = extract(&mut output, file, dir, objects, options)?;
            debug!(written, "extraction finished");
        }
        Command::Hash { paths } => hash(&mut output, paths, options)?,
    }
    output.flush()?;
    Ok(())
}
