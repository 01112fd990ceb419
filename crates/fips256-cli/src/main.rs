use anyhow::{bail, ensure, Context};
use clap::Parser;
use fips256_batch::{hash_reader, hash_sources};
use fips256_core::Digest;
use fips256_hash::{hash, Sha256};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Default read buffer for files and stdin.
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Progress bar granularity for the benchmark.
const BENCH_PROGRESS_STEP: usize = 1024 * 1024;

/// Length of a hex-encoded digest.
const HEX_DIGEST_LEN: usize = 64;

#[derive(Parser, Debug)]
#[command(name = "fips256", about = "Compute and check SHA-256 (FIPS 180-4) digests")]
struct Args {
    /// Files to hash ("-" reads stdin; stdin is used when nothing else is given)
    #[arg()]
    files: Vec<PathBuf>,

    /// Hash a literal string (repeatable)
    #[arg(short = 's', long = "string")]
    strings: Vec<String>,

    /// Read SHA-256 sums from LIST and check them
    #[arg(short = 'c', long = "check", value_name = "LIST")]
    check: Option<PathBuf>,

    /// Read buffer size in bytes
    #[arg(long = "buffer-size", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Run a hashing throughput benchmark and exit
    #[arg(long = "bench", default_value_t = false)]
    bench: bool,

    /// Benchmark input size in MiB
    #[arg(long = "bench-size-mb", default_value_t = 64)]
    bench_size_mb: usize,

    /// Update size in bytes for the streamed benchmark pass
    #[arg(long = "bench-chunk", default_value_t = 1024)]
    bench_chunk: usize,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,
}

/// One parsed line of a checksum list.
#[derive(Debug, PartialEq)]
struct CheckEntry {
    expected: Digest,
    path: PathBuf,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn is_stdin(path: &Path) -> bool {
    path == Path::new("-")
}

/// Hash a file, or stdin for "-".
fn hash_path(path: &Path, buffer_size: usize) -> anyhow::Result<Digest> {
    if is_stdin(path) {
        return hash_reader(io::stdin().lock(), buffer_size).context("reading stdin");
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    hash_reader(file, buffer_size).with_context(|| format!("reading {}", path.display()))
}

/// `sha256sum` output format.
fn format_file_line(digest: &Digest, path: &Path) -> String {
    format!("{}  {}", digest, path.display())
}

fn format_string_line(digest: &Digest, text: &str) -> String {
    format!("{}  \"{}\"", digest, text)
}

/// Parse `<hex>  <path>` (text mode) or `<hex> *<path>` (binary mode).
fn parse_check_line(line: &str) -> Result<CheckEntry, String> {
    let (hex, rest) = match (line.get(..HEX_DIGEST_LEN), line.get(HEX_DIGEST_LEN..)) {
        (Some(hex), Some(rest)) => (hex, rest),
        _ => return Err("line too short for a SHA-256 digest".to_string()),
    };

    let path = rest
        .strip_prefix("  ")
        .or_else(|| rest.strip_prefix(" *"))
        .ok_or_else(|| "expected two spaces or ' *' after the digest".to_string())?;
    if path.is_empty() {
        return Err("missing file name".to_string());
    }

    let expected = Digest::from_hex(hex).map_err(|e| e.to_string())?;
    Ok(CheckEntry {
        expected,
        path: PathBuf::from(path),
    })
}

/// Verify every entry of a checksum list. Returns true if all entries match.
fn run_check(list: &Path, buffer_size: usize) -> anyhow::Result<bool> {
    let contents = if is_stdin(list) {
        let mut s = String::new();
        io::stdin()
            .read_to_string(&mut s)
            .context("reading checksum list from stdin")?;
        s
    } else {
        fs::read_to_string(list).with_context(|| format!("reading {}", list.display()))?
    };

    let mut entries = Vec::new();
    let mut malformed = 0usize;
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_check_line(line) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                eprintln!("{}:{}: {}", list.display(), idx + 1, err);
                malformed += 1;
            }
        }
    }

    if entries.is_empty() {
        bail!(
            "{}: no properly formatted SHA-256 checksum lines found",
            list.display()
        );
    }

    debug!(entries = entries.len(), malformed, "checking digests");

    let results = hash_sources(&entries, buffer_size, |entry| Ok(File::open(&entry.path)?));

    let mut mismatched = 0usize;
    let mut unreadable = 0usize;
    for (entry, result) in entries.iter().zip(results) {
        match result {
            Ok(digest) if digest == entry.expected => println!("{}: OK", entry.path.display()),
            Ok(_) => {
                println!("{}: FAILED", entry.path.display());
                mismatched += 1;
            }
            Err(err) => {
                eprintln!("fips256: {}: {}", entry.path.display(), err);
                println!("{}: FAILED open or read", entry.path.display());
                unreadable += 1;
            }
        }
    }

    if malformed > 0 {
        eprintln!("WARNING: {} line(s) improperly formatted", malformed);
    }
    if unreadable > 0 {
        eprintln!("WARNING: {} listed file(s) could not be read", unreadable);
    }
    if mismatched > 0 {
        eprintln!("WARNING: {} computed checksum(s) did NOT match", mismatched);
    }

    Ok(malformed == 0 && unreadable == 0 && mismatched == 0)
}

/// Hash deterministic pseudo-random data once in a single update and once in
/// `chunk`-sized updates; both must agree.
fn run_bench(size_mb: usize, chunk: usize) -> anyhow::Result<()> {
    ensure!(size_mb > 0, "--bench-size-mb must be at least 1");
    ensure!(chunk > 0, "--bench-chunk must be at least 1");

    let total = size_mb
        .checked_mul(1024 * 1024)
        .with_context(|| format!("--bench-size-mb {} is too large", size_mb))?;
    let mut data = vec![0u8; total];
    ChaCha8Rng::seed_from_u64(0).fill_bytes(&mut data);

    let mib = size_mb as f64;

    let start = Instant::now();
    let single = hash(&data);
    let single_secs = start.elapsed().as_secs_f64().max(f64::EPSILON);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(ProgressStyle::with_template(
        "{bar:40} {bytes}/{total_bytes} ({bytes_per_sec})",
    )?);

    let start = Instant::now();
    let mut hasher = Sha256::new();
    for step in data.chunks(BENCH_PROGRESS_STEP) {
        for piece in step.chunks(chunk) {
            hasher.update(piece);
        }
        pb.inc(step.len() as u64);
    }
    let streamed = hasher.finalize();
    let streamed_secs = start.elapsed().as_secs_f64().max(f64::EPSILON);
    pb.finish_and_clear();

    println!("Input:          {} MiB", size_mb);
    println!("Single update:  {:.1} MiB/s", mib / single_secs);
    println!("{}-byte updates: {:.1} MiB/s", chunk, mib / streamed_secs);
    println!("Digest:         {}", single);

    if single != streamed {
        bail!("streamed digest {} differs from single-update digest", streamed);
    }
    Ok(())
}

/// Returns Ok(false) when some input failed but processing continued.
fn run(args: &Args) -> anyhow::Result<bool> {
    ensure!(args.buffer_size > 0, "--buffer-size must be at least 1");

    if args.bench {
        run_bench(args.bench_size_mb, args.bench_chunk)?;
        return Ok(true);
    }

    if let Some(list) = &args.check {
        return run_check(list, args.buffer_size);
    }

    for text in &args.strings {
        println!("{}", format_string_line(&hash(text), text));
    }

    let stdin_only = [PathBuf::from("-")];
    let files: &[PathBuf] = if args.files.is_empty() && args.strings.is_empty() {
        &stdin_only
    } else {
        &args.files
    };

    let mut all_ok = true;
    for path in files {
        match hash_path(path, args.buffer_size) {
            Ok(digest) => println!("{}", format_file_line(&digest, path)),
            Err(err) => {
                eprintln!("fips256: {:#}", err);
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(?args, "starting");

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(2);
        }
    }
}
