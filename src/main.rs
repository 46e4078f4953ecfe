use clap::{Parser, Subcommand};
use imgsquash::output::{self, RunSummary};
use imgsquash::{Contents, FileObject, FormatRegistry, Squash, config};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "imgsquash")]
#[command(about = "Re-encode, resize and fan out images in a directory tree")]
#[command(long_about = "\
Re-encode, resize and fan out images in a directory tree

Every file under --source is copied to --output at the same relative path.
Recognized images (png, jpg/jpeg, webp) are decoded and re-encoded on the
way; everything else is copied unchanged.

  squash.toml                  # optional, in --source or given with --config
  [encode.webp]                # one output per codec, in declaration order
  [encode.avif]
  [fit]
  contain = 1600               # resize each image to fit a 1600px box

With no configuration, each image is re-encoded to its own format.

Run 'imgsquash gen-config' to print a documented squash.toml.
Set RUST_LOG=debug to see per-file decisions.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform every file under a source directory
    Run {
        /// Source directory
        #[arg(long, default_value = "src")]
        source: PathBuf,

        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,

        /// Config file (default: <source>/squash.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Parallel workers (overrides processing.max_processes)
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },
    /// Print the default encode options per extension as JSON
    Defaults,
    /// Print a stock squash.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            source,
            output: output_dir,
            config: config_path,
            jobs,
        } => {
            let mut squash_config = match config_path {
                Some(path) => config::load_config_file(&path)?,
                None => config::load_config(&source)?,
            };
            if let Some(jobs) = jobs {
                squash_config.processing.max_processes = Some(jobs.max(1));
            }
            let threads = init_thread_pool(&squash_config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let root = source.clone();
            let printer = std::thread::spawn(move || {
                let mut summary = RunSummary::default();
                for (index, event) in rx.into_iter().enumerate() {
                    output::print_stage_event(index + 1, &event, &root);
                    summary.record(&event);
                }
                summary
            });

            let stage = Squash::from_input(squash_config.to_input()?)
                .concurrency(threads)
                .events(tx);
            let cwd = std::env::current_dir()?;
            let mut write_errors = 0;
            for result in stage.stream(source_files(&source, &output_dir, &cwd)) {
                match result {
                    Ok(file) => {
                        if let Err(e) = write_output(&file, &output_dir) {
                            warn!(path = %file.path.display(), error = %e, "write failed");
                            write_errors += 1;
                        }
                    }
                    // Already reported through the event printer
                    Err(e) if !e.is_fatal() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            drop(stage);

            let summary = printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            println!();
            println!("{}", output::format_summary(&summary));

            let failed = summary.failed + write_errors;
            if failed > 0 {
                return Err(format!("{failed} file(s) failed").into());
            }
        }
        Command::Defaults => {
            let defaults = FormatRegistry::global().default_encode_options();
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: the user can constrain down,
/// not up. The same count is the stream window.
fn init_thread_pool(processing: &config::ProcessingConfig) -> usize {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
    threads
}

/// Lazily read every entry under `source` as a file object.
///
/// Directories become `Null` markers. The output directory and the config
/// file at the source root are skipped; unreadable files are logged and
/// skipped.
fn source_files<'a>(
    source: &'a Path,
    output: &'a Path,
    cwd: &'a Path,
) -> impl Iterator<Item = FileObject> + 'a {
    let config_path = source.join(config::CONFIG_FILE);
    WalkDir::new(source)
        .sort_by_file_name()
        .min_depth(1)
        .into_iter()
        .filter_entry(move |entry| entry.path() != output)
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    return None;
                }
            };
            let path = entry.path();
            if path == config_path {
                return None;
            }
            if entry.file_type().is_dir() {
                let marker = FileObject::new(path, Vec::new()).with_contents(Contents::Null);
                return Some(marker.with_base(source).with_cwd(cwd));
            }
            match fs::read(path) {
                Ok(bytes) => Some(FileObject::new(path, bytes).with_base(source).with_cwd(cwd)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    None
                }
            }
        })
}

/// Write one stage output under `output`, mirroring its path relative to base.
fn write_output(file: &FileObject, output: &Path) -> std::io::Result<()> {
    let dest = output.join(file.relative());
    match &file.contents {
        Contents::Null => fs::create_dir_all(&dest),
        Contents::Buffer(bytes) => {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, bytes)
        }
        Contents::Stream(_) => Err(std::io::Error::other("stream contents cannot be written")),
    }
}
