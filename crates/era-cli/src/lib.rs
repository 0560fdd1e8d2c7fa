//! Batch driver for the ERA simulator: argument model, output naming and file
//! persistence around [`era_core::simulate`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use era_core::{simulate, write_dump, BoundsCheck, SimConfig, SimulationFailure};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
use tempfile as _;

/// Image simulated when no inputs are given.
pub const DEFAULT_SOURCE: &str = "compiled_code.bin";

/// Command-line arguments of `era-sim`.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    name = "era-sim",
    version,
    about = "ERA instruction-set simulator",
    after_help = "Default binary file is 'compiled_code.bin'.\n\
                  Default dump file is 'dump_' + binary file stem + '.dmp'.\n\
                  Default print file is 'print_' + binary file stem + '.eralog'."
)]
pub struct Args {
    /// Binary files to simulate.
    #[arg(short = 's', value_name = "FILE", num_args = 1..)]
    pub sources: Vec<PathBuf>,
    /// Folders whose files are all simulated.
    #[arg(short = 'd', value_name = "DIR", num_args = 1..)]
    pub dirs: Vec<PathBuf>,
    /// Memory dump files, matched to inputs by position.
    #[arg(short = 'o', value_name = "FILE", num_args = 1..)]
    pub dumps: Vec<PathBuf>,
    /// Print-log files, matched to inputs by position.
    #[arg(long = "op", value_name = "FILE", num_args = 1..)]
    pub prints: Vec<PathBuf>,
    /// Create missing output folders.
    #[arg(short = 'p')]
    pub create_folders: bool,
    /// Memory size in bytes.
    #[arg(long = "b", value_name = "BYTES", conflicts_with_all = ["kilobytes", "megabytes"])]
    pub bytes: Option<u32>,
    /// Memory size in kilobytes.
    #[arg(long = "kb", value_name = "KB", conflicts_with = "megabytes")]
    pub kilobytes: Option<u32>,
    /// Memory size in megabytes.
    #[arg(long = "mb", value_name = "MB")]
    pub megabytes: Option<u32>,
    /// Append the execution trace to the dump file.
    #[arg(long)]
    pub trace: bool,
    /// Skip dump generation (also disables the trace).
    #[arg(long)]
    pub nodump: bool,
    /// Fault `LD`/`ST` whenever any byte of the word is outside memory.
    #[arg(long)]
    pub strict_bounds: bool,
}

/// Failure while driving a batch.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading an input or writing an output failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or folder involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The image failed to load or execute.
    #[error("\"{}\": {failure}", path.display())]
    Simulation {
        /// Simulated image.
        path: PathBuf,
        /// Failure with partial diagnostics.
        #[source]
        failure: SimulationFailure,
    },
    /// An output folder is missing and `-p` was not given.
    #[error("Folder \"{}\" does not exist", .0.display())]
    MissingFolder(PathBuf),
    /// Requested memory size does not fit in 32 bits.
    #[error("memory size of {value} {unit} exceeds 4 GiB")]
    MemorySize {
        /// Value given on the command line.
        value: u32,
        /// Unit flag.
        unit: &'static str,
    },
}

impl CliError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Args {
    /// Memory size selected by `--b`, `--kb` or `--mb`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MemorySize`] when the size overflows `u32`.
    pub fn memory_bytes(&self) -> Result<Option<u32>, CliError> {
        let scaled = |value: u32, factor: u32, unit| {
            value
                .checked_mul(factor)
                .ok_or(CliError::MemorySize { value, unit })
        };

        match (self.bytes, self.kilobytes, self.megabytes) {
            (Some(bytes), _, _) => Ok(Some(bytes)),
            (None, Some(kb), _) => scaled(kb, 1024, "KB").map(Some),
            (None, None, Some(mb)) => scaled(mb, 1024 * 1024, "MB").map(Some),
            (None, None, None) => Ok(None),
        }
    }

    /// Core configuration for every image in the batch.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MemorySize`] when the memory size overflows.
    pub fn sim_config(&self) -> Result<SimConfig, CliError> {
        let mut config = SimConfig::default().with_tracing(self.include_trace());
        if let Some(bytes) = self.memory_bytes()? {
            config = config.with_memory_bytes(bytes);
        }
        if self.strict_bounds {
            config = config.with_bounds_check(BoundsCheck::Strict);
        }
        Ok(config)
    }

    /// Whether dumps carry the execution trace.
    #[must_use]
    pub const fn include_trace(&self) -> bool {
        self.trace && !self.nodump
    }

    /// Input images in batch order: `-s` files, then the files of each `-d`
    /// folder sorted by name. Falls back to [`DEFAULT_SOURCE`].
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] when a folder cannot be listed.
    pub fn inputs(&self) -> Result<Vec<PathBuf>, CliError> {
        let mut inputs = self.sources.clone();

        for dir in &self.dirs {
            let mut files = Vec::new();
            for entry in fs::read_dir(dir).map_err(|error| CliError::io(dir, error))? {
                let entry = entry.map_err(|error| CliError::io(dir, error))?;
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                }
            }
            files.sort();
            inputs.extend(files);
        }

        if inputs.is_empty() && self.dirs.is_empty() {
            inputs.push(PathBuf::from(DEFAULT_SOURCE));
        }

        Ok(inputs)
    }
}

/// Output path next to `input`: `<prefix><stem>.<extension>`.
#[must_use]
pub fn default_output_path(input: &Path, prefix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "out".into(), |stem| stem.to_string_lossy());
    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    parent.join(format!("{prefix}{stem}.{extension}"))
}

/// Elapsed time as `MMm SS.CCs`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{:02}m {:02}.{:02}s",
        secs / 60,
        secs % 60,
        elapsed.subsec_millis() / 10
    )
}

/// Makes sure the folder holding `path` exists.
///
/// # Errors
///
/// Returns [`CliError::MissingFolder`] when it is missing and `create` is
/// unset, or [`CliError::Io`] when creating it fails.
pub fn ensure_parent(path: &Path, create: bool) -> Result<(), CliError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Ok(());
    };
    if parent.is_dir() {
        return Ok(());
    }
    if !create {
        return Err(CliError::MissingFolder(parent.to_path_buf()));
    }
    fs::create_dir_all(parent).map_err(|error| CliError::io(parent, error))
}

fn write_output(
    path: &Path,
    create: bool,
    write: impl FnOnce(&mut fs::File) -> io::Result<()>,
) -> Result<(), CliError> {
    ensure_parent(path, create)?;
    let mut file = fs::File::create(path).map_err(|error| CliError::io(path, error))?;
    write(&mut file).map_err(|error| CliError::io(path, error))
}

/// Per-image output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Memory dump file.
    pub dump: PathBuf,
    /// Print-log file.
    pub print: PathBuf,
    /// Diagnostics file written when the run fails.
    pub error: PathBuf,
}

impl OutputPaths {
    /// Resolves outputs for the `index`-th input, honouring `-o` and `--op`.
    #[must_use]
    pub fn for_input(args: &Args, index: usize, input: &Path) -> Self {
        Self {
            dump: args
                .dumps
                .get(index)
                .cloned()
                .unwrap_or_else(|| default_output_path(input, "dump_", "dmp")),
            print: args
                .prints
                .get(index)
                .cloned()
                .unwrap_or_else(|| default_output_path(input, "print_", "eralog")),
            error: default_output_path(input, "error_", "dmp"),
        }
    }
}

/// Totals for a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Images that ran to `STOP`.
    pub simulated: usize,
    /// Images that failed to read, load or execute.
    pub failed: usize,
}

impl BatchSummary {
    /// `true` when every image succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

fn report<W: Write>(out: &mut W, line: impl std::fmt::Display) {
    // Progress lines are best effort.
    let _ = writeln!(out, "{line}");
}

/// Simulates one image and writes its outputs.
///
/// A missing output folder is reported on `out` and only that output is
/// skipped.
///
/// # Errors
///
/// Returns [`CliError`] when the image cannot be read or the simulation
/// fails. In the latter case the error dump has already been written.
pub fn process_file<W: Write>(
    args: &Args,
    config: &SimConfig,
    input: &Path,
    outputs: &OutputPaths,
    out: &mut W,
) -> Result<(), CliError> {
    let image = fs::read(input).map_err(|error| CliError::io(input, error))?;
    tracing::debug!(path = %input.display(), bytes = image.len(), "simulating image");

    let started = Instant::now();
    let result = simulate(&image, config);
    let elapsed = format_elapsed(started.elapsed());

    let report_data = match result {
        Ok(report_data) => report_data,
        Err(failure) => {
            let diagnostics = &failure.diagnostics;
            let write_result = write_output(&outputs.error, args.create_folders, |file| {
                file.write_all(diagnostics.trace_text().as_bytes())?;
                file.write_all(b"\n\n")?;
                file.write_all(diagnostics.print_log().as_bytes())
            });
            if let Err(error) = write_result {
                tracing::warn!(%error, "error dump not written");
            }
            return Err(CliError::Simulation {
                path: input.to_path_buf(),
                failure,
            });
        }
    };

    let dump_result = if args.nodump {
        ensure_parent(&outputs.dump, args.create_folders)
    } else {
        write_output(&outputs.dump, args.create_folders, |file| {
            let mut writer = io::BufWriter::new(file);
            write_dump(&mut writer, &report_data, args.include_trace())?;
            writer.flush()
        })
    };
    match dump_result {
        Ok(()) => report(
            out,
            format_args!("\"{}\" has been simulated ({elapsed}).", input.display()),
        ),
        Err(error @ CliError::MissingFolder(_)) => report(out, error),
        Err(error) => return Err(error),
    }

    let print_log = report_data.diagnostics.print_log();
    match write_output(&outputs.print, args.create_folders, |file| {
        file.write_all(print_log.as_bytes())
    }) {
        Ok(()) => Ok(()),
        Err(error @ CliError::MissingFolder(_)) => {
            report(out, error);
            Ok(())
        }
        Err(error) => Err(error),
    }
}

/// Runs every input of `args`, reporting progress and per-image failures on
/// `out`. One failing image does not stop the batch.
///
/// # Errors
///
/// Returns [`CliError`] only for batch-level problems: an unlistable `-d`
/// folder or an invalid memory size.
pub fn run_batch<W: Write>(args: &Args, out: &mut W) -> Result<BatchSummary, CliError> {
    let config = args.sim_config()?;
    let inputs = args.inputs()?;
    let mut summary = BatchSummary::default();

    for (index, input) in inputs.iter().enumerate() {
        let outputs = OutputPaths::for_input(args, index, input);
        match process_file(args, &config, input, &outputs, out) {
            Ok(()) => summary.simulated += 1,
            Err(error) => {
                tracing::error!(path = %input.display(), %error, "image failed");
                report(out, &error);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Installs the stderr `tracing` subscriber, filtered by `RUST_LOG`
/// (default `info`). Calling it twice is harmless.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
