// Command-line front end for assetpack.
//
// Subcommands build, inspect, and unpack archives. Errors are printed as
// `assetpack: <context>: <error>` and mapped to exit code 1.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::block::Compression;
use crate::block::token::{MAX_LITERAL_RUN, MAX_MATCH_LEN};
use crate::hash::config::{HASH_BITS, MAX_DISTANCE, MAX_LEVEL, MIN_MATCH, WINDOW_SIZE};
use crate::io::extract_all;
use crate::pack::{self, BuildOptions, Pack, PackError};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Build and read compressed asset archives.
#[derive(Parser, Debug)]
#[command(
    name = "assetpack",
    version,
    about = "Asset archive builder and reader",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Overwrite an existing output archive.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Pack files into a new archive.
    Build(BuildArgs),
    /// Print the archive header.
    Info(ArchiveArgs),
    /// List every item with its sizes.
    List(ArchiveArgs),
    /// Write one item's bytes to stdout.
    Cat(CatArgs),
    /// Unpack every item into a directory.
    Extract(ExtractArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Archive to create.
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Compression level (1-9).
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..=9), conflicts_with_all = ["fast", "store"])]
    level: Option<u32>,

    /// Single-pass compression.
    #[arg(long, conflicts_with = "store")]
    fast: bool,

    /// Store every item uncompressed.
    #[arg(long)]
    store: bool,

    /// Build number recorded in the header.
    #[arg(long = "build-number", default_value_t = 0)]
    build_number: u32,

    /// Files to pack, stored under their paths as given.
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct ArchiveArgs {
    /// Archive file.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,
}

#[derive(Args, Debug)]
struct CatArgs {
    /// Archive file.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,

    /// Item path inside the archive.
    item: String,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Archive file.
    #[arg(value_hint = ValueHint::FilePath)]
    archive: PathBuf,

    /// Directory to write items into.
    #[arg(value_hint = ValueHint::DirPath)]
    destination: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Build {
        output: PathBuf,
        files: Vec<PathBuf>,
        build: BuildOptions,
    },
    Info(PathBuf),
    List(PathBuf),
    Cat {
        archive: PathBuf,
        item: String,
    },
    Extract {
        archive: PathBuf,
        destination: PathBuf,
    },
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

fn compression_for(args: &BuildArgs) -> Compression {
    if args.store {
        Compression::Store
    } else if args.fast {
        Compression::Fast
    } else if let Some(level) = args.level {
        Compression::Level(level)
    } else {
        Compression::default()
    }
}

fn resolve_options(cli: Cli) -> Options {
    let command = match cli.command {
        Cmd::Build(args) => Command::Build {
            build: BuildOptions {
                compression: compression_for(&args),
                build_number: args.build_number,
            },
            output: args.output,
            files: args.files,
        },
        Cmd::Info(args) => Command::Info(args.archive),
        Cmd::List(args) => Command::List(args.archive),
        Cmd::Cat(args) => Command::Cat {
            archive: args.archive,
            item: args.item,
        },
        Cmd::Extract(args) => Command::Extract {
            archive: args.archive,
            destination: args.destination,
        },
        Cmd::Config => Command::Config,
    };

    Options {
        command,
        force: cli.force,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("assetpack".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

fn print_json(value: serde_json::Value) {
    match serde_json::to_string_pretty(&value) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("assetpack: json: {e}"),
    }
}

/// Default `RUST_LOG` filter for the given verbosity.
fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("assetpack version {version} (Rust)");

    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;

    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("BYTE_ORDER={}", pack::cursor::Endian::NATIVE.name());
    eprintln!("DEFAULT_LEVEL={MAX_LEVEL}");
    eprintln!("HASH_BITS={HASH_BITS}");
    eprintln!("MIN_MATCH={MIN_MATCH}");
    eprintln!("WINDOW_SIZE={WINDOW_SIZE}");
    eprintln!("MAX_DISTANCE={MAX_DISTANCE}");
    eprintln!("MAX_LITERAL_RUN={MAX_LITERAL_RUN}");
    eprintln!("MAX_MATCH_LEN={MAX_MATCH_LEN}");

    0
}

// ---------------------------------------------------------------------------
// Build command
// ---------------------------------------------------------------------------

fn cmd_build(opts: &Options, output: &Path, files: &[PathBuf], build: BuildOptions) -> i32 {
    if !opts.force && output.exists() {
        eprintln!(
            "assetpack: output file: {}: already exists (use -f to overwrite)",
            output.display()
        );
        return 1;
    }

    let stats = match pack::build(output, files, build) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("assetpack: build: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "assetpack: built {}: {} items, {} -> {} bytes ({} compressed), archive {} bytes",
            output.display(),
            stats.items,
            stats.raw_bytes,
            stats.stored_bytes,
            stats.compressed_items,
            stats.archive_size
        );
        if let Some(digest) = stats.archive_sha256 {
            eprintln!("assetpack: sha256: {}", hex(&digest));
        }
    }

    if opts.json_output {
        print_json(serde_json::json!({
            "command": "build",
            "items": stats.items,
            "raw_bytes": stats.raw_bytes,
            "stored_bytes": stats.stored_bytes,
            "compressed_items": stats.compressed_items,
            "archive_size": stats.archive_size,
            "archive_sha256": stats.archive_sha256.map(|d| hex(&d)),
            "build_number": build.build_number,
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Inspection commands
// ---------------------------------------------------------------------------

fn cmd_info(opts: &Options, archive: &Path) -> i32 {
    let info = match pack::info(archive) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("assetpack: {}: {e}", archive.display());
            return 1;
        }
    };

    if !opts.quiet {
        println!("build number: {}", info.build_number);
        println!("items:        {}", info.item_count);
    }
    if opts.json_output {
        print_json(serde_json::json!({
            "command": "info",
            "build_number": info.build_number,
            "items": info.item_count,
        }));
    }
    0
}

/// One line per item; with `detailed`, a header plus offset and sizes.
fn write_listing<W: Write>(out: &mut W, pack: &Pack, detailed: bool) -> io::Result<()> {
    if detailed {
        writeln!(out, "{:>10} {:>10} {:>10}  path", "offset", "raw", "stored")?;
    }
    for record in pack.records() {
        if detailed {
            writeln!(
                out,
                "{:>10} {:>10} {:>10}  {}",
                record.file_offset,
                record.raw_size,
                record.stored_size(),
                record.path
            )?;
        } else {
            writeln!(out, "{}", record.path)?;
        }
    }
    out.flush()
}

fn cmd_list(opts: &Options, archive: &Path) -> i32 {
    let pack = match Pack::open(archive) {
        Ok(pack) => pack,
        Err(e) => {
            eprintln!("assetpack: {}: {e}", archive.display());
            return 1;
        }
    };

    if let Err(e) = write_listing(&mut io::stdout().lock(), &pack, opts.verbose > 0) {
        eprintln!("assetpack: write error: {e}");
        return 1;
    }

    if opts.json_output {
        let items: Vec<_> = pack
            .records()
            .map(|r| {
                serde_json::json!({
                    "path": r.path,
                    "raw_size": r.raw_size,
                    "stored_size": r.stored_size(),
                    "compressed": r.is_compressed(),
                })
            })
            .collect();
        print_json(serde_json::json!({ "command": "list", "items": items }));
    }
    pack.close();
    0
}

fn cmd_cat(archive: &Path, item: &str) -> i32 {
    let result = Pack::open(archive).and_then(|mut pack| {
        let data = pack.get(item)?;
        let written = io::stdout()
            .lock()
            .write_all(data.as_bytes())
            .and_then(|()| io::stdout().lock().flush());
        pack.release(data);
        pack.close();
        written.map_err(|source| PackError::Io {
            op: "write",
            path: PathBuf::from("<stdout>"),
            source,
        })
    });

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("assetpack: {}: {e}", archive.display());
            1
        }
    }
}

fn cmd_extract(opts: &Options, archive: &Path, destination: &Path) -> i32 {
    let stats = match extract_all(archive, destination) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("assetpack: extract: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        for file in &stats.files {
            eprintln!("assetpack: wrote {}", file.display());
        }
        eprintln!(
            "assetpack: extracted {} items ({} bytes)",
            stats.items, stats.bytes
        );
    }
    if opts.json_output {
        print_json(serde_json::json!({
            "command": "extract",
            "items": stats.items,
            "bytes": stats.bytes,
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(opts.quiet, opts.verbose)),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    let exit_code = match &opts.command {
        Command::Build {
            output,
            files,
            build,
        } => cmd_build(&opts, output, files, *build),
        Command::Info(archive) => cmd_info(&opts, archive),
        Command::List(archive) => cmd_list(&opts, archive),
        Command::Cat { archive, item } => cmd_cat(archive, item),
        Command::Extract {
            archive,
            destination,
        } => cmd_extract(&opts, archive, destination),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
