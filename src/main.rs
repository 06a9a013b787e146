//! Entry point for the `siloc` compiler CLI.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use xmlsilo::compile::Builder;
use xmlsilo::flags::CompileFlags;
use xmlsilo::silo::Silo;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory of XML files to compile, when no subcommand is given.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Output file path for the compiled silo.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Bypass `ensure()`'s cache check and always recompile.
    #[arg(short, long, default_value_t = false)]
    force: bool,

    /// Suppress whitespace normalization on text nodes.
    #[arg(long, default_value_t = false)]
    literal_text: bool,

    /// Enable xml:lang pruning against the given comma-separated locales.
    #[arg(long, value_delimiter = ',')]
    native_langs: Vec<String>,

    /// Continue past per-import parse failures instead of aborting.
    #[arg(long, default_value_t = false)]
    ignore_invalid: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compiles several independent directories in parallel, one `.silo` per directory.
    Batch {
        /// Directories to compile.
        dirs: Vec<PathBuf>,

        /// Suppress whitespace normalization on text nodes.
        #[arg(long, default_value_t = false)]
        literal_text: bool,

        /// Enable xml:lang pruning against the given comma-separated locales.
        #[arg(long, value_delimiter = ',')]
        native_langs: Vec<String>,

        /// Continue past per-import parse failures instead of aborting.
        #[arg(long, default_value_t = false)]
        ignore_invalid: bool,
    },

    /// Loads an existing silo and dumps a summary of its header as JSON.
    Inspect {
        /// Path to a compiled `.silo` file.
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Batch {
            dirs,
            literal_text,
            native_langs,
            ignore_invalid,
        }) => {
            let flags = compile_flags(literal_text, !native_langs.is_empty(), ignore_invalid);
            run_batch(&dirs, flags, &native_langs)
        }
        Some(Command::Inspect { path }) => run_inspect(&path),
        None => {
            let flags = compile_flags(cli.literal_text, !cli.native_langs.is_empty(), cli.ignore_invalid);
            run_compile(&cli.path, cli.output, cli.force, flags, &cli.native_langs)
        }
    }
}

fn compile_flags(literal_text: bool, native_langs: bool, ignore_invalid: bool) -> CompileFlags {
    let mut flags = CompileFlags::empty();
    if literal_text {
        flags |= CompileFlags::LITERAL_TEXT;
    }
    if native_langs {
        flags |= CompileFlags::NATIVE_LANGS;
    }
    if ignore_invalid {
        flags |= CompileFlags::IGNORE_INVALID;
    }
    flags
}

fn run_compile(
    dir: &PathBuf,
    output: Option<PathBuf>,
    force: bool,
    flags: CompileFlags,
    locales: &[String],
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| dir.with_extension("silo"));
    info!(?dir, ?output, "compiling directory");

    let mut builder = Builder::new();
    builder.import_dir(dir, None)?;

    let silo = if force {
        let silo = builder.compile(flags, locales)?;
        silo.save_to_file(&output)?;
        silo
    } else {
        builder.ensure(&output, flags, locales)?
    };

    info!(guid = silo.get_guid(), bytes = silo.get_bytes().len(), "done");
    Ok(())
}

fn run_batch(dirs: &[PathBuf], flags: CompileFlags, locales: &[String]) -> anyhow::Result<()> {
    let results: Vec<anyhow::Result<()>> = dirs
        .par_iter()
        .map(|dir| {
            let output = dir.with_extension("silo");
            let mut builder = Builder::new();
            builder.import_dir(dir, None)?;
            let silo = builder.compile(flags, locales)?;
            silo.save_to_file(&output)?;
            info!(?dir, ?output, guid = silo.get_guid(), "compiled");
            Ok(())
        })
        .collect();

    let mut failures = 0;
    for result in results {
        if let Err(e) = result {
            error!("batch entry failed: {e}");
            failures += 1;
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} directories failed to compile", dirs.len());
    }
    Ok(())
}

#[derive(Serialize)]
struct InspectSummary {
    magic: &'static str,
    version: u32,
    strtab_offset: u32,
    strtab_ntags: u32,
    guid: String,
    total_bytes: usize,
}

fn run_inspect(path: &PathBuf) -> anyhow::Result<()> {
    let silo = Silo::load_from_file(path)?;
    let header = silo.header();
    let summary = InspectSummary {
        magic: "SILO",
        version: header.version,
        strtab_offset: header.strtab,
        strtab_ntags: header.strtab_ntags,
        guid: silo.get_guid(),
        total_bytes: silo.get_bytes().len(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}
