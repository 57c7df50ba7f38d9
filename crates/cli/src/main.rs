mod config;

use std::path::{Path, PathBuf};
use std::process;

use aidl_core::{
    dump_api, load_and_validate, preprocess, serialize_unit, Context, FileSystemProvider,
    LoadError, LoadedUnit, Options, Reporter,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// AIDL interface definition front end.
#[derive(Parser)]
#[command(name = "aidl", version, about = "AIDL interface definition front end")]
struct Cli {
    /// Output format for diagnostics and results (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Directory searched for imported declaration files (repeatable)
    #[arg(short = 'I', long = "include", global = true)]
    include: Vec<PathBuf>,

    /// Preprocessed file listing known types (repeatable)
    #[arg(short = 'p', long = "preprocessed", global = true)]
    preprocessed: Vec<PathBuf>,

    /// Reject units that reference unstructured parcelables
    #[arg(long, global = true)]
    structured: bool,

    /// Fail when an input only declares unstructured parcelables
    #[arg(long, global = true)]
    fail_on_parcelable: bool,

    /// TOML file with an [options] table, applied before the flags above
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log compiler phases to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, resolve and validate one .aidl file
    Check {
        /// Path to the .aidl source file
        file: PathBuf,
    },

    /// Write the types declared by the given files in preprocessed form
    Preprocess {
        /// Output file
        out: PathBuf,
        /// Input .aidl files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Render the API of the given files grouped by package
    DumpApi {
        /// Input .aidl files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the resolved unit of one .aidl file as JSON
    Export {
        /// Path to the .aidl source file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = match &cli.config {
        Some(path) => match config::read_config(path) {
            Ok(o) => o,
            Err(e) => {
                report_error(&e, cli.output, cli.quiet);
                process::exit(1);
            }
        },
        None => Options::default(),
    };
    options.merge(Options {
        import_paths: cli.include.clone(),
        preprocessed_files: cli.preprocessed.clone(),
        input_files: Vec::new(),
        structured: cli.structured,
        fail_on_parcelable: cli.fail_on_parcelable,
    });
    tracing::debug!(?options, "effective options");

    let mut ctx = Context::with_reporter(reporter_for(cli.output, cli.quiet));
    let code = match cli.command {
        Commands::Check { file } => cmd_check(&file, options, &mut ctx, cli.output, cli.quiet),
        Commands::Preprocess { out, files } => {
            options.input_files.extend(files);
            cmd_preprocess(&out, &options, &mut ctx, cli.output, cli.quiet)
        }
        Commands::DumpApi { files, out } => {
            options.input_files.extend(files);
            cmd_dump_api(out.as_deref(), &options, &mut ctx, cli.output, cli.quiet)
        }
        Commands::Export { file } => cmd_export(&file, options, &mut ctx, cli.output, cli.quiet),
    };
    process::exit(code);
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Text output echoes each diagnostic as it is found; JSON output collects
/// them and prints them all on failure.
fn reporter_for(output: OutputFormat, quiet: bool) -> Reporter {
    match output {
        OutputFormat::Text if !quiet => Reporter::new(),
        _ => Reporter::silent(),
    }
}

fn load(file: &Path, mut options: Options, ctx: &mut Context) -> Result<LoadedUnit, LoadError> {
    // the input itself can satisfy imports of files it imports
    options.input_files.push(file.to_path_buf());
    load_and_validate(file, &options, &FileSystemProvider, ctx)
}

fn cmd_check(
    file: &Path,
    options: Options,
    ctx: &mut Context,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let fail_on_parcelable = options.fail_on_parcelable;
    match load(file, options, ctx) {
        Ok(unit) => {
            let canonical = unit.defined_type.canonical_name();
            match output {
                OutputFormat::Json => {
                    let v = serde_json::json!({
                        "file": file.display().to_string(),
                        "status": "ok",
                        "type": canonical,
                    });
                    println!("{}", pretty(&v));
                }
                OutputFormat::Text => {
                    if !quiet {
                        println!("{}: {} ok", file.display(), canonical);
                    }
                }
            }
            0
        }
        Err(LoadError::FoundParcelable) if !fail_on_parcelable => {
            // nothing to generate, and nobody asked us to complain
            if !quiet && output == OutputFormat::Text {
                println!("{}: only unstructured parcelables, skipped", file.display());
            }
            0
        }
        Err(e) => fail(&e, ctx, output, quiet),
    }
}

fn cmd_export(
    file: &Path,
    options: Options,
    ctx: &mut Context,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let unit = match load(file, options, ctx) {
        Ok(u) => u,
        Err(e) => return fail(&e, ctx, output, quiet),
    };
    match serialize_unit(&unit.defined_type, &unit.imports, &mut ctx.reporter) {
        Ok(v) => {
            println!("{}", pretty(&v));
            0
        }
        Err(f) => fail(&LoadError::Fatal(f), ctx, output, quiet),
    }
}

fn cmd_preprocess(
    out: &Path,
    options: &Options,
    ctx: &mut Context,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let text = match preprocess(options, &FileSystemProvider, ctx) {
        Ok(t) => t,
        Err(e) => return fail(&e, ctx, output, quiet),
    };
    write_output(Some(out), &text, output, quiet)
}

fn cmd_dump_api(
    out: Option<&Path>,
    options: &Options,
    ctx: &mut Context,
    output: OutputFormat,
    quiet: bool,
) -> i32 {
    let text = match dump_api(options, &FileSystemProvider, ctx) {
        Ok(t) => t,
        Err(e) => return fail(&e, ctx, output, quiet),
    };
    write_output(out, &text, output, quiet)
}

fn write_output(out: Option<&Path>, text: &str, output: OutputFormat, quiet: bool) -> i32 {
    let Some(path) = out else {
        print!("{}", text);
        return 0;
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            report_error(
                &format!("could not create '{}': {}", parent.display(), e),
                output,
                quiet,
            );
            return 1;
        }
    }
    match std::fs::write(path, text) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), bytes = text.len(), "output written");
            0
        }
        Err(e) => {
            report_error(
                &format!("could not write '{}': {}", path.display(), e),
                output,
                quiet,
            );
            1
        }
    }
}

/// Print the failure and return the process exit status.
fn fail(error: &LoadError, ctx: &Context, output: OutputFormat, quiet: bool) -> i32 {
    match output {
        OutputFormat::Json => {
            let diagnostics: Vec<serde_json::Value> = ctx
                .reporter
                .diagnostics()
                .iter()
                .map(|d| d.to_json_value())
                .collect();
            let v = serde_json::json!({
                "diagnostics": diagnostics,
                "error": error.to_string(),
            });
            eprintln!("{}", pretty(&v));
        }
        OutputFormat::Text => report_error(&format!("aidl: {}", error), output, quiet),
    }
    1
}

fn pretty(v: &serde_json::Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|e| format!("serialization error: {}", e))
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
