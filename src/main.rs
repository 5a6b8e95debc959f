mod composer;
mod config;
mod diagnostics;
mod error;
mod filesystem;
mod finder;
mod location;
mod normalizer;
mod output;
mod replacer;
mod scanner;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::filesystem::FilesystemRegistry;
use crate::finder::PhpClassFinder;
use crate::replacer::TokenReplacer;
use crate::scanner::ClassReferences;

/// Command-line interface.
#[derive(Parser)]
#[command(name = "classref", about = "Find, rename, and copy fully-qualified class references")]
struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

/// Subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Copy a class file under a new name, renaming its declaration and self-references
    Copy {
        /// Path (or class name) the copy is written to
        #[arg(index = 2)]
        destination: String,
        /// Report what would be written without creating the file
        #[arg(long)]
        dry_run: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Named root the source is read through
        #[arg(long)]
        root: Option<String>,
        /// Path (or class name) of the class to copy
        #[arg(index = 1)]
        source: String,
    },
    /// List every reference to a class
    References {
        /// Class name (Acme\Foo) or path to its file
        class: String,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Named root to scan (defaults to `default_root` in .classref.toml)
        #[arg(long)]
        root: Option<String>,
    },
    /// Rename every reference to a class
    Rename {
        /// Current class name or path
        class: String,
        /// Report what would change without writing files
        #[arg(long)]
        dry_run: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// New class name or path
        new_class: String,
        /// Named root to scan
        #[arg(long)]
        root: Option<String>,
    },
    /// List the configured named roots
    Roots,
}

/// Wire the scanner with its concrete collaborators.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::ComposerInvalid` if autoload mappings cannot be read.
fn compose<'a>(config: &Config, registry: &'a FilesystemRegistry) -> Result<ClassReferences<'a>, error::Error> {
    let normalizer = config.build_normalizer()?;
    return Ok(ClassReferences::new(
        Box::new(normalizer),
        Box::new(PhpClassFinder::new()),
        Box::new(TokenReplacer),
        registry,
    ));
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "classref=warn",
        1 => "classref=info",
        _ => "classref=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parse arguments, run the command, and map errors to a diagnostic and exit code 1.
fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    return match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}

/// Dispatch one command against the project in the working directory.
///
/// # Errors
///
/// Returns any error from configuration, scanning, or output.
fn run(command: Commands) -> Result<(), error::Error> {
    let base = PathBuf::from(".");
    let config = Config::load(&base)?;
    let registry = config.build_registry();

    match command {
        Commands::Copy { destination, dry_run, json, root, source } => {
            let scanner = compose(&config, &registry)?;
            let root = root.unwrap_or_else(|| return config.default_root.clone());
            let result = scanner.copy(&root, &source, &destination, dry_run)?;
            if json {
                println!("{}", output::render_json(&result)?);
            } else {
                print!("{}", output::render_copy(&result, dry_run));
            }
        },
        Commands::References { class, json, root } => {
            let scanner = compose(&config, &registry)?;
            let root = root.unwrap_or_else(|| return config.default_root.clone());
            let result = scanner.find(&root, &class)?;
            if json {
                println!("{}", output::render_json(&result)?);
            } else {
                print!("{}", output::render_references(&result));
            }
        },
        Commands::Rename { class, dry_run, json, new_class, root } => {
            let scanner = compose(&config, &registry)?;
            let root = root.unwrap_or_else(|| return config.default_root.clone());
            let result = scanner.rename(&root, &class, &new_class, dry_run)?;
            if json {
                println!("{}", output::render_json(&result)?);
            } else {
                print!("{}", output::render_rename(&result, dry_run));
            }
        },
        Commands::Roots => {
            for (name, entry) in &config.roots {
                let marker = if *name == config.default_root { "*" } else { " " };
                println!("{marker} {name}  {}  {}", entry.kind.as_str(), entry.path);
            }
        },
    }

    return Ok(());
}
