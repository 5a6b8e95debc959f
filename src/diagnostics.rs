//! Markdown diagnostics for every error, printed to stderr.
use std::fmt::Write as _;
use std::path::Path;

use crate::error::Error;

/// ANSI bold, used for markdown headings.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// A copy refused to overwrite an existing file.
fn render_destination_exists(path: &Path) -> String {
    return format!("\
# Error: Destination Exists

`{}` already exists. Copying never overwrites a file.

## Fix

Pick a new path, or remove the file first.
", path.display());
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ComposerInvalid { path, reason } => format!("\
# Error: Invalid composer.json

`{}`: {reason}
", path.display()),
        Error::DestinationExists { path } => render_destination_exists(path),
        Error::FileTooLarge { file, max_bytes, size_bytes } => render_file_too_large(file, *size_bytes, *max_bytes),
        Error::GitFailed { reason, root } => render_git_failed(root, reason),
        Error::InvalidName { input } => render_invalid_name(input),
        Error::Io(err) => format!("\
# Error: I/O

{err}
"),
        Error::Json(err) => format!("\
# Error: JSON

{err}
"),
        Error::ParseFailed { file, reason } => format!("\
# Error: Parse Failed

Could not parse `{}`: {reason}
", file.display()),
        Error::ReadFailed { path, source } => format!("\
# Error: Read Failed

Could not read `{}`: {source}

No files after it were scanned.
", path.display()),
        Error::ReplaceFailed { end, expected, file, start } => format!("\
# Error: Replace Failed

Expected `{expected}` at bytes {start}..{end} of `{}`.

The file probably changed while it was being scanned. Re-run the rename.
", file.display()),
        Error::TomlDe(err) => format!("\
# Error: Invalid .classref.toml

{err}
"),
        Error::UnknownRoot { known, name } => render_unknown_root(name, known),
        Error::UnmappedClass { class } => render_unmapped_class(class),
        Error::UnmappedPath { path } => render_unmapped_path(path),
        Error::WriteFailed { path, source } => render_write_failed(path, source),
    };
}

/// A source file over the parser's size limit.
fn render_file_too_large(file: &Path, size_bytes: u64, max_bytes: u64) -> String {
    return format!("\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).
", file.display());
}

/// `git ls-files` could not run or failed.
fn render_git_failed(root: &Path, reason: &str) -> String {
    return format!("\
# Error: Git Failed

`git ls-files` failed in `{}`: {reason}

## Fix

Use the `simple` root for directories that are not git repositories:

    classref references <class> --root simple
", root.display());
}

/// Input that is neither a class name nor a path.
fn render_invalid_name(input: &str) -> String {
    return format!("\
# Error: Invalid Class Name

`{input}` is not a fully-qualified class name or a `.php` path.

Class names look like `Acme\\Billing\\Invoice`.
");
}

/// Requested root is not registered; list the ones that are.
fn render_unknown_root(name: &str, known: &[String]) -> String {
    let mut out = format!("\
# Error: Unknown Root

Root `{name}` is not configured.

## Available roots

");
    for k in known {
        let _ = writeln!(out, "- `{k}`");
    }
    let _ = write!(out, "\
\n## Fix

Add it to `.classref.toml`:

    [roots.{name}]
    kind = \"simple\"
    path = \"src\"
");
    return out;
}

/// Class outside every autoload prefix.
fn render_unmapped_class(class: &str) -> String {
    return format!("\
# Error: Unmapped Class

No autoload prefix covers `{class}`.

## Fix

Add a prefix to `.classref.toml`:

    [autoload]
    \"Acme\\\\\" = \"src/\"
");
}

/// Path outside every autoload directory.
fn render_unmapped_path(path: &Path) -> String {
    return format!("\
# Error: Unmapped Path

`{}` is outside every autoload directory, so its class name is unknown.

## Fix

Pass the class name instead, or add the directory to `[autoload]` in `.classref.toml`.
", path.display());
}

/// Write failure mid-operation; earlier rewrites are not rolled back.
fn render_write_failed(path: &Path, source: &std::io::Error) -> String {
    return format!("\
# Error: Write Failed

Could not write `{}`: {source}

Files listed before it may already have been rewritten; files after it were not touched.
", path.display());
}
