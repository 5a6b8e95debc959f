//! Rendering of scan results for the terminal.
use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Error;
use crate::types::{CopyResult, LocatedReference, OperationResult};

/// Pick the singular or plural form of `word`.
fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        return word.to_string();
    }
    return format!("{word}s");
}

/// Render a copy: the `[COPY]` line, then the renamed self-references.
pub fn render_copy(result: &CopyResult, preview: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[COPY] {} => {}", result.source.display(), result.destination.display());
    if !result.references.is_empty() {
        let _ = writeln!(out, "[REPL] {}", result.destination.display());
        render_replacements(&mut out, &result.references, &result.replacements);
    }

    let verb = if preview { "would copy" } else { "copied" };
    let _ = writeln!(out, "{verb} {} as {}", result.class, result.new_class);
    return out;
}

/// Pretty JSON for editor integrations.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
pub fn render_json<T: Serialize>(result: &T) -> Result<String, Error> {
    return Ok(serde_json::to_string_pretty(result)?);
}

/// Render found references grep-style: `file:line:col  line text`.
pub fn render_references(result: &OperationResult) -> String {
    let mut out = String::new();
    for file in &result.results {
        for r in &file.references {
            let _ = writeln!(out, "{}:{}:{}  {}", file.file.display(), r.line_no, r.col_no, r.line.trim());
        }
    }

    let count = result.reference_count();
    let files = result.results.len();
    let _ = writeln!(out, "{count} {} in {files} {}", plural(count, "reference"), plural(files, "file"));
    return out;
}

/// Render a rename: each file, then every matched span with its old and new name.
pub fn render_rename(result: &OperationResult, preview: bool) -> String {
    let mut out = String::new();
    for file in &result.results {
        let _ = writeln!(out, "[REPL] {}", file.file.display());
        render_replacements(&mut out, &file.references, &file.replacements);
    }

    let count = result.reference_count();
    let files = result.results.len();
    let verb = if preview { "would rename" } else { "renamed" };
    let _ = writeln!(out, "{verb} {count} {} in {files} {}", plural(count, "reference"), plural(files, "file"));
    return out;
}

/// One `start:end Old => New` line per original span. Every replacement
/// carries the same new name, so the first one names it.
fn render_replacements(out: &mut String, references: &[LocatedReference], replacements: &[LocatedReference]) {
    let new_name = replacements.first().map_or("?", |r| return r.reference.as_str());
    for r in references {
        let _ = writeln!(out, "       {}:{} {} => {new_name}", r.start, r.end, r.reference);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::{FileResult, FullyQualifiedName};

    fn located(start: usize, line: &str, name: &str) -> LocatedReference {
        LocatedReference {
            col_no: 4,
            end: start + name.len(),
            line: line.to_string(),
            line_no: 2,
            reference: FullyQualifiedName::new(name),
            start,
        }
    }

    fn sample() -> OperationResult {
        OperationResult {
            results: vec![FileResult {
                file: PathBuf::from("src/A.php"),
                references: vec![located(10, "    new Foo\\Bar();", "Foo\\Bar")],
                replacements: vec![located(10, "    new Foo\\Qux();", "Foo\\Qux")],
            }],
        }
    }

    #[test]
    fn references_are_grep_style() {
        let text = render_references(&sample());
        assert_eq!(text, "src/A.php:2:4  new Foo\\Bar();\n1 reference in 1 file\n");
    }

    #[test]
    fn rename_lists_spans_with_old_and_new_names() {
        let text = render_rename(&sample(), true);
        assert_eq!(
            text,
            "[REPL] src/A.php\n       10:17 Foo\\Bar => Foo\\Qux\nwould rename 1 reference in 1 file\n"
        );
    }

    #[test]
    fn copy_names_both_paths_then_the_renamed_spans() {
        let result = CopyResult {
            class: FullyQualifiedName::new("Foo\\Bar"),
            destination: PathBuf::from("src/Qux.php"),
            new_class: FullyQualifiedName::new("Foo\\Qux"),
            references: vec![located(10, "new Foo\\Bar();", "Foo\\Bar")],
            replacements: vec![located(10, "new Foo\\Qux();", "Foo\\Qux")],
            source: PathBuf::from("src/Bar.php"),
        };
        assert_eq!(
            render_copy(&result, false),
            "[COPY] src/Bar.php => src/Qux.php\n[REPL] src/Qux.php\n       10:17 Foo\\Bar => Foo\\Qux\ncopied Foo\\Bar as Foo\\Qux\n"
        );
    }

    #[test]
    fn json_uses_editor_field_names() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&sample()).unwrap()).unwrap();
        let reference = &json["results"][0]["references"][0];
        assert_eq!(reference["line_no"], 2);
        assert_eq!(reference["col_no"], 4);
        assert_eq!(reference["reference"], "Foo\\Bar");
        assert_eq!(json["results"][0]["file"], "src/A.php");
    }
}
