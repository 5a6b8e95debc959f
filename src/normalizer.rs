//! Class name ↔ file path normalization through PSR-4 style prefixes.
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::types::{FullyQualifiedName, NAMESPACE_SEPARATOR};

/// Valid PHP class name: identifier segments joined by `\`.
#[allow(clippy::expect_used, reason = "hardcoded pattern is a compile-time invariant")]
static CLASS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^[\p{L}_][\p{L}\p{N}_]*(?:\\[\p{L}_][\p{L}\p{N}_]*)*$").expect("valid regex");
});

/// One namespace prefix and the directory it maps to.
#[derive(Debug, Clone)]
struct Mapping {
    /// Directory relative to the project root, without `.` components.
    dir: PathBuf,
    /// Empty, or ends with `\`.
    prefix: String,
}

/// Turns user input (a class name or a file path) into canonical forms.
pub trait NameNormalizer {
    /// Resolve input to a fully-qualified class name.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` for malformed input, or
    /// `Error::UnmappedPath` for a path outside every autoload directory.
    fn normalize_to_class(&self, input: &str) -> Result<FullyQualifiedName, Error>;

    /// Resolve input to the file that should define the class.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` for malformed input, or
    /// `Error::UnmappedClass` when no prefix covers the class.
    fn normalize_to_file(&self, input: &str) -> Result<PathBuf, Error>;
}

/// Normalizer driven by `prefix → directory` mappings under a project root.
#[derive(Debug, Clone)]
pub struct Psr4Normalizer {
    /// Prefix mappings, in configuration order.
    mappings: Vec<Mapping>,
    /// Project root that relative paths and mapping directories hang off.
    root: PathBuf,
}

impl Psr4Normalizer {
    /// Map a path to a class through the mapping with the deepest directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnmappedPath` if no mapping directory contains the path.
    fn class_for_path(&self, input: &str) -> Result<FullyQualifiedName, Error> {
        let path = self.resolve(input);
        let relative = path.strip_prefix(&self.root).unwrap_or(path.as_path());

        let best = self
            .mappings
            .iter()
            .filter(|m| return relative.starts_with(&m.dir))
            .max_by_key(|m| return m.dir.components().count())
            .ok_or_else(|| return Error::UnmappedPath { path: PathBuf::from(input) })?;

        let rest = relative.strip_prefix(&best.dir).unwrap_or(relative).with_extension("");
        let segments: Vec<String> = rest
            .components()
            .map(|c| return c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let class = format!("{}{}", best.prefix, segments.join("\\"));
        return validate_class_name(&class, input);
    }

    /// Normalizer rooted at `root`. Mapping prefixes gain a trailing separator
    /// and directories lose `.` components.
    pub fn new(root: PathBuf, mappings: Vec<(String, PathBuf)>) -> Self {
        let mappings = mappings
            .into_iter()
            .map(|(prefix, dir)| {
                return Mapping {
                    dir: clean_path(&dir),
                    prefix: normalize_prefix(&prefix),
                };
            })
            .collect();
        return Self {
            mappings,
            root: clean_path(&root),
        };
    }

    /// Anchor a path at the root (absolute input stays put) and fold `.`/`..`.
    fn resolve(&self, input: &str) -> PathBuf {
        return clean_path(&self.root.join(input));
    }
}

impl NameNormalizer for Psr4Normalizer {
    fn normalize_to_class(&self, input: &str) -> Result<FullyQualifiedName, Error> {
        let input = input.trim();
        if is_path_like(input) {
            return self.class_for_path(input);
        }
        let name = FullyQualifiedName::new(input);
        return validate_class_name(name.as_str(), input);
    }

    fn normalize_to_file(&self, input: &str) -> Result<PathBuf, Error> {
        let input = input.trim();
        if is_path_like(input) {
            return Ok(self.resolve(input));
        }
        let class = validate_class_name(FullyQualifiedName::new(input).as_str(), input)?;

        let best = self
            .mappings
            .iter()
            .filter(|m| return class.as_str().starts_with(m.prefix.as_str()))
            .max_by_key(|m| return m.prefix.len())
            .ok_or_else(|| return Error::UnmappedClass { class: class.to_string() })?;

        let rest = class.as_str().get(best.prefix.len()..).unwrap_or_default();
        let mut path = self.root.join(&best.dir);
        path.extend(rest.split(NAMESPACE_SEPARATOR));
        path.set_extension("php");
        return Ok(path);
    }
}

/// Fold `.` and `..` components without touching the filesystem, so
/// `./src/` and `src` compare equal. A leading `..` with nothing to pop stays.
fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir if matches!(components.last(), Some(Component::Normal(_))) => {
                components.pop();
            },
            other => components.push(other),
        }
    }
    return components.iter().collect();
}

/// A path is anything naming a `.php` file or containing a `/`.
fn is_path_like(input: &str) -> bool {
    let is_php_file = Path::new(input)
        .extension()
        .is_some_and(|ext| return ext.eq_ignore_ascii_case("php"));
    return is_php_file || input.contains('/');
}

/// Ensure a non-empty prefix ends with exactly one separator and has none leading.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches(NAMESPACE_SEPARATOR);
    if trimmed.is_empty() {
        return String::new();
    }
    return format!("{trimmed}{NAMESPACE_SEPARATOR}");
}

/// Accept `class` only if it is a syntactically valid PHP class name.
///
/// # Errors
///
/// Returns `Error::InvalidName` (naming the original `input`) otherwise.
fn validate_class_name(class: &str, input: &str) -> Result<FullyQualifiedName, Error> {
    if CLASS_NAME.is_match(class) {
        return Ok(FullyQualifiedName::new(class));
    }
    return Err(Error::InvalidName { input: input.to_string() });
}
