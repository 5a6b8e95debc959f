//! Core domain types for class references, locations, and scan results.
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Namespace separator in fully-qualified class names.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// Where a file declares its class: the namespace name and the class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    /// Span of the short class name after `class`/`interface`/`trait`/`enum`.
    pub name: Reference,
    /// Span of the name after `namespace`, if the file declares one.
    pub namespace: Option<Reference>,
}

/// Outcome of copying a class file to a new path under a new name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyResult {
    /// Class declared by the source file.
    pub class: FullyQualifiedName,
    /// File the copy was (or would be) written to.
    pub destination: PathBuf,
    /// Class declared by the copy.
    pub new_class: FullyQualifiedName,
    /// Self-references in the source file, located in the source text.
    pub references: Vec<LocatedReference>,
    /// The same references after renaming, located in the copied text.
    pub replacements: Vec<LocatedReference>,
    /// File the class was copied from.
    pub source: PathBuf,
}

/// Per-file outcome of a find or rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileResult {
    /// Path of the file as listed by the filesystem.
    pub file: PathBuf,
    /// Matches of the target name, located in the text as it was read.
    pub references: Vec<LocatedReference>,
    /// Matches of the replacement name, located in the rewritten text.
    /// Empty unless a rename was requested.
    pub replacements: Vec<LocatedReference>,
}

/// A namespace-qualified class name such as `Acme\Billing\Invoice`.
/// One leading separator is dropped on construction, so `\Foo\Bar` and
/// `Foo\Bar` compare equal. Everything else is exact string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FullyQualifiedName(
    /// The name without a leading separator.
    String,
);

impl FullyQualifiedName {
    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    /// Everything before the last separator, or `None` for a global class.
    pub fn namespace(&self) -> Option<&str> {
        return self.0.rsplit_once(NAMESPACE_SEPARATOR).map(|(namespace, _)| return namespace);
    }

    /// Build a name from its written form.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.strip_prefix(NAMESPACE_SEPARATOR).unwrap_or(raw);
        return Self(trimmed.to_string());
    }

    /// The last segment, as written after `class`.
    pub fn short_name(&self) -> &str {
        return self.0.rsplit_once(NAMESPACE_SEPARATOR).map_or(self.0.as_str(), |(_, short)| return short);
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// A reference together with its location, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedReference {
    /// Zero-based byte column.
    pub col_no: usize,
    /// End byte offset.
    pub end: usize,
    /// Text of the line containing the reference.
    pub line: String,
    /// One-based line number.
    pub line_no: usize,
    /// The referenced class name.
    pub reference: FullyQualifiedName,
    /// Start byte offset.
    pub start: usize,
}

/// Human-readable position of a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Zero-based byte column within the line.
    pub column_number: usize,
    /// One-based line number.
    pub line_number: usize,
    /// Full text of the line, without the trailing `\n`.
    pub line_text: String,
}

/// Aggregate result. Never contains a `FileResult` with zero references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    /// One entry per file that referenced the target, in listing order.
    pub results: Vec<FileResult>,
}

impl OperationResult {
    /// Total number of references across all files.
    pub fn reference_count(&self) -> usize {
        return self.results.iter().map(|r| return r.references.len()).sum();
    }
}

/// One occurrence of a class name in a source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Byte offset one past the last byte of the name.
    pub end: usize,
    /// The referenced class as written (leading separator excluded).
    pub name: FullyQualifiedName,
    /// Byte offset of the first byte of the name.
    pub start: usize,
}

/// All references found by one scan of one file, in finder order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    /// References in document order.
    references: Vec<Reference>,
}

impl ReferenceSet {
    /// Keep only references whose name equals `name` exactly.
    pub fn filter_for_name(&self, name: &FullyQualifiedName) -> Self {
        let references = self
            .references
            .iter()
            .filter(|r| return &r.name == name)
            .cloned()
            .collect();
        return Self { references };
    }

    /// True when no references were found.
    pub fn is_empty(&self) -> bool {
        return self.references.is_empty();
    }

    /// Iterate in finder order.
    pub fn iter(&self) -> std::slice::Iter<'_, Reference> {
        return self.references.iter();
    }

    /// Number of references.
    pub fn len(&self) -> usize {
        return self.references.len();
    }

    /// Wrap an ordered list of references.
    pub fn new(references: Vec<Reference>) -> Self {
        return Self { references };
    }
}

impl<'a> IntoIterator for &'a ReferenceSet {
    type IntoIter = std::slice::Iter<'a, Reference>;
    type Item = &'a Reference;

    fn into_iter(self) -> Self::IntoIter {
        return self.references.iter();
    }
}

/// Snapshot of one file's bytes at read time. Offsets into it are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText(
    /// Raw file contents.
    Vec<u8>,
);

impl SourceText {
    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        return &self.0;
    }

    /// True when the file is empty.
    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        return self.0.len();
    }

    /// Wrap raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        return Self(bytes);
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        return Self(text.as_bytes().to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_separator_is_ignored() {
        assert_eq!(FullyQualifiedName::new("\\Foo\\Bar"), FullyQualifiedName::new("Foo\\Bar"));
    }

    #[test]
    fn namespace_and_short_name_split_at_last_separator() {
        let name = FullyQualifiedName::new("Shop\\Cart\\Item");
        assert_eq!(name.namespace(), Some("Shop\\Cart"));
        assert_eq!(name.short_name(), "Item");

        let global = FullyQualifiedName::new("\\Item");
        assert_eq!(global.namespace(), None);
        assert_eq!(global.short_name(), "Item");
    }

    #[test]
    fn filter_keeps_exact_matches_in_order() {
        let set = ReferenceSet::new(vec![
            Reference { end: 37, name: FullyQualifiedName::new("Foo\\Bar"), start: 30 },
            Reference { end: 3, name: FullyQualifiedName::new("Bar"), start: 0 },
            Reference { end: 17, name: FullyQualifiedName::new("Foo\\Bar"), start: 10 },
        ]);

        let filtered = set.filter_for_name(&FullyQualifiedName::new("Foo\\Bar"));
        let starts: Vec<usize> = filtered.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![30, 10]);
        assert!(set.filter_for_name(&FullyQualifiedName::new("Foo")).is_empty());
    }
}
