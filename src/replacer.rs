//! In-place substitution of matched class references.
use std::path::Path;

use crate::error::Error;
use crate::types::{FullyQualifiedName, Reference, ReferenceSet, SourceText};

/// Rewrites a source text so the given references point at a new name.
pub trait ReferenceReplacer {
    /// Substitute `new_name` for `old_name` at each reference in `references`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReplaceFailed` if a reference does not hold `old_name`.
    fn replace(
        &self,
        file: &Path,
        source: &SourceText,
        references: &ReferenceSet,
        old_name: &FullyQualifiedName,
        new_name: &FullyQualifiedName,
    ) -> Result<SourceText, Error>;
}

/// Pure token substitution: only the bytes inside matched spans change.
#[derive(Debug, Default)]
pub struct TokenReplacer;

impl ReferenceReplacer for TokenReplacer {
    fn replace(
        &self,
        file: &Path,
        source: &SourceText,
        references: &ReferenceSet,
        old_name: &FullyQualifiedName,
        new_name: &FullyQualifiedName,
    ) -> Result<SourceText, Error> {
        let mut spans: Vec<&Reference> = references.iter().collect();
        // Back to front, so splicing never shifts a span still to be replaced.
        spans.sort_by(|a, b| return b.start.cmp(&a.start));
        spans.dedup_by_key(|r| return r.start);

        let mut bytes = source.as_bytes().to_vec();
        for reference in spans {
            let current = bytes.get(reference.start..reference.end);
            if current != Some(old_name.as_str().as_bytes()) {
                return Err(Error::ReplaceFailed {
                    end: reference.end,
                    expected: old_name.to_string(),
                    file: file.to_path_buf(),
                    start: reference.start,
                });
            }
            bytes.splice(reference.start..reference.end, new_name.as_str().bytes());
        }

        return Ok(SourceText::new(bytes));
    }
}
