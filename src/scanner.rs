//! Find, rename, and copy operations over the files of a named root.
use std::path::Path;

use crate::error::Error;
use crate::filesystem::{Filesystem, FilesystemRegistry};
use crate::finder::ReferenceFinder;
use crate::location::locate;
use crate::normalizer::NameNormalizer;
use crate::replacer::ReferenceReplacer;
use crate::types::{
    CopyResult,
    FileResult,
    FullyQualifiedName,
    LocatedReference,
    OperationResult,
    Reference,
    ReferenceSet,
    SourceText,
};

/// Finds, and optionally renames, every reference to a class across a named root.
///
/// Collaborators are injected at construction; the registry is owned by the
/// caller and borrowed for the scanner's lifetime.
pub struct ClassReferences<'a> {
    /// Produces the references in one source text.
    finder: Box<dyn ReferenceFinder>,
    /// Turns user input into class names and file paths.
    normalizer: Box<dyn NameNormalizer>,
    /// Named roots to scan.
    registry: &'a FilesystemRegistry,
    /// Rewrites matched spans.
    replacer: Box<dyn ReferenceReplacer>,
}

impl<'a> ClassReferences<'a> {
    /// Copy the class file at `source` to `destination`, renaming the class
    /// to the name the destination maps to. Only the copy is rewritten: its
    /// declaration and its references to its own class. Other files keep
    /// pointing at the original.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownRoot`, name normalization errors,
    /// `Error::DestinationExists` if the copy would overwrite a file, and any
    /// read, parse, replace, or write error.
    pub fn copy(
        &self,
        root_name: &str,
        source: &str,
        destination: &str,
        preview: bool,
    ) -> Result<CopyResult, Error> {
        let filesystem = self.registry.get(root_name)?;
        let class = self.normalizer.normalize_to_class(source)?;
        let new_class = self.normalizer.normalize_to_class(destination)?;
        let source_path = self.normalizer.normalize_to_file(source)?;
        let destination_path = self.normalizer.normalize_to_file(destination)?;

        if filesystem.exists(&destination_path) {
            return Err(Error::DestinationExists { path: destination_path });
        }

        let text = filesystem.read(&source_path)?;
        let matched = self.finder.find_in(&source_path, &text)?.filter_for_name(&class);
        let renamed = self.replacer.replace(&source_path, &text, &matched, &class, &new_class)?;
        let rewritten = self.redeclare(&destination_path, &renamed, &new_class)?;

        if preview {
            tracing::info!(from = %source_path.display(), to = %destination_path.display(), "would copy");
        } else {
            filesystem.write(&destination_path, &rewritten)?;
            tracing::info!(from = %source_path.display(), to = %destination_path.display(), "copied");
        }

        let replacements = self.finder.find_in(&destination_path, &rewritten)?.filter_for_name(&new_class);
        return Ok(CopyResult {
            class,
            destination: destination_path,
            new_class,
            references: locate_references(&text, &matched),
            replacements: locate_references(&rewritten, &replacements),
            source: source_path,
        });
    }

    /// Process one file. Returns `None` when the file does not reference the target.
    ///
    /// # Errors
    ///
    /// Propagates filesystem, finder, and replacer errors unchanged.
    fn file_references(
        &self,
        filesystem: &dyn Filesystem,
        path: &Path,
        target: &FullyQualifiedName,
        replacement: Option<&FullyQualifiedName>,
        preview: bool,
    ) -> Result<Option<FileResult>, Error> {
        let source = filesystem.read(path)?;
        let matched = self.finder.find_in(path, &source)?.filter_for_name(target);
        tracing::debug!(file = %path.display(), references = matched.len(), "scanned");

        if matched.is_empty() {
            return Ok(None);
        }

        let references = locate_references(&source, &matched);
        let Some(replacement) = replacement else {
            return Ok(Some(FileResult {
                file: path.to_path_buf(),
                references,
                replacements: Vec::new(),
            }));
        };

        let rewritten = self.replacer.replace(path, &source, &matched, target, replacement)?;
        if preview {
            tracing::info!(file = %path.display(), references = matched.len(), "would rewrite");
        } else {
            filesystem.write(path, &rewritten)?;
            tracing::info!(file = %path.display(), references = matched.len(), "rewrote");
        }

        let renamed = self.finder.find_in(path, &rewritten)?.filter_for_name(replacement);
        return Ok(Some(FileResult {
            file: path.to_path_buf(),
            references,
            replacements: locate_references(&rewritten, &renamed),
        }));
    }

    /// Report every reference to `class` in the named root.
    ///
    /// # Errors
    ///
    /// See [`ClassReferences::scan`].
    pub fn find(&self, root_name: &str, class: &str) -> Result<OperationResult, Error> {
        return self.scan(root_name, class, None, false);
    }

    /// Wire a scanner from its collaborators.
    pub fn new(
        normalizer: Box<dyn NameNormalizer>,
        finder: Box<dyn ReferenceFinder>,
        replacer: Box<dyn ReferenceReplacer>,
        registry: &'a FilesystemRegistry,
    ) -> Self {
        return Self {
            finder,
            normalizer,
            registry,
            replacer,
        };
    }

    /// Point a copied text's class declaration at `new_class`. The class name
    /// is spliced before the namespace, which precedes it in the file.
    ///
    /// # Errors
    ///
    /// Propagates finder and replacer errors.
    fn redeclare(
        &self,
        file: &Path,
        text: &SourceText,
        new_class: &FullyQualifiedName,
    ) -> Result<SourceText, Error> {
        let Some(declaration) = self.finder.find_declaration(file, text)? else {
            tracing::warn!(file = %file.display(), "no class declaration, copying references only");
            return Ok(text.clone());
        };

        let short_name = FullyQualifiedName::new(new_class.short_name());
        let mut rewritten = self.splice(file, text, &declaration.name, &short_name)?;

        match (declaration.namespace, new_class.namespace()) {
            (Some(namespace), Some(new_namespace)) => {
                rewritten = self.splice(file, &rewritten, &namespace, &FullyQualifiedName::new(new_namespace))?;
            },
            (None, None) => {},
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(file = %file.display(), "namespace declaration left unchanged");
            },
        }
        return Ok(rewritten);
    }

    /// Rename every reference to `class` as `new_class`. With `preview` set,
    /// the rewritten text is computed and reported but nothing is written.
    ///
    /// # Errors
    ///
    /// See [`ClassReferences::scan`].
    pub fn rename(
        &self,
        root_name: &str,
        class: &str,
        new_class: &str,
        preview: bool,
    ) -> Result<OperationResult, Error> {
        return self.scan(root_name, class, Some(new_class), preview);
    }

    /// Scan every candidate file in the root for references to `class`.
    /// Files are processed one at a time in listing order; the first failure
    /// aborts the scan, leaving files already rewritten as they are.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownRoot` if the root is not registered, name
    /// normalization errors, and any read, parse, replace, or write error.
    pub fn scan(
        &self,
        root_name: &str,
        class: &str,
        replacement: Option<&str>,
        preview: bool,
    ) -> Result<OperationResult, Error> {
        let filesystem = self.registry.get(root_name)?;
        let target = self.normalizer.normalize_to_class(class)?;
        let replacement = replacement
            .map(|r| return self.normalizer.normalize_to_class(r))
            .transpose()?;

        match self.normalizer.normalize_to_file(class) {
            Ok(path) => tracing::debug!(class = %target, path = %path.display(), "class file"),
            Err(e) => tracing::debug!(class = %target, "no class file: {e}"),
        }

        let files = filesystem.file_list()?;
        tracing::info!(root = root_name, dir = %filesystem.root().display(), class = %target, files = files.len(), "scanning");

        let mut results = Vec::new();
        for path in &files {
            if let Some(result) = self.file_references(filesystem, path, &target, replacement.as_ref(), preview)? {
                results.push(result);
            }
        }

        return Ok(OperationResult { results });
    }

    /// Replace the single span `at` with `new_name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReplaceFailed` if the span no longer holds its name.
    fn splice(
        &self,
        file: &Path,
        text: &SourceText,
        at: &Reference,
        new_name: &FullyQualifiedName,
    ) -> Result<SourceText, Error> {
        let span = ReferenceSet::new(vec![at.clone()]);
        return self.replacer.replace(file, text, &span, &at.name, new_name);
    }
}

/// Attach line/column locations to each reference, keeping finder order.
fn locate_references(source: &SourceText, references: &ReferenceSet) -> Vec<LocatedReference> {
    return references
        .iter()
        .map(|reference| {
            let location = locate(source.as_bytes(), reference.start);
            return LocatedReference {
                col_no: location.column_number,
                end: reference.end,
                line: location.line_text,
                line_no: location.line_number,
                reference: reference.name.clone(),
                start: reference.start,
            };
        })
        .collect();
}
