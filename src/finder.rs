//! Class reference discovery in PHP sources via tree-sitter.
use std::path::Path;

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::Error;
use crate::types::{ClassDeclaration, FullyQualifiedName, Reference, ReferenceSet, SourceText};

/// Parent kinds in which a name denotes a class.
const CLASS_POSITION_PARENTS: &[&str] = &[
    "attribute",
    "base_clause",
    "class_interface_clause",
    "named_type",
    "object_creation_expression",
    "use_declaration",
];

/// Node kinds that declare a class-like type.
const DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "enum_declaration",
    "interface_declaration",
    "trait_declaration",
];

/// Maximum source file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Parent kinds in which the first named child is a class scope (`X::...`).
const SCOPED_ACCESS_PARENTS: &[&str] = &[
    "class_constant_access_expression",
    "scoped_call_expression",
    "scoped_property_access_expression",
];

/// Tree-sitter backed finder for PHP. Tolerates syntax errors: damaged
/// regions become `ERROR` nodes and are walked like everything else.
pub struct PhpClassFinder {
    /// The PHP grammar (with `<?php` tags).
    language: Language,
}

impl PhpClassFinder {
    /// Finder for the `php` grammar, which handles inline HTML and open tags.
    pub fn new() -> Self {
        return Self {
            language: tree_sitter_php::LANGUAGE_PHP.into(),
        };
    }

    /// Check the size limit, then parse source into a tree-sitter tree.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileTooLarge` over the size limit, or
    /// `Error::ParseFailed` if the language cannot be set or parsing fails.
    fn parse_source(&self, file: &Path, source: &SourceText) -> Result<Tree, Error> {
        let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
        if source_len > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge {
                file: file.to_path_buf(),
                max_bytes: MAX_FILE_SIZE,
                size_bytes: source_len,
            });
        }

        let mut parser = Parser::new();
        parser.set_language(&self.language).map_err(|e| {
            return Error::ParseFailed {
                file: file.to_path_buf(),
                reason: e.to_string(),
            };
        })?;

        let tree = parser.parse(source.as_bytes(), None).ok_or_else(|| {
            return Error::ParseFailed {
                file: file.to_path_buf(),
                reason: "tree-sitter returned None".to_string(),
            };
        })?;
        if tree.root_node().has_error() {
            tracing::warn!(file = %file.display(), "syntax errors, references in damaged regions may be missed");
        }
        return Ok(tree);
    }
}

impl Default for PhpClassFinder {
    fn default() -> Self {
        return Self::new();
    }
}

impl ReferenceFinder for PhpClassFinder {
    fn find_declaration(&self, file: &Path, source: &SourceText) -> Result<Option<ClassDeclaration>, Error> {
        if source.is_empty() {
            return Ok(None);
        }

        let tree = self.parse_source(file, source)?;
        let root = tree.root_node();
        let bytes = source.as_bytes();

        let Some(name) = first_node_of_kind(root, DECLARATION_KINDS)
            .and_then(|declaration| return declaration.child_by_field_name("name"))
            .and_then(|node| return reference_from_node(node, bytes))
        else {
            return Ok(None);
        };
        let namespace = first_node_of_kind(root, &["namespace_definition"])
            .and_then(|definition| return definition.child_by_field_name("name"))
            .and_then(|node| return reference_from_node(node, bytes));

        return Ok(Some(ClassDeclaration { name, namespace }));
    }

    fn find_in(&self, file: &Path, source: &SourceText) -> Result<ReferenceSet, Error> {
        if source.is_empty() {
            return Ok(ReferenceSet::default());
        }

        let tree = self.parse_source(file, source)?;
        let mut references = Vec::new();
        collect_class_references(tree.root_node(), source.as_bytes(), &mut references);
        return Ok(ReferenceSet::new(references));
    }
}

/// Produces every class reference in a source text.
pub trait ReferenceFinder {
    /// Locate the class a file declares, if any.
    ///
    /// # Errors
    ///
    /// Same as [`ReferenceFinder::find_in`].
    fn find_declaration(&self, file: &Path, source: &SourceText) -> Result<Option<ClassDeclaration>, Error>;

    /// Find all class references of any name in `source`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseFailed` if the source cannot be processed,
    /// or `Error::FileTooLarge` if it exceeds the size limit.
    fn find_in(&self, file: &Path, source: &SourceText) -> Result<ReferenceSet, Error>;
}

/// Walk the tree in document order collecting class references.
/// Qualified names are leaves: their inner `name` nodes are namespace
/// segments, never references on their own.
fn collect_class_references(node: Node<'_>, source: &[u8], references: &mut Vec<Reference>) {
    if matches!(node.kind(), "name" | "qualified_name") {
        if is_class_position(node) {
            references.extend(reference_from_node(node, source));
        }
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_class_references(child, source, references);
    }
}

/// Depth-first search for the first node whose kind is in `kinds`.
fn first_node_of_kind<'tree>(node: Node<'tree>, kinds: &[&str]) -> Option<Node<'tree>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }
    let mut cursor = node.walk();
    return node
        .children(&mut cursor)
        .find_map(|child| return first_node_of_kind(child, kinds));
}

/// Whether a name node sits where PHP expects a class.
fn is_class_position(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    let kind = parent.kind();

    if kind == "namespace_use_clause" {
        // The second name of `use Foo as Alias;` is a new local name.
        return parent.named_child(0) == Some(node) && !is_excluded_import(parent);
    }
    if CLASS_POSITION_PARENTS.contains(&kind) {
        return true;
    }
    if SCOPED_ACCESS_PARENTS.contains(&kind) {
        return parent.named_child(0) == Some(node);
    }
    if kind == "binary_expression" {
        let is_instanceof = parent
            .child_by_field_name("operator")
            .is_some_and(|op| return op.kind() == "instanceof");
        return is_instanceof && parent.child_by_field_name("right") == Some(node);
    }
    return false;
}

/// `use function`/`use const` imports name no class. Members of a group
/// import (`use Foo\{Bar, Baz};`) are written relative to the group prefix,
/// so their span never holds the full name and they are skipped.
fn is_excluded_import(clause: Node<'_>) -> bool {
    let mut current = Some(clause);
    while let Some(node) = current {
        if node.kind().starts_with("namespace_use_group") {
            return true;
        }
        let mut cursor = node.walk();
        if node
            .children(&mut cursor)
            .any(|child| return matches!(child.kind(), "function" | "const"))
        {
            return true;
        }
        if node.kind() == "namespace_use_declaration" {
            return false;
        }
        current = node.parent();
    }
    return false;
}

/// Build a reference from a name node. A leading `\` is excluded from the
/// span so replacing the span keeps the file's fully-qualified spelling.
fn reference_from_node(node: Node<'_>, source: &[u8]) -> Option<Reference> {
    let text = source.get(node.start_byte()..node.end_byte())?;
    let separator_width = usize::from(text.starts_with(b"\\"));
    let name = text.get(separator_width..)?;
    if name.is_empty() {
        return None;
    }

    return Some(Reference {
        end: node.end_byte(),
        name: FullyQualifiedName::new(&String::from_utf8_lossy(name)),
        start: node.start_byte().saturating_add(separator_width),
    });
}
