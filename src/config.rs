//! `.classref.toml` loading and construction of roots and the normalizer.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::composer::ComposerManifest;
use crate::error::Error;
use crate::filesystem::{ComposerFilesystem, FileFilter, Filesystem, FilesystemRegistry, GitFilesystem, SimpleFilesystem};
use crate::normalizer::Psr4Normalizer;

/// Name of the project config file.
pub const CONFIG_FILE: &str = ".classref.toml";

/// Raw TOML structure for `.classref.toml`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassrefTomlConfig {
    /// `[autoload]` prefix → directory table.
    #[serde(default)]
    autoload: BTreeMap<String, String>,
    /// `default_root = "..."`.
    default_root: Option<String>,
    /// `extensions = [...]`; empty means PHP only.
    #[serde(default)]
    extensions: Vec<String>,
    /// `[roots.<name>]` tables.
    #[serde(default)]
    roots: BTreeMap<String, RootEntry>,
}

/// Project configuration loaded from `.classref.toml`.
pub struct Config {
    /// PSR-4 prefix → directory, for the name normalizer.
    pub autoload: BTreeMap<String, String>,
    /// Directory containing the config file; root paths are relative to it.
    pub base: PathBuf,
    /// Root used when none is named on the command line.
    pub default_root: String,
    /// Candidate file extensions.
    pub extensions: Vec<String>,
    /// Built-in roots merged with configured ones.
    pub roots: BTreeMap<String, RootEntry>,
}

impl Config {
    /// Build the name normalizer from `[autoload]`, falling back to the
    /// PSR-4 section of `composer.json`. The normalizer is rooted at the
    /// absolute form of the base, so absolute input paths map too.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the base cannot be made absolute, or
    /// `Error::ComposerInvalid` if `composer.json` is malformed.
    pub fn build_normalizer(&self) -> Result<Psr4Normalizer, Error> {
        let mappings = if self.autoload.is_empty() {
            ComposerManifest::load(&self.base)?
                .map(|m| return m.psr4_mappings())
                .unwrap_or_default()
        } else {
            self.autoload
                .iter()
                .map(|(prefix, dir)| return (prefix.clone(), PathBuf::from(dir)))
                .collect()
        };
        let root = std::path::absolute(&self.base)?;
        return Ok(Psr4Normalizer::new(root, mappings));
    }

    /// Build the named-root registry. Each root is constructed here, once.
    pub fn build_registry(&self) -> FilesystemRegistry {
        let filter = FileFilter::new(self.extensions.clone());
        let mut registry = FilesystemRegistry::new();

        for (name, entry) in &self.roots {
            let dir = self.base.join(&entry.path);
            let filesystem: Box<dyn Filesystem> = match entry.kind {
                RootKind::Composer => Box::new(ComposerFilesystem::new(dir, filter.clone())),
                RootKind::Git => Box::new(GitFilesystem::new(dir, filter.clone())),
                RootKind::Simple => Box::new(SimpleFilesystem::new(dir, filter.clone())),
            };
            registry.register(name, filesystem);
        }

        return registry;
    }

    /// Merge the raw file over the built-in roots and defaults.
    fn from_raw(base: &Path, raw: ClassrefTomlConfig) -> Self {
        let mut roots: BTreeMap<String, RootEntry> = [RootKind::Simple, RootKind::Git, RootKind::Composer]
            .into_iter()
            .map(|kind| return (kind.as_str().to_string(), RootEntry { kind, path: default_root_path() }))
            .collect();
        roots.extend(raw.roots);

        let extensions = if raw.extensions.is_empty() {
            vec!["php".to_string()]
        } else {
            raw.extensions
        };

        return Self {
            autoload: raw.autoload,
            base: base.to_path_buf(),
            default_root: raw.default_root.unwrap_or_else(|| return RootKind::Simple.as_str().to_string()),
            extensions,
            roots,
        };
    }

    /// Load config from `.classref.toml` in the given directory.
    /// Returns defaults if the file doesn't exist. Returns an error if the
    /// file exists but is malformed; a config the user wrote is never
    /// silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(base: &Path) -> Result<Self, Error> {
        let path = base.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: ClassrefTomlConfig = toml::from_str(&content)?;
        return Ok(Self::from_raw(base, raw));
    }
}

/// One named root from `[roots.<name>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct RootEntry {
    /// How the root lists its files.
    pub kind: RootKind,
    /// Directory relative to the config file.
    #[serde(default = "default_root_path")]
    pub path: String,
}

/// How a named root enumerates its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    /// `composer.json` autoload paths.
    Composer,
    /// Files tracked by git.
    Git,
    /// Every matching file under the directory.
    Simple,
}

impl RootKind {
    /// The name used in `.classref.toml` and as the built-in root's name.
    pub const fn as_str(self) -> &'static str {
        return match self {
            Self::Composer => "composer",
            Self::Git => "git",
            Self::Simple => "simple",
        };
    }
}

/// Roots without a `path` cover the config file's directory.
fn default_root_path() -> String {
    return ".".to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::NameNormalizer;

    #[test]
    fn missing_file_gives_builtin_roots() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.default_root, "simple");
        assert_eq!(config.extensions, vec!["php"]);
        let names: Vec<&str> = config.roots.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["composer", "git", "simple"]);
        assert_eq!(config.build_registry().names(), vec!["composer", "git", "simple"]);
    }

    #[test]
    fn configured_roots_extend_and_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
default_root = "app"
extensions = ["php", "inc"]

[roots.app]
kind = "simple"
path = "src"

[roots.git]
kind = "simple"
"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.default_root, "app");
        assert_eq!(config.extensions, vec!["php", "inc"]);
        assert_eq!(config.roots["app"].path, "src");
        assert_eq!(config.roots["git"].kind, RootKind::Simple);
        assert_eq!(config.roots.len(), 4);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[roots.app]\nkind = \"svn\"\n").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn autoload_falls_back_to_composer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("composer.json"),
            r#"{ "autoload": { "psr-4": { "Shop\\": "app/" } } }"#,
        )
        .unwrap();

        let normalizer = Config::load(dir.path()).unwrap().build_normalizer().unwrap();
        let class = normalizer.normalize_to_class("app/Cart/Item.php").unwrap();
        assert_eq!(class.as_str(), "Shop\\Cart\\Item");
    }

    #[test]
    fn normalizer_maps_absolute_paths_below_the_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[autoload]\n\"Shop\\\\\" = \"src/\"\n").unwrap();

        let config = Config::load(dir.path()).unwrap();
        let normalizer = config.build_normalizer().unwrap();
        let absolute = std::path::absolute(dir.path()).unwrap().join("src/Cart/Item.php");
        let class = normalizer.normalize_to_class(absolute.to_str().unwrap()).unwrap();
        assert_eq!(class.as_str(), "Shop\\Cart\\Item");
    }

    #[test]
    fn configured_autoload_wins_over_composer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("composer.json"),
            r#"{ "autoload": { "psr-4": { "Shop\\": "app/" } } }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[autoload]\n\"Other\\\\\" = \"app/\"\n").unwrap();

        let normalizer = Config::load(dir.path()).unwrap().build_normalizer().unwrap();
        let class = normalizer.normalize_to_class("app/Item.php").unwrap();
        assert_eq!(class.as_str(), "Other\\Item");
    }
}
