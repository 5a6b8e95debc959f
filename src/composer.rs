//! Minimal `composer.json` reader: autoload directories and PSR-4 prefixes.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

/// One `autoload` / `autoload-dev` section.
#[derive(Debug, Default, Deserialize)]
struct Autoload {
    /// Directories or files scanned for classes regardless of namespace.
    #[serde(default)]
    classmap: Vec<String>,
    /// Legacy PSR-0 prefixes.
    #[serde(default, rename = "psr-0")]
    psr0: BTreeMap<String, AutoloadPaths>,
    /// PSR-4 namespace prefix → directories.
    #[serde(default, rename = "psr-4")]
    psr4: BTreeMap<String, AutoloadPaths>,
}

/// Composer allows a single directory or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AutoloadPaths {
    /// `"Prefix\\": ["src/", "lib/"]`
    Many(Vec<String>),
    /// `"Prefix\\": "src/"`
    One(String),
}

impl AutoloadPaths {
    /// Every directory, whichever form was written.
    fn as_slice(&self) -> &[String] {
        return match self {
            Self::Many(paths) => paths,
            Self::One(path) => std::slice::from_ref(path),
        };
    }
}

/// The parts of `composer.json` that describe where classes live.
#[derive(Debug, Default, Deserialize)]
pub struct ComposerManifest {
    /// Production autoload rules.
    #[serde(default)]
    autoload: Autoload,
    /// Development-only autoload rules (tests, fixtures).
    #[serde(default, rename = "autoload-dev")]
    autoload_dev: Autoload,
}

impl ComposerManifest {
    /// Read `composer.json` from `root`. Returns `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::ComposerInvalid` if the JSON does not parse.
    pub fn load(root: &Path) -> Result<Option<Self>, Error> {
        let path = root.join("composer.json");
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        let manifest = serde_json::from_str(&content).map_err(|e| {
            return Error::ComposerInvalid {
                path,
                reason: e.to_string(),
            };
        })?;
        return Ok(Some(manifest));
    }

    /// PSR-4 `(namespace prefix, directory)` pairs from both sections.
    pub fn psr4_mappings(&self) -> Vec<(String, PathBuf)> {
        return [&self.autoload, &self.autoload_dev]
            .into_iter()
            .flat_map(|section| return section.psr4.iter())
            .flat_map(|(prefix, paths)| {
                return paths
                    .as_slice()
                    .iter()
                    .map(move |dir| return (prefix.clone(), PathBuf::from(dir)));
            })
            .collect();
    }

    /// Every directory or file composer autoloads from, relative to the project.
    pub fn source_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for section in [&self.autoload, &self.autoload_dev] {
            let namespaced = section.psr4.values().chain(section.psr0.values());
            paths.extend(namespaced.flat_map(|p| return p.as_slice().iter().map(PathBuf::from)));
            paths.extend(section.classmap.iter().map(PathBuf::from));
        }
        paths.sort();
        paths.dedup();
        return paths;
    }
}
