//! The line-oriented import manifest (`importcfg`) handed to the host
//! compiler and linker.
//!
//! Only `packagefile <path>=<file>` lines are interpreted; every other line
//! is carried through untouched and in order.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::EngineError;
use crate::host::PackageLookup;
use crate::transform::dimension_package_path;

const PACKAGE_FILE: &str = "packagefile ";

/// Original packages referenced per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionRefs(BTreeMap<String, BTreeSet<String>>);

impl DimensionRefs {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `package` is needed in `dimension`.
    pub fn add(&mut self, dimension: &str, package: &str) {
        self.0
            .entry(dimension.to_string())
            .or_default()
            .insert(package.to_string());
    }

    /// Returns `true` if nothing is referenced.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(dimension, package)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(dim, pkgs)| pkgs.iter().map(move |p| (dim.as_str(), p.as_str())))
    }
}

/// An in-memory import manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportManifest {
    lines: Vec<String>,
}

impl ImportManifest {
    /// Reads a manifest file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|e| EngineError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::parse(&text))
    }

    /// Parses manifest text, ignoring surrounding blank space.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let lines = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.lines().map(str::to_string).collect()
        };
        Self { lines }
    }

    /// All lines in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(package, file)` pairs of the `packagefile` lines, in order.
    pub fn packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| package_entry(line))
    }

    /// The file recorded for `package`.
    pub fn file_of(&self, package: &str) -> Option<&str> {
        self.packages().find(|(p, _)| *p == package).map(|(_, f)| f)
    }

    /// Whether `package` has an entry.
    pub fn contains(&self, package: &str) -> bool {
        self.file_of(package).is_some()
    }

    /// Adds an entry unless `package` already has one. Returns whether it
    /// was added.
    pub fn add_if_absent(&mut self, package: &str, file: &Path) -> bool {
        if self.contains(package) {
            return false;
        }
        self.lines
            .push(format!("{PACKAGE_FILE}{package}={}", file.display()));
        true
    }

    /// Removes every entry for `package`. Returns whether any existed.
    pub fn remove(&mut self, package: &str) -> bool {
        let before = self.lines.len();
        self.lines
            .retain(|line| package_entry(line).map_or(true, |(p, _)| p != package));
        self.lines.len() != before
    }

    /// Points `package` at `file`, dropping any previous entry.
    pub fn replace(&mut self, package: &str, file: &Path) {
        self.remove(package);
        self.add_if_absent(package, file);
    }

    /// Adds `package` with its export file from `lookup`, unless present.
    pub fn include_package(
        &mut self,
        package: &str,
        lookup: &dyn PackageLookup,
    ) -> Result<bool, EngineError> {
        if self.contains(package) {
            return Ok(false);
        }
        let file = lookup.export_file(package)?;
        Ok(self.add_if_absent(package, &file))
    }

    /// Adds a dimension-qualified entry for every referenced
    /// `(dimension, package)` pair, its file resolved by `resolve`.
    ///
    /// With `remove_original` the plain entry of each package is dropped,
    /// which is what a dimension compile wants: its imports must resolve to
    /// dimension variants only. The link keeps both.
    pub fn replace_dimension_refs(
        &mut self,
        refs: &DimensionRefs,
        remove_original: bool,
        mut resolve: impl FnMut(&str, &str) -> Result<PathBuf, EngineError>,
    ) -> Result<(), EngineError> {
        for (dimension, package) in refs.iter() {
            let file = resolve(package, dimension)?;
            if remove_original {
                self.remove(package);
            }
            self.add_if_absent(&dimension_package_path(package, dimension), &file);
        }
        Ok(())
    }

    /// The manifest text, newline terminated.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Writes the manifest to `path`.
    pub fn write(&self, path: &Path) -> Result<(), EngineError> {
        let content = self.render();
        debug!(path = %path.display(), %content, "writing import manifest");
        fs::write(path, content).map_err(|e| EngineError::Manifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes the manifest to a new file in `dir` and returns its path.
    pub fn write_temp(&self, dir: &Path) -> Result<PathBuf, EngineError> {
        let content = self.render();
        let mut file = tempfile::Builder::new()
            .prefix("importcfg-")
            .tempfile_in(dir)
            .map_err(|e| EngineError::io(dir, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| EngineError::io(file.path(), e))?;
        let (_, path) = file.keep().map_err(|e| EngineError::io(dir, e.error))?;
        debug!(path = %path.display(), %content, "writing import manifest");
        Ok(path)
    }
}

fn package_entry(line: &str) -> Option<(&str, &str)> {
    line.strip_prefix(PACKAGE_FILE)?.split_once('=')
}
