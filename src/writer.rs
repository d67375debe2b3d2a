// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Output of generated files.
//!
//! Files are committed in per-entity batches: a batch holds the Input and
//! Update file of one entity and is written completely or not at all.
//! Every file is attributed to the source unit of its entity, never to a
//! set of units, so invalidating one input invalidates exactly its files.
//!
//! | Writer | Use |
//! |--------|-----|
//! | [`MemoryWriter`] | Tests, hosts that forward files themselves |
//! | [`DirWriter`] | `build.rs`, writes under a directory such as `OUT_DIR` |

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs, io,
    path::{Path, PathBuf}
};

use tracing::debug;

use crate::{
    error::WriteError,
    model::{Origin, QualifiedName}
};

/// A rendered file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Package (module path) of the generated type.
    pub package:   String,
    pub type_name: String,
    /// File name, snake-case type name plus `.rs`.
    pub file_name: String,
    pub contents:  String,
    /// Entity the file was derived from.
    pub source:    QualifiedName,
    /// Source unit of that entity.
    pub origin:    Origin
}

impl GeneratedFile {
    #[must_use]
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.package.clone(), self.type_name.clone())
    }
}

/// Sink for generated files.
pub trait CodeWriter {
    /// Write all files of `batch` or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if any file of the batch cannot be written.
    /// Files of the batch already staged are discarded and files already
    /// replaced are restored.
    fn commit(&mut self, batch: Vec<GeneratedFile>) -> Result<(), WriteError>;
}

/// Collects generated files in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryWriter {
    files: BTreeMap<(String, String), GeneratedFile>
}

impl MemoryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File for a type name in a package.
    #[must_use]
    pub fn get(&self, package: &str, type_name: &str) -> Option<&GeneratedFile> {
        self.files.get(&(package.to_string(), type_name.to_string()))
    }

    /// All files ordered by package, then type name.
    pub fn files(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Generated types grouped by originating source unit.
    #[must_use]
    pub fn origins(&self) -> BTreeMap<Origin, BTreeSet<QualifiedName>> {
        let mut origins: BTreeMap<Origin, BTreeSet<QualifiedName>> = BTreeMap::new();
        for file in self.files.values() {
            origins
                .entry(file.origin.clone())
                .or_default()
                .insert(file.qualified_name());
        }
        origins
    }

    /// Drop every file attributed to `origin`. Returns how many were removed.
    pub fn invalidate(&mut self, origin: &Origin) -> usize {
        let before = self.files.len();
        self.files.retain(|_, file| &file.origin != origin);
        before - self.files.len()
    }
}

impl CodeWriter for MemoryWriter {
    fn commit(&mut self, batch: Vec<GeneratedFile>) -> Result<(), WriteError> {
        for file in &batch {
            let key = (file.package.clone(), file.type_name.clone());
            if let Some(existing) = self.files.get(&key)
                && existing.source != file.source
            {
                return Err(WriteError::Conflict {
                    package:   file.package.clone(),
                    type_name: file.type_name.clone(),
                    owner:     existing.source.to_string()
                });
            }
        }

        for file in batch {
            self.files
                .insert((file.package.clone(), file.type_name.clone()), file);
        }
        Ok(())
    }
}

/// Writes generated files below a root directory.
///
/// A type in package `crate::library::types` is written to
/// `<root>/library/types/<file_name>`. Unchanged files are not rewritten,
/// which keeps modification times stable across identical passes.
///
/// Files are staged next to their targets and renamed into place. A
/// replaced file is kept as `<name>.rs.bak` until the whole batch is in
/// place and moved back if a later rename fails.
#[derive(Debug)]
pub struct DirWriter {
    root:             PathBuf,
    rerun_if_changed: bool,
    owners:           HashMap<PathBuf, QualifiedName>,
    announced:        BTreeSet<Origin>,
    written:          Vec<PathBuf>
}

impl DirWriter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root:             root.into(),
            rerun_if_changed: false,
            owners:           HashMap::new(),
            announced:        BTreeSet::new(),
            written:          Vec::new()
        }
    }

    /// Print `cargo:rerun-if-changed=<origin>` once per originating unit.
    ///
    /// Only meaningful when running inside a build script.
    #[must_use]
    pub fn with_rerun_directives(mut self) -> Self {
        self.rerun_if_changed = true;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths written (not skipped as unchanged) so far.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Target path of a generated file.
    #[must_use]
    pub fn path_for(&self, file: &GeneratedFile) -> PathBuf {
        let mut path = self.root.clone();
        file.package
            .split("::")
            .filter(|segment| !segment.is_empty() && *segment != "crate")
            .for_each(|segment| path.push(segment));
        path.push(&file.file_name);
        path
    }

    fn stage(&self, file: &GeneratedFile, path: &Path) -> Result<Option<PathBuf>, WriteError> {
        let io_error = |source: std::io::Error| WriteError::Io {
            path: path.to_path_buf(),
            source
        };

        if fs::read_to_string(path).is_ok_and(|existing| existing == file.contents) {
            debug!(path = %path.display(), "generated file unchanged");
            return Ok(None);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let staged = path.with_extension("rs.tmp");
        fs::write(&staged, &file.contents).map_err(io_error)?;
        Ok(Some(staged))
    }
}

impl CodeWriter for DirWriter {
    fn commit(&mut self, batch: Vec<GeneratedFile>) -> Result<(), WriteError> {
        let targets: Vec<PathBuf> = batch.iter().map(|file| self.path_for(file)).collect();

        for (file, path) in batch.iter().zip(&targets) {
            if let Some(owner) = self.owners.get(path)
                && owner != &file.source
            {
                return Err(WriteError::Conflict {
                    package:   file.package.clone(),
                    type_name: file.type_name.clone(),
                    owner:     owner.to_string()
                });
            }
        }

        let mut staged = Vec::with_capacity(batch.len());
        for (file, path) in batch.iter().zip(&targets) {
            match self.stage(file, path) {
                Ok(Some(tmp)) => staged.push((tmp, path.clone())),
                Ok(None) => {}
                Err(err) => {
                    discard(&staged);
                    return Err(err);
                }
            }
        }

        let mut installed = Vec::with_capacity(staged.len());
        for (index, (tmp, path)) in staged.iter().enumerate() {
            match install(tmp, path) {
                Ok(backup) => installed.push((path.clone(), backup)),
                Err(source) => {
                    roll_back(&installed);
                    discard(&staged[index..]);
                    return Err(WriteError::Io {
                        path: path.clone(),
                        source
                    });
                }
            }
        }
        for (path, backup) in installed {
            if let Some(backup) = backup {
                let _ = fs::remove_file(backup);
            }
            self.written.push(path);
        }

        for (file, path) in batch.into_iter().zip(targets) {
            if self.rerun_if_changed && self.announced.insert(file.origin.clone()) {
                println!("cargo:rerun-if-changed={}", file.origin);
            }
            self.owners.insert(path, file.source);
        }
        Ok(())
    }
}

/// Move `tmp` over `path`, keeping the previous file aside until the batch
/// is complete.
fn install(tmp: &Path, path: &Path) -> io::Result<Option<PathBuf>> {
    let backup = if path.exists() {
        let backup = path.with_extension("rs.bak");
        fs::rename(path, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(err) = fs::rename(tmp, path) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, path);
        }
        return Err(err);
    }
    Ok(backup)
}

/// Put back what [`install`] replaced, newest first.
fn roll_back(installed: &[(PathBuf, Option<PathBuf>)]) {
    for (path, backup) in installed.iter().rev() {
        let _ = match backup {
            Some(backup) => fs::rename(backup, path),
            None => fs::remove_file(path)
        };
    }
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}
