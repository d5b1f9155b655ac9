//! Collection (`.pvd`) manifests over many piece files
//!
//! A [`CollectionWriter`] wraps a [`VtkWriter`] and records every piece it
//! writes. The manifest is written when the collection is finished, and from
//! `Drop` on any other way out of scope, including early returns and panics.
//! A manifest path can be written only once per process; trying to open it
//! again is a usage error.

use crate::model::Model;
use crate::traits::Encode;
use crate::write_vtk::{self, DataSetLine};
use crate::writer::{VtkWriter, WriteOutput};
use crate::{Error, UsageError};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManifestState {
    Open,
    Closed,
}

/// every manifest path claimed by a collection writer in this process
static MANIFESTS: Lazy<Mutex<HashMap<PathBuf, ManifestState>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// One piece file recorded in a collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub path: PathBuf,
    pub part: String,
    pub timestep: f64,
    pub piece: usize,
}

/// Scoped writer of a `.pvd` manifest
///
/// ```no_run
/// use fevtk::{Ascii, CollectionWriter, VtkWriter, WriterOptions};
/// # fn models() -> Vec<fevtk::Model> { Vec::new() }
///
/// let writer = VtkWriter::new(Ascii, WriterOptions::new("vtk_files"));
/// let mut collection = CollectionWriter::new(writer, "vtk_files/results.pvd")?;
///
/// for model in models() {
///     collection.write(&model)?;
/// }
///
/// collection.finish()?;
/// # Ok::<(), fevtk::Error>(())
/// ```
#[derive(Debug)]
pub struct CollectionWriter<E: Encode> {
    writer: VtkWriter<E>,
    manifest: PathBuf,
    entries: Vec<CollectionEntry>,
    pieces_per_part: HashMap<String, usize>,
    closed: bool,
}

impl<E: Encode> CollectionWriter<E> {
    /// Claim `manifest` for a new collection
    ///
    /// Fails with a usage error if another collection writer holds the path or
    /// a manifest was already written to it.
    pub fn new<P: AsRef<Path>>(writer: VtkWriter<E>, manifest: P) -> Result<Self, Error> {
        let manifest = absolute(manifest.as_ref())?;

        let mut registry = MANIFESTS.lock();
        match registry.get(&manifest) {
            Some(ManifestState::Closed) => {
                return Err(UsageError::ManifestClosed(manifest).into());
            }
            Some(ManifestState::Open) => {
                return Err(UsageError::ManifestInUse(manifest).into());
            }
            None => {
                registry.insert(manifest.clone(), ManifestState::Open);
            }
        }

        Ok(Self {
            writer,
            manifest,
            entries: Vec::new(),
            pieces_per_part: HashMap::new(),
            closed: false,
        })
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// entries recorded so far, in call order
    pub fn entries(&self) -> &[CollectionEntry] {
        &self.entries
    }

    pub fn writer(&self) -> &VtkWriter<E> {
        &self.writer
    }

    /// Write `model` through the inner writer and record its pieces
    pub fn write(&mut self, model: &Model) -> Result<WriteOutput, Error> {
        let pieces = self.writer.options().number_of_pieces;
        self.write_pieces(model, pieces)
    }

    /// Write `model` split into `pieces` pieces and record them
    ///
    /// Every part must keep the piece count of its first write.
    pub fn write_pieces(&mut self, model: &Model, pieces: usize) -> Result<WriteOutput, Error> {
        if let Some(&previous) = self.pieces_per_part.get(model.part()) {
            if previous != pieces {
                return Err(UsageError::PieceCountChanged {
                    part: model.part().into(),
                    previous,
                    requested: pieces,
                }
                .into());
            }
        }

        let output = self.writer.write_pieces(model, pieces)?;
        self.pieces_per_part.insert(model.part().into(), pieces);

        for (piece, path) in output.pieces.iter().enumerate() {
            self.entries.push(CollectionEntry {
                path: path.clone(),
                part: output.part.clone(),
                timestep: output.time,
                piece,
            });
        }

        Ok(output)
    }

    /// Write the manifest and release the collection
    pub fn finish(mut self) -> Result<PathBuf, Error> {
        self.close()?;
        Ok(self.manifest.clone())
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        // the path stays closed even when writing the manifest fails
        self.closed = true;
        MANIFESTS
            .lock()
            .insert(self.manifest.clone(), ManifestState::Closed);

        self.write_manifest()
    }

    fn write_manifest(&self) -> Result<(), Error> {
        let base = self.manifest.parent().unwrap_or_else(|| Path::new(""));
        if !base.as_os_str().is_empty() {
            fs::create_dir_all(base)?;
        }

        // `part` numbers every (part name, piece) pair in order of first appearance
        let mut ordinals: HashMap<(&str, usize), usize> = HashMap::new();
        let files: Vec<String> = self
            .entries
            .iter()
            .map(|entry| relative_to(&entry.path, base))
            .collect();

        let lines: Vec<DataSetLine<'_>> = self
            .entries
            .iter()
            .zip(&files)
            .map(|(entry, file)| {
                let next = ordinals.len();
                let part = *ordinals
                    .entry((entry.part.as_str(), entry.piece))
                    .or_insert(next);
                DataSetLine {
                    timestep: entry.timestep,
                    group: &entry.part,
                    part,
                    file,
                }
            })
            .collect();

        let mut out = BufWriter::new(fs::File::create(&self.manifest)?);
        write_vtk::write_collection(&mut out, &lines)?;
        out.flush()?;

        log::info!(
            "wrote collection {} with {} entries",
            self.manifest.display(),
            self.entries.len()
        );

        Ok(())
    }
}

impl<E: Encode> Drop for CollectionWriter<E> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!(
                "failed to write collection {}: {e}",
                self.manifest.display()
            );
        }
    }
}

/// Run `body` with a collection writer, writing the manifest on every exit path
///
/// An error from `body` takes precedence over an error writing the manifest.
pub fn with_collection<E, P, F, T>(writer: VtkWriter<E>, manifest: P, body: F) -> Result<T, Error>
where
    E: Encode,
    P: AsRef<Path>,
    F: FnOnce(&mut CollectionWriter<E>) -> Result<T, Error>,
{
    let mut collection = CollectionWriter::new(writer, manifest)?;
    let result = body(&mut collection);
    let closed = collection.close();
    let value = result?;
    closed?;
    Ok(value)
}

/// `path` made absolute against the working directory
///
/// `.` and `..` are resolved lexically so that aliases of one manifest share
/// a registry key. Symbolic links are not followed.
fn absolute(path: &Path) -> Result<PathBuf, Error> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normal = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => (),
            Component::ParentDir => {
                normal.pop();
            }
            other => normal.push(other.as_os_str()),
        }
    }

    Ok(normal)
}

/// `path` relative to `base` when it lies below it, absolute otherwise
fn relative_to(path: &Path, base: &Path) -> String {
    let path = absolute(path).unwrap_or_else(|_| path.to_path_buf());

    match path.strip_prefix(base) {
        // manifests use forward slashes on every platform
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
