//! Writers that turn models into piece files on disk
//!
//! Files land in `<output_dir>/<model name>/<encoding>/`:
//!
//! * `<part>_<piece>_<frame>.vtu` for every piece
//! * `<part>_<frame>.pvtu` when a model is split into more than one piece
//!
//! `<frame>` counts the write calls made for a (model, part) pair, so that
//! consecutive increments of the same part never overwrite each other.

use crate::data::PieceData;
use crate::model::{Model, Reduction};
use crate::traits::Encode;
use crate::write_vtk::{self, HeaderType};
use crate::{Error, UsageError};

use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Settings shared by every writer
///
/// ```
/// let options: fevtk::WriterOptions =
///     serde_json::from_str(r#"{ "output_dir": "results", "number_of_pieces": 4 }"#).unwrap();
/// assert_eq!(options.number_of_pieces, 4);
/// assert!(options.strict);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// root of the output tree
    pub output_dir: PathBuf,
    /// remove everything below `output_dir` before the first write
    pub clear_output_dir: bool,
    /// number of pieces every model is split into
    pub number_of_pieces: usize,
    /// abort on element types without a VTK counterpart instead of skipping them
    pub strict: bool,
    /// reduction for fields that do not carry their own
    pub reduction: Reduction,
    /// width of the length prefix of binary blocks
    pub header_type: HeaderType,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("vtk_files"),
            clear_output_dir: false,
            number_of_pieces: 1,
            strict: true,
            reduction: Reduction::MaxAbs,
            header_type: HeaderType::UInt64,
        }
    }
}

impl WriterOptions {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn clear_output_dir(mut self, clear: bool) -> Self {
        self.clear_output_dir = clear;
        self
    }

    pub fn number_of_pieces(mut self, pieces: usize) -> Self {
        self.number_of_pieces = pieces;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn header_type(mut self, header_type: HeaderType) -> Self {
        self.header_type = header_type;
        self
    }
}

/// Files produced by one write call
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutput {
    pub part: String,
    pub time: f64,
    pub frame: u64,
    /// one `.vtu` per piece, in piece order
    pub pieces: Vec<PathBuf>,
    /// the `.pvtu` tying the pieces together, if there is more than one
    pub index: Option<PathBuf>,
}

/// Writes models as VTK unstructured grid files with the encoding `E`
///
/// ```no_run
/// use fevtk::{Binary, ModelBuilder, VtkWriter, WriterOptions};
///
/// let model = ModelBuilder::new("beam")
///     .node(1, [0.0, 0.0, 0.0])
///     .node(2, [1.0, 0.0, 0.0])
///     .element(1, "line2", [1, 2])
///     .build()?;
///
/// let mut writer = VtkWriter::new(Binary, WriterOptions::new("vtk_files"));
/// let output = writer.write(&model)?;
/// assert_eq!(output.pieces.len(), 1);
/// # Ok::<(), fevtk::Error>(())
/// ```
#[derive(Debug)]
pub struct VtkWriter<E> {
    encoding: E,
    options: WriterOptions,
    frames: HashMap<(String, String), u64>,
    cleared: bool,
}

impl<E: Encode> VtkWriter<E> {
    pub fn new(encoding: E, options: WriterOptions) -> Self {
        Self {
            encoding,
            options,
            frames: HashMap::new(),
            cleared: false,
        }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn encoding(&self) -> &E {
        &self.encoding
    }

    /// directory the files of `model` are written to
    pub fn model_dir(&self, model: &Model) -> PathBuf {
        self.options
            .output_dir
            .join(model.name())
            .join(self.encoding.directory())
    }

    /// Write `model` split into `options.number_of_pieces` pieces
    pub fn write(&mut self, model: &Model) -> Result<WriteOutput, Error> {
        self.write_pieces(model, self.options.number_of_pieces)
    }

    /// Write `model` split into `pieces` pieces
    ///
    /// The model is only read. Files are written in place; a failure part way
    /// through leaves the files written so far and surfaces the error.
    pub fn write_pieces(&mut self, model: &Model, pieces: usize) -> Result<WriteOutput, Error> {
        if pieces == 0 {
            return Err(UsageError::ZeroPieces.into());
        }

        if self.options.clear_output_dir && !self.cleared {
            clear_dir(&self.options.output_dir)?;
            self.cleared = true;
        }

        // the frame is only taken once every file of it is on disk
        let key = (model.name().to_string(), model.part().to_string());
        let frame = self.frames.get(&key).copied().unwrap_or(0);

        let dir = self.model_dir(model);
        // safe to race with other writers creating the same tree
        fs::create_dir_all(&dir)?;

        let split;
        let models: Vec<&Model> = if pieces == 1 {
            vec![model]
        } else {
            split = model.split_model(pieces)?;
            split.iter().collect()
        };

        let mut files = Vec::with_capacity(pieces);
        let mut layout = None;

        for (index, piece) in models.into_iter().enumerate() {
            let data = PieceData::from_model(piece, self.options.strict, self.options.reduction)?;

            let path = dir.join(format!("{}_{}_{}.vtu", model.part(), index, frame));
            let mut file = BufWriter::new(fs::File::create(&path)?);
            write_vtk::write_piece(&mut file, &data, &self.encoding, self.options.header_type)?;
            file.flush()?;

            log::debug!(
                "wrote piece {index} of part `{}` ({} points, {} cells) to {}",
                model.part(),
                data.num_points(),
                data.num_cells(),
                path.display()
            );

            files.push(path);
            layout.get_or_insert(data);
        }

        let index = match layout {
            Some(layout) if pieces > 1 => {
                let sources: Vec<String> = files
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .collect();

                let path = dir.join(format!("{}_{}.pvtu", model.part(), frame));
                let mut file = BufWriter::new(fs::File::create(&path)?);
                write_vtk::write_parallel_index(&mut file, &layout, &sources, self.options.header_type)?;
                file.flush()?;

                Some(path)
            }
            _ => None,
        };

        self.frames.insert(key, frame + 1);

        Ok(WriteOutput {
            part: model.part().to_string(),
            time: model.time(),
            frame,
            pieces: files,
            index,
        })
    }
}

/// Remove everything below `dir`, keeping `dir` itself
///
/// Refuses to touch the current working directory. A missing directory is
/// left alone.
fn clear_dir(dir: &Path) -> Result<(), Error> {
    if !dir.exists() {
        return Ok(());
    }

    let target = dir.canonicalize()?;
    if target == std::env::current_dir()?.canonicalize()? {
        return Err(UsageError::ClearWorkingDirectory(target).into());
    }

    log::info!("clearing output directory {}", target.display());

    for entry in fs::read_dir(&target)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}
