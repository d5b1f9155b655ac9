#![doc = include_str!("../README.md")]

pub mod array;
pub mod collection;
mod data;
pub mod element;
pub mod model;
pub mod parse;
pub mod prelude;
pub mod source;
mod traits;
mod utils;
mod write_vtk;
pub mod writer;

pub use traits::{Encode, ModelSource};

pub use collection::{with_collection, CollectionEntry, CollectionWriter};
pub use element::{CellType, ElementMapping, UnsupportedElement};
pub use model::{
    Field, FieldKind, Group, Id, Layout, Model, ModelBuilder, NotFound, Placement, Reduction,
    Surface, ValidationError,
};
pub use source::{export, export_collection, ExportRequest};
pub use write_vtk::{AppendedSection, HeaderType, SerializationError};
pub use writer::{VtkWriter, WriteOutput, WriterOptions};

pub use parse::{read_pvd, read_pvtu, read_vtu};

pub use quick_xml::writer::Writer;

/// Fill value written wherever a field has no value for a node or element.
///
/// Output arrays must cover every point and cell, so a field defined on only
/// some ids is padded with `NaN`. A solver value that is itself `NaN` cannot
/// be told apart from a filled gap once written.
pub const SENTINEL: f64 = f64::NAN;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid model: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    UnsupportedElement(#[from] UnsupportedElement),
    #[error("Could not serialize piece: {0}")]
    Serialization(#[from] SerializationError),
    #[error("{0}")]
    Usage(#[from] UsageError),
    #[error("{0}")]
    NotFound(#[from] NotFound),
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("Error while parsing VTK xml: {0}")]
    Parse(#[from] parse::ParseError),
}

/// misuse of a writer or a model operation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum UsageError {
    #[error("a model must be split into at least one piece")]
    ZeroPieces,
    #[error("manifest `{0}` was already written and closed")]
    ManifestClosed(std::path::PathBuf),
    #[error("manifest `{0}` is already held by another collection writer")]
    ManifestInUse(std::path::PathBuf),
    #[error("part `{part}` was written with {previous} pieces, cannot add {requested}")]
    PieceCountChanged {
        part: String,
        previous: usize,
        requested: usize,
    },
    #[error("refusing to clear `{0}`, it is the current working directory")]
    ClearWorkingDirectory(std::path::PathBuf),
}

/// Inline text encoding: whitespace separated decimal values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ascii;

/// Inline base64 encoding of the little endian bytes of each array
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Base64;

/// Raw little endian bytes in a single appended data section
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Binary;

impl traits::Encode for Ascii {
    fn directory(&self) -> &'static str {
        "ascii"
    }

    fn write_array<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        array: &array::DataArray,
        _section: &mut AppendedSection,
    ) -> Result<(), Error> {
        write_vtk::write_inline_dataarray(writer, array, write_vtk::Encoding::Ascii, &array.to_ascii())
    }
}

impl traits::Encode for Base64 {
    fn directory(&self) -> &'static str {
        "base64"
    }

    fn write_array<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        array: &array::DataArray,
        section: &mut AppendedSection,
    ) -> Result<(), Error> {
        let encoded = array.to_base64(section.header_type())?;
        write_vtk::write_inline_dataarray(writer, array, write_vtk::Encoding::Base64, &encoded)
    }
}

impl traits::Encode for Binary {
    fn directory(&self) -> &'static str {
        "binary"
    }

    fn write_array<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        array: &array::DataArray,
        section: &mut AppendedSection,
    ) -> Result<(), Error> {
        let offset = section.push(array)?;
        write_vtk::write_appended_dataarray_header(writer, array, offset)
    }
}
