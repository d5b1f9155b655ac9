//! Serialization engine for piece, index, and collection files
//!
//! Element and attribute emission goes through a `quick_xml::Writer`; the raw
//! appended section is written straight to the inner writer since it is not
//! valid XML text.

use crate::array::DataArray;
use crate::data::PieceData;
use crate::traits::Encode;
use crate::Error;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use std::io::Write;

/// Width of the length prefix in front of every binary block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeaderType {
    UInt32,
    #[default]
    UInt64,
}

impl HeaderType {
    /// number of bytes in the prefix
    pub fn size(&self) -> usize {
        match self {
            Self::UInt32 => 4,
            Self::UInt64 => 8,
        }
    }

    /// value of the `header_type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
        }
    }

    /// append the prefix for a block of `length` bytes
    pub(crate) fn extend_length(
        &self,
        name: &str,
        length: usize,
        bytes: &mut Vec<u8>,
    ) -> Result<(), SerializationError> {
        match self {
            Self::UInt32 => {
                let length = u32::try_from(length).map_err(|_| SerializationError::BlockTooLarge {
                    name: name.into(),
                    bytes: length as u64,
                })?;
                bytes.extend_from_slice(&length.to_le_bytes());
            }
            Self::UInt64 => bytes.extend_from_slice(&(length as u64).to_le_bytes()),
        }
        Ok(())
    }
}

/// Inconsistent binary layout caught before it reaches disk
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SerializationError {
    #[error("array `{name}` declares {declared} bytes but encodes to {encoded}")]
    LengthMismatch {
        name: String,
        declared: u64,
        encoded: u64,
    },
    #[error("array `{name}` was announced at offset {declared} but starts at {actual}")]
    OffsetMismatch {
        name: String,
        declared: u64,
        actual: u64,
    },
    #[error("array `{name}` has {bytes} bytes, too many for a UInt32 length header")]
    BlockTooLarge { name: String, bytes: u64 },
}

#[derive(Debug)]
struct Block {
    name: String,
    offset: u64,
    declared: u64,
    bytes: Vec<u8>,
}

/// Blocks destined for the `<AppendedData>` section of one file
///
/// Offsets handed out by [`push`](Self::push) are the byte positions of each
/// block's length prefix, counted from the byte after the leading `_`.
#[derive(Debug)]
pub struct AppendedSection {
    header: HeaderType,
    blocks: Vec<Block>,
    next_offset: u64,
}

impl AppendedSection {
    pub fn new(header: HeaderType) -> Self {
        Self {
            header,
            blocks: Vec::new(),
            next_offset: 0,
        }
    }

    pub fn header_type(&self) -> HeaderType {
        self.header
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// total number of bytes the section will hold after the `_` marker
    pub fn len(&self) -> u64 {
        self.next_offset
    }

    /// queue the values of `array` and return the offset of its block
    pub fn push(&mut self, array: &DataArray) -> Result<u64, SerializationError> {
        let declared = array.byte_len() as u64;
        if self.header == HeaderType::UInt32 && declared > u64::from(u32::MAX) {
            return Err(SerializationError::BlockTooLarge {
                name: array.name.clone(),
                bytes: declared,
            });
        }

        let offset = self.next_offset;
        self.blocks.push(Block {
            name: array.name.clone(),
            offset,
            declared,
            bytes: array.to_le_bytes(),
        });
        self.next_offset += (self.header.size() as u64) + declared;

        Ok(offset)
    }

    /// Write every block, checking that each one lands at its announced
    /// offset and encodes to its announced length. Returns the number of
    /// bytes written.
    pub fn write_blocks<W: Write>(&self, out: &mut W) -> Result<u64, Error> {
        let mut position = 0u64;
        let mut prefix = Vec::with_capacity(self.header.size());

        for block in &self.blocks {
            if block.offset != position {
                return Err(SerializationError::OffsetMismatch {
                    name: block.name.clone(),
                    declared: block.offset,
                    actual: position,
                }
                .into());
            }

            let encoded = block.bytes.len() as u64;
            if encoded != block.declared {
                return Err(SerializationError::LengthMismatch {
                    name: block.name.clone(),
                    declared: block.declared,
                    encoded,
                }
                .into());
            }

            prefix.clear();
            self.header
                .extend_length(&block.name, block.bytes.len(), &mut prefix)?;
            out.write_all(&prefix)?;
            out.write_all(&block.bytes)?;

            position += (prefix.len() as u64) + encoded;
        }

        Ok(position)
    }
}

/// the encoding to use when writing an inline dataarray
pub(crate) enum Encoding {
    Ascii,
    Base64,
}

impl Encoding {
    fn to_str(&self) -> &'static str {
        match &self {
            Self::Ascii => "ascii",
            Self::Base64 => "binary",
        }
    }
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str, attributes: &[(&str, &str)]) -> Result<(), Error> {
    let mut element = BytesStart::new(name);
    for attribute in attributes {
        element.push_attribute(*attribute);
    }
    writer.write_event(Event::Start(element))?;
    Ok(())
}

fn empty<W: Write>(writer: &mut Writer<W>, name: &str, attributes: &[(&str, &str)]) -> Result<(), Error> {
    let mut element = BytesStart::new(name);
    for attribute in attributes {
        element.push_attribute(*attribute);
    }
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), Error> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn declaration<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
    Ok(())
}

/// write a single inline array: header, encoded body, closing element
pub(crate) fn write_inline_dataarray<W: Write>(
    writer: &mut Writer<W>,
    array: &DataArray,
    format: Encoding,
    body: &str,
) -> Result<(), Error> {
    let components = array.components.to_string();
    let tuples = array.num_tuples().to_string();

    start(
        writer,
        "DataArray",
        &[
            ("type", array.type_name()),
            ("Name", &array.name),
            ("NumberOfComponents", &components),
            ("NumberOfTuples", &tuples),
            ("format", format.to_str()),
        ],
    )?;

    // numbers and base64 never contain characters that need escaping
    writer.write_event(Event::Text(BytesText::from_escaped(body)))?;

    end(writer, "DataArray")
}

/// write the header for an appended data array whose values are written later in the
/// appended section of the file
pub(crate) fn write_appended_dataarray_header<W: Write>(
    writer: &mut Writer<W>,
    array: &DataArray,
    offset: u64,
) -> Result<(), Error> {
    let components = array.components.to_string();
    let tuples = array.num_tuples().to_string();
    let offset = offset.to_string();

    empty(
        writer,
        "DataArray",
        &[
            ("type", array.type_name()),
            ("Name", &array.name),
            ("NumberOfComponents", &components),
            ("NumberOfTuples", &tuples),
            ("format", "appended"),
            ("offset", &offset),
        ],
    )
}

pub(crate) fn appended_binary_header_start<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    let inner = writer.inner();
    inner.write_all(b"\n  <AppendedData encoding=\"raw\">\n    _")?;
    Ok(())
}

pub(crate) fn appended_binary_header_end<W: Write>(writer: &mut Writer<W>) -> Result<(), Error> {
    let inner = writer.inner();
    inner.write_all(b"\n  </AppendedData>")?;
    Ok(())
}

/// Write one `.vtu` piece file
pub(crate) fn write_piece<W: Write, E: Encode>(
    out: W,
    piece: &PieceData,
    encoding: &E,
    header: HeaderType,
) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    let mut section = AppendedSection::new(header);

    declaration(&mut writer)?;
    start(
        &mut writer,
        "VTKFile",
        &[
            ("type", "UnstructuredGrid"),
            ("version", "1.0"),
            ("byte_order", "LittleEndian"),
            ("header_type", header.as_str()),
        ],
    )?;
    start(&mut writer, "UnstructuredGrid", &[])?;

    start(&mut writer, "FieldData", &[])?;
    encoding.write_array(&mut writer, &piece.time_value(), &mut section)?;
    end(&mut writer, "FieldData")?;

    let num_points = piece.num_points().to_string();
    let num_cells = piece.num_cells().to_string();
    start(
        &mut writer,
        "Piece",
        &[("NumberOfPoints", &num_points), ("NumberOfCells", &num_cells)],
    )?;

    start(&mut writer, "Points", &[])?;
    encoding.write_array(&mut writer, &piece.points, &mut section)?;
    end(&mut writer, "Points")?;

    start(&mut writer, "Cells", &[])?;
    for array in [&piece.connectivity, &piece.offsets, &piece.types] {
        encoding.write_array(&mut writer, array, &mut section)?;
    }
    end(&mut writer, "Cells")?;

    start(&mut writer, "PointData", &[])?;
    for array in &piece.point_data {
        encoding.write_array(&mut writer, array, &mut section)?;
    }
    end(&mut writer, "PointData")?;

    start(&mut writer, "CellData", &[])?;
    for array in &piece.cell_data {
        encoding.write_array(&mut writer, array, &mut section)?;
    }
    end(&mut writer, "CellData")?;

    end(&mut writer, "Piece")?;
    end(&mut writer, "UnstructuredGrid")?;

    if !section.is_empty() {
        appended_binary_header_start(&mut writer)?;
        let written = section.write_blocks(writer.inner())?;
        debug_assert_eq!(written, section.len());
        appended_binary_header_end(&mut writer)?;
    }

    end(&mut writer, "VTKFile")?;
    writer.inner().write_all(b"\n")?;

    Ok(())
}

fn write_array_declaration<W: Write>(writer: &mut Writer<W>, array: &DataArray) -> Result<(), Error> {
    let components = array.components.to_string();
    empty(
        writer,
        "PDataArray",
        &[
            ("type", array.type_name()),
            ("Name", &array.name),
            ("NumberOfComponents", &components),
        ],
    )
}

/// Write a `.pvtu` file tying `sources` together
///
/// `layout` is any one of the pieces; all pieces of a model carry the same arrays.
pub(crate) fn write_parallel_index<W: Write>(
    out: W,
    layout: &PieceData,
    sources: &[String],
    header: HeaderType,
) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    declaration(&mut writer)?;
    start(
        &mut writer,
        "VTKFile",
        &[
            ("type", "PUnstructuredGrid"),
            ("version", "1.0"),
            ("byte_order", "LittleEndian"),
            ("header_type", header.as_str()),
        ],
    )?;
    start(&mut writer, "PUnstructuredGrid", &[("GhostLevel", "0")])?;

    start(&mut writer, "PPoints", &[])?;
    write_array_declaration(&mut writer, &layout.points)?;
    end(&mut writer, "PPoints")?;

    start(&mut writer, "PCells", &[])?;
    for array in [&layout.connectivity, &layout.offsets, &layout.types] {
        write_array_declaration(&mut writer, array)?;
    }
    end(&mut writer, "PCells")?;

    start(&mut writer, "PPointData", &[])?;
    for array in &layout.point_data {
        write_array_declaration(&mut writer, array)?;
    }
    end(&mut writer, "PPointData")?;

    start(&mut writer, "PCellData", &[])?;
    for array in &layout.cell_data {
        write_array_declaration(&mut writer, array)?;
    }
    end(&mut writer, "PCellData")?;

    for source in sources {
        empty(&mut writer, "Piece", &[("Source", source)])?;
    }

    end(&mut writer, "PUnstructuredGrid")?;
    end(&mut writer, "VTKFile")?;
    writer.inner().write_all(b"\n")?;

    Ok(())
}

/// one `DataSet` line of a collection file
pub(crate) struct DataSetLine<'a> {
    pub(crate) timestep: f64,
    pub(crate) group: &'a str,
    pub(crate) part: usize,
    pub(crate) file: &'a str,
}

/// Write a `.pvd` collection file
pub(crate) fn write_collection<W: Write>(out: W, datasets: &[DataSetLine<'_>]) -> Result<(), Error> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    declaration(&mut writer)?;
    start(
        &mut writer,
        "VTKFile",
        &[
            ("type", "Collection"),
            ("version", "1.0"),
            ("byte_order", "LittleEndian"),
        ],
    )?;
    start(&mut writer, "Collection", &[])?;

    let mut timestep = ryu::Buffer::new();
    for dataset in datasets {
        let part = dataset.part.to_string();
        empty(
            &mut writer,
            "DataSet",
            &[
                ("timestep", timestep.format(dataset.timestep)),
                ("group", dataset.group),
                ("part", &part),
                ("file", dataset.file),
            ],
        )?;
    }

    end(&mut writer, "Collection")?;
    end(&mut writer, "VTKFile")?;
    writer.inner().write_all(b"\n")?;

    Ok(())
}
