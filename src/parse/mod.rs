//! Reading VTK xml files back in
//!
//! The readers understand the files this crate writes: unstructured grid
//! pieces in all three encodings, `.pvtu` index files, and `.pvd` collection
//! manifests. The appended section is walked block by block, and a block that
//! does not start where the previous one ended is an error rather than a
//! silent misread.

mod error;
mod event_summary;

pub use error::{AppendedData, ParseError};
use event_summary::EventSummary;

use crate::utils;
use crate::write_vtk::HeaderType;
use crate::Error;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

/// One named array of a piece, widened to `f64`
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArray {
    pub name: String,
    pub components: usize,
    pub values: Vec<f64>,
}

impl ParsedArray {
    pub fn num_tuples(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }

    /// values of tuple `index`, `None` past the last tuple
    pub fn get_tuple(&self, index: usize) -> Option<&[f64]> {
        if index >= self.num_tuples() {
            return None;
        }
        self.values.get(index * self.components..(index + 1) * self.components)
    }

    /// values of tuple `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`num_tuples`](Self::num_tuples).
    pub fn tuple(&self, index: usize) -> &[f64] {
        match self.get_tuple(index) {
            Some(tuple) => tuple,
            None => panic!(
                "tuple {index} out of range for `{}` with {} tuples",
                self.name,
                self.num_tuples()
            ),
        }
    }
}

/// Layout of the appended section of a binary piece
#[derive(Debug, Clone, PartialEq)]
pub struct AppendedSummary {
    pub header_type: HeaderType,
    /// payload length of every block, in file order
    pub block_lengths: Vec<u64>,
    /// bytes after the `_` marker, length prefixes included
    pub len: u64,
}

/// Contents of a `.vtu` file
#[derive(Debug, Clone, PartialEq)]
pub struct UnstructuredPiece {
    pub header_type: HeaderType,
    pub time: Option<f64>,
    pub num_points: usize,
    pub num_cells: usize,
    pub points: Vec<[f64; 3]>,
    pub connectivity: Vec<i64>,
    pub offsets: Vec<i64>,
    pub types: Vec<u8>,
    pub point_data: Vec<ParsedArray>,
    pub cell_data: Vec<ParsedArray>,
    pub appended: Option<AppendedSummary>,
}

impl UnstructuredPiece {
    pub fn point_array(&self, name: &str) -> Option<&ParsedArray> {
        self.point_data.iter().find(|a| a.name == name)
    }

    pub fn cell_array(&self, name: &str) -> Option<&ParsedArray> {
        self.cell_data.iter().find(|a| a.name == name)
    }

    /// zero based point indices of cell `index`
    ///
    /// `None` past the last cell, or when the offsets of the file do not
    /// delimit a range of the connectivity.
    pub fn get_cell(&self, index: usize) -> Option<&[i64]> {
        let end = usize::try_from(*self.offsets.get(index)?).ok()?;
        let start = match index {
            0 => 0,
            _ => usize::try_from(*self.offsets.get(index - 1)?).ok()?,
        };
        self.connectivity.get(start..end)
    }

    /// zero based point indices of cell `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below `offsets.len()`, or if the offsets do not
    /// delimit a range of the connectivity. [`get_cell`](Self::get_cell) does
    /// not panic.
    pub fn cell(&self, index: usize) -> &[i64] {
        match self.get_cell(index) {
            Some(cell) => cell,
            None => panic!(
                "cell {index} out of range, the piece has {} cells",
                self.offsets.len()
            ),
        }
    }
}

/// One `DataSet` line of a collection file
#[derive(Debug, Clone, PartialEq)]
pub struct DataSetEntry {
    pub timestep: f64,
    pub group: String,
    pub part: usize,
    pub file: String,
}

/// Contents of a `.pvtu` file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParallelIndex {
    pub point_arrays: Vec<String>,
    pub cell_arrays: Vec<String>,
    pub sources: Vec<String>,
}

/// Numeric types accepted in the `type` attribute of a `DataArray`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarType {
    Float64,
    Float32,
    Int64,
    Int32,
    Int8,
    UInt64,
    UInt32,
    UInt8,
}

impl ScalarType {
    fn from_attribute(value: &[u8]) -> Option<Self> {
        let scalar = match value {
            b"Float64" => Self::Float64,
            b"Float32" => Self::Float32,
            b"Int64" => Self::Int64,
            b"Int32" => Self::Int32,
            b"Int8" => Self::Int8,
            b"UInt64" => Self::UInt64,
            b"UInt32" => Self::UInt32,
            b"UInt8" => Self::UInt8,
            _ => return None,
        };
        Some(scalar)
    }

    pub(crate) fn size(&self) -> usize {
        match self {
            Self::Float64 | Self::Int64 | Self::UInt64 => 8,
            Self::Float32 | Self::Int32 | Self::UInt32 => 4,
            Self::Int8 | Self::UInt8 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    FieldData,
    Points,
    Cells,
    PointData,
    CellData,
}

#[derive(Debug)]
enum Format {
    Ascii,
    Base64,
    Appended(u64),
}

/// a `DataArray` whose values may not have been read yet
#[derive(Debug)]
struct PendingArray {
    section: Section,
    name: String,
    components: usize,
    scalar: ScalarType,
    format: Format,
    values: Option<Vec<f64>>,
}

/// read in and parse a `.vtu` file at `path`
pub fn read_vtu<P: AsRef<Path>>(path: P) -> Result<UnstructuredPiece, Error> {
    let bytes = std::fs::read(path)?;
    Ok(parse_vtu(&bytes)?)
}

/// read in and parse a `.pvd` file at `path`
pub fn read_pvd<P: AsRef<Path>>(path: P) -> Result<Vec<DataSetEntry>, Error> {
    let bytes = std::fs::read(path)?;
    Ok(parse_pvd(&bytes)?)
}

/// read in and parse a `.pvtu` file at `path`
pub fn read_pvtu<P: AsRef<Path>>(path: P) -> Result<ParallelIndex, Error> {
    let bytes = std::fs::read(path)?;
    Ok(parse_pvtu(&bytes)?)
}

/// Parse the contents of a `.vtu` file
pub fn parse_vtu(bytes: &[u8]) -> Result<UnstructuredPiece, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buffer = Vec::new();

    let header_type = read_to_file_header(&mut reader, &mut buffer, "UnstructuredGrid")?;

    let mut section = Section::Other;
    let mut counts = None;
    let mut arrays: Vec<PendingArray> = Vec::new();
    let mut open: Option<PendingArray> = None;
    let mut appended_start = None;

    loop {
        buffer.clear();
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(error::MalformedXml::from)?;

        match &event {
            Event::Start(start) | Event::Empty(start) => {
                let is_empty = matches!(event, Event::Empty(_));

                match start.name().as_ref() {
                    b"FieldData" => section = Section::FieldData,
                    b"Points" => section = Section::Points,
                    b"Cells" => section = Section::Cells,
                    b"PointData" => section = Section::PointData,
                    b"CellData" => section = Section::CellData,
                    b"Piece" => {
                        let points: usize = parse_number(
                            &attribute_string(start, "NumberOfPoints", "Piece")?,
                            "NumberOfPoints",
                        )?;
                        let cells: usize = parse_number(
                            &attribute_string(start, "NumberOfCells", "Piece")?,
                            "NumberOfCells",
                        )?;
                        counts = Some((points, cells));
                    }
                    b"DataArray" => {
                        let array = read_dataarray_header(start, section)?;
                        if is_empty {
                            arrays.push(array);
                        } else {
                            open = Some(array);
                        }
                    }
                    b"AppendedData" => {
                        let encoding = get_attribute_value(start, "encoding", "AppendedData")?;
                        check_attribute_value(encoding, "AppendedData", "encoding", "raw")?;
                        // the raw bytes are not xml, the reader must not see them
                        appended_start = Some(reader.buffer_position());
                        break;
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let Some(array) = open.as_mut() {
                    let text = text.unescape().map_err(error::MalformedXml::from)?;
                    array.values = decode_inline(array, &text, header_type)?;
                }
            }
            Event::End(end) => match end.name().as_ref() {
                b"DataArray" => arrays.extend(open.take()),
                b"FieldData" | b"Points" | b"Cells" | b"PointData" | b"CellData" => {
                    section = Section::Other
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let appended = match appended_start {
        Some(start) => Some(read_appended(&bytes[start..], header_type, &mut arrays)?),
        None => {
            let orphan = arrays
                .iter()
                .find(|a| matches!(a.format, Format::Appended(_)));
            if let Some(array) = orphan {
                return Err(AppendedData::MissingSection(array.name.clone()).into());
            }
            None
        }
    };

    let (num_points, num_cells) = counts
        .ok_or_else(|| error::UnexpectedElement::new("Piece", EventSummary::eof()))?;

    let mut piece = UnstructuredPiece {
        header_type,
        time: None,
        num_points,
        num_cells,
        points: Vec::new(),
        connectivity: Vec::new(),
        offsets: Vec::new(),
        types: Vec::new(),
        point_data: Vec::new(),
        cell_data: Vec::new(),
        appended,
    };

    let mut seen_points = false;
    let mut seen_offsets = false;
    let mut seen_types = false;

    for array in arrays {
        let PendingArray {
            section,
            name,
            components,
            values,
            ..
        } = array;
        let values = values.unwrap_or_default();

        match section {
            Section::FieldData => {
                if name == "TimeValue" {
                    piece.time = values.first().copied();
                }
            }
            Section::Points => {
                expect_length(&name, values.len(), 3 * num_points)?;
                piece.points = values
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2]])
                    .collect();
                seen_points = true;
            }
            Section::Cells => match name.as_str() {
                "connectivity" => piece.connectivity = values.iter().map(|v| *v as i64).collect(),
                "offsets" => {
                    expect_length(&name, values.len(), num_cells)?;
                    piece.offsets = values.iter().map(|v| *v as i64).collect();
                    seen_offsets = true;
                }
                "types" => {
                    expect_length(&name, values.len(), num_cells)?;
                    piece.types = values.iter().map(|v| *v as u8).collect();
                    seen_types = true;
                }
                _ => {}
            },
            Section::PointData => {
                expect_length(&name, values.len(), components * num_points)?;
                piece.point_data.push(ParsedArray {
                    name,
                    components,
                    values,
                });
            }
            Section::CellData => {
                expect_length(&name, values.len(), components * num_cells)?;
                piece.cell_data.push(ParsedArray {
                    name,
                    components,
                    values,
                });
            }
            Section::Other => {}
        }
    }

    for (seen, name) in [
        (seen_points, "Points"),
        (seen_offsets, "offsets"),
        (seen_types, "types"),
    ] {
        if !seen {
            return Err(error::MissingArray::new(name.into()).into());
        }
    }

    let expected_connectivity = piece.offsets.last().map_or(0, |last| *last as usize);
    expect_length(
        "connectivity",
        piece.connectivity.len(),
        expected_connectivity,
    )?;

    Ok(piece)
}

/// Parse the contents of a `.pvd` file
pub fn parse_pvd(bytes: &[u8]) -> Result<Vec<DataSetEntry>, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buffer = Vec::new();

    read_to_file_header(&mut reader, &mut buffer, "Collection")?;

    let mut entries = Vec::new();

    loop {
        buffer.clear();
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(error::MalformedXml::from)?;

        match event {
            Event::Start(start) | Event::Empty(start) if start.name() == QName(b"DataSet") => {
                let timestep = parse_number(
                    &attribute_string(&start, "timestep", "DataSet")?,
                    "timestep",
                )?;
                let file = attribute_string(&start, "file", "DataSet")?;
                let group = optional_attribute(&start, "group")?.unwrap_or_default();
                let part = match optional_attribute(&start, "part")? {
                    Some(part) => parse_number(&part, "part")?,
                    None => 0,
                };

                entries.push(DataSetEntry {
                    timestep,
                    group,
                    part,
                    file,
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Parse the contents of a `.pvtu` file
pub fn parse_pvtu(bytes: &[u8]) -> Result<ParallelIndex, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);
    let mut buffer = Vec::new();

    read_to_file_header(&mut reader, &mut buffer, "PUnstructuredGrid")?;

    let mut index = ParallelIndex::default();
    let mut section = Section::Other;

    loop {
        buffer.clear();
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(error::MalformedXml::from)?;

        match &event {
            Event::Start(start) | Event::Empty(start) => match start.name().as_ref() {
                b"PPointData" => section = Section::PointData,
                b"PCellData" => section = Section::CellData,
                b"PDataArray" => {
                    let name = attribute_string(start, "Name", "PDataArray")?;
                    match section {
                        Section::PointData => index.point_arrays.push(name),
                        Section::CellData => index.cell_arrays.push(name),
                        _ => {}
                    }
                }
                b"Piece" => index
                    .sources
                    .push(attribute_string(start, "Source", "Piece")?),
                _ => {}
            },
            Event::End(end) => {
                if matches!(end.name().as_ref(), b"PPointData" | b"PCellData") {
                    section = Section::Other;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(index)
}

/// Read up to and including the leading `VTKFile` element, checking its type
/// and byte order. Returns the declared header type, `UInt32` if absent.
fn read_to_file_header<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
    file_type: &str,
) -> Result<HeaderType, ParseError> {
    loop {
        buffer.clear();
        let event = reader
            .read_event_into(buffer)
            .map_err(error::MalformedXml::from)?;

        match &event {
            Event::Start(start) => {
                if start.name() != QName(b"VTKFile") {
                    let actual_event = EventSummary::new(&event);
                    return Err(error::UnexpectedElement::new("VTKFile", actual_event).into());
                }

                let kind = get_attribute_value(start, "type", "VTKFile")?;
                check_attribute_value(kind, "VTKFile", "type", file_type)?;

                if let Some(order) = optional_raw_attribute(start, "byte_order")? {
                    check_attribute_value(order, "VTKFile", "byte_order", "LittleEndian")?;
                }

                let header_type = match optional_raw_attribute(start, "header_type")? {
                    None => HeaderType::UInt32,
                    Some(att) => match att.value.as_ref() {
                        b"UInt32" => HeaderType::UInt32,
                        b"UInt64" => HeaderType::UInt64,
                        other => {
                            return Err(error::UnexpectedAttributeValue::new(
                                "VTKFile".into(),
                                "header_type".into(),
                                "UInt32 or UInt64".into(),
                                error::ParsedNameOrBytes::new(other),
                            )
                            .into())
                        }
                    },
                };

                return Ok(header_type);
            }
            Event::Eof => {
                let element_mismatch = error::UnexpectedElement::new("VTKFile", EventSummary::eof());
                return Err(element_mismatch.into());
            }
            // declarations, comments, and whitespace ahead of the root element
            _ => continue,
        }
    }
}

fn read_dataarray_header(start: &BytesStart<'_>, section: Section) -> Result<PendingArray, ParseError> {
    let name = attribute_string(start, "Name", "DataArray")?;

    let components = match optional_attribute(start, "NumberOfComponents")? {
        Some(value) => parse_number(&value, "NumberOfComponents")?,
        None => 1,
    };

    let kind = get_attribute_value(start, "type", "DataArray")?;
    let scalar = match ScalarType::from_attribute(kind.value.as_ref()) {
        Some(scalar) => scalar,
        None => {
            return Err(error::UnexpectedAttributeValue::new(
                "DataArray".into(),
                "type".into(),
                "a numeric type".into(),
                error::ParsedNameOrBytes::new(kind.value.as_ref()),
            )
            .into())
        }
    };

    let format = get_attribute_value(start, "format", "DataArray")?;
    let format = match format.value.as_ref() {
        b"ascii" => Format::Ascii,
        b"binary" => Format::Base64,
        b"appended" => {
            let offset = attribute_string(start, "offset", "DataArray")?;
            Format::Appended(parse_number(&offset, "offset")?)
        }
        other => {
            return Err(error::UnexpectedAttributeValue::new(
                "DataArray".into(),
                "format".into(),
                "ascii, binary, or appended".into(),
                error::ParsedNameOrBytes::new(other),
            )
            .into())
        }
    };

    Ok(PendingArray {
        section,
        name,
        components,
        scalar,
        format,
        values: None,
    })
}

/// decode the text body of an inline array; appended arrays have no body
fn decode_inline(
    array: &PendingArray,
    text: &str,
    header_type: HeaderType,
) -> Result<Option<Vec<f64>>, ParseError> {
    match array.format {
        Format::Ascii => text
            .split_ascii_whitespace()
            .map(|token| parse_number(token, &array.name))
            .collect::<Result<Vec<f64>, _>>()
            .map(Some),
        Format::Base64 => {
            let raw = base64::decode(text.trim())
                .map_err(|e| error::InlineBinary::new(array.name.clone(), e.to_string()))?;

            let length = utils::read_length(header_type, &raw).ok_or_else(|| {
                error::InlineBinary::new(array.name.clone(), "missing length header".into())
            })?;
            let payload = &raw[header_type.size()..];

            if payload.len() as u64 != length {
                let reason = format!(
                    "header announces {length} bytes but {} follow",
                    payload.len()
                );
                return Err(error::InlineBinary::new(array.name.clone(), reason).into());
            }

            decode_binary(array, payload).map(Some)
        }
        Format::Appended(_) => Ok(None),
    }
}

fn decode_binary(array: &PendingArray, bytes: &[u8]) -> Result<Vec<f64>, ParseError> {
    let size = array.scalar.size();
    if bytes.len() % size != 0 {
        let reason = format!(
            "{} bytes is not a whole number of {size} byte values",
            bytes.len()
        );
        return Err(error::InlineBinary::new(array.name.clone(), reason).into());
    }

    Ok(utils::decode_le(array.scalar, bytes))
}

/// Walk the blocks of an appended section in offset order
///
/// `rest` starts right after the opening `AppendedData` element.
fn read_appended(
    rest: &[u8],
    header_type: HeaderType,
    arrays: &mut [PendingArray],
) -> Result<AppendedSummary, ParseError> {
    let marker = rest
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .filter(|&i| rest[i] == b'_')
        .ok_or(AppendedData::MissingMarker)?;
    let data = &rest[marker + 1..];

    let mut blocks: Vec<(u64, &mut PendingArray)> = arrays
        .iter_mut()
        .filter_map(|array| match array.format {
            Format::Appended(offset) => Some((offset, array)),
            _ => None,
        })
        .collect();
    blocks.sort_by_key(|(offset, _)| *offset);

    let mut cursor = 0usize;
    let mut block_lengths = Vec::with_capacity(blocks.len());

    for (declared, array) in blocks {
        if declared != cursor as u64 {
            return Err(AppendedData::OffsetMismatch {
                name: array.name.clone(),
                declared,
                actual: cursor as u64,
            }
            .into());
        }

        let length = utils::read_length(header_type, &data[cursor..])
            .ok_or_else(|| AppendedData::Truncated(array.name.clone()))?;

        let start = cursor + header_type.size();
        let end = usize::try_from(length)
            .ok()
            .and_then(|length| start.checked_add(length))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| AppendedData::Truncated(array.name.clone()))?;

        array.values = Some(decode_binary(array, &data[start..end])?);
        block_lengths.push(length);
        cursor = end;
    }

    let tail = &data[cursor..];
    let tail = &tail[tail
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(tail.len())..];
    if !tail.starts_with(b"</AppendedData>") {
        return Err(AppendedData::TrailingBytes.into());
    }

    Ok(AppendedSummary {
        header_type,
        block_lengths,
        len: cursor as u64,
    })
}

fn expect_length(name: &str, actual: usize, expected: usize) -> Result<(), ParseError> {
    if actual != expected {
        Err(error::ArrayLength::new(name.into(), expected, actual).into())
    } else {
        Ok(())
    }
}

fn parse_number<T: FromStr>(value: &str, context: &str) -> Result<T, ParseError> {
    value
        .trim()
        .parse()
        .map_err(|_| error::InvalidNumber::new(context.into(), value.into()).into())
}

/// find the `attribute_key` attribute on the `element_name` element
fn get_attribute_value<'a>(
    bytes_start: &'a BytesStart<'_>,
    attribute_key: &str,
    element_name: &str,
) -> Result<Attribute<'a>, ParseError> {
    match optional_raw_attribute(bytes_start, attribute_key)? {
        Some(att) => Ok(att),
        None => {
            let err = error::MissingAttribute::new(element_name.into(), attribute_key.into());
            Err(err.into())
        }
    }
}

fn optional_raw_attribute<'a>(
    bytes_start: &'a BytesStart<'_>,
    attribute_key: &str,
) -> Result<Option<Attribute<'a>>, ParseError> {
    for attribute in bytes_start.attributes() {
        let attribute = attribute.map_err(error::MalformedAttribute::from)?;
        if attribute.key.as_ref() == attribute_key.as_bytes() {
            return Ok(Some(attribute));
        }
    }
    Ok(None)
}

/// unescaped value of an attribute, if present
fn optional_attribute(
    bytes_start: &BytesStart<'_>,
    attribute_key: &str,
) -> Result<Option<String>, ParseError> {
    match optional_raw_attribute(bytes_start, attribute_key)? {
        Some(att) => {
            let value = att.unescape_value().map_err(error::MalformedXml::from)?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn attribute_string(
    bytes_start: &BytesStart<'_>,
    attribute_key: &str,
    element_name: &str,
) -> Result<String, ParseError> {
    optional_attribute(bytes_start, attribute_key)?.ok_or_else(|| {
        error::MissingAttribute::new(element_name.into(), attribute_key.into()).into()
    })
}

/// ensure that an attribute's value is what we expect it to be, otherwise return an error with
/// some location information
fn check_attribute_value(
    att: Attribute<'_>,
    element_name: &str,
    attribute_name: &str,
    expected_attribute_value: &str,
) -> Result<(), error::UnexpectedAttributeValue> {
    if att.value.as_ref() != expected_attribute_value.as_bytes() {
        let unexpected_value = error::UnexpectedAttributeValue {
            element_name: element_name.into(),
            attribute_name: attribute_name.into(),
            expected_value: expected_attribute_value.into(),
            actual_value: error::ParsedNameOrBytes::from(att.value),
        };

        Err(unexpected_value)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_PIECE: &str = r#"<?xml version="1.0"?>
<VTKFile type="UnstructuredGrid" version="1.0" byte_order="LittleEndian" header_type="UInt64">
  <UnstructuredGrid>
    <FieldData>
      <DataArray type="Float64" Name="TimeValue" NumberOfComponents="1" NumberOfTuples="1" format="ascii">0.5</DataArray>
    </FieldData>
    <Piece NumberOfPoints="2" NumberOfCells="1">
      <Points>
        <DataArray type="Float64" Name="Points" NumberOfComponents="3" NumberOfTuples="2" format="ascii">0.0 0.0 0.0
1.0 0.0 0.0</DataArray>
      </Points>
      <Cells>
        <DataArray type="Int64" Name="connectivity" NumberOfComponents="1" NumberOfTuples="2" format="ascii">0
1</DataArray>
        <DataArray type="Int64" Name="offsets" NumberOfComponents="1" NumberOfTuples="1" format="ascii">2</DataArray>
        <DataArray type="UInt8" Name="types" NumberOfComponents="1" NumberOfTuples="1" format="ascii">3</DataArray>
      </Cells>
      <PointData>
        <DataArray type="Float64" Name="U" NumberOfComponents="1" NumberOfTuples="2" format="ascii">0.0
NaN</DataArray>
      </PointData>
      <CellData>
      </CellData>
    </Piece>
  </UnstructuredGrid>
</VTKFile>
"#;

    #[test]
    fn lookups_past_the_end() {
        let piece = parse_vtu(ASCII_PIECE.as_bytes()).unwrap();
        assert_eq!(piece.get_cell(0), Some(&[0, 1][..]));
        assert_eq!(piece.get_cell(1), None);

        let u = piece.point_array("U").unwrap();
        assert_eq!(u.get_tuple(0), Some(&[0.0][..]));
        assert!(u.get_tuple(1).unwrap()[0].is_nan());
        assert_eq!(u.get_tuple(2), None);

        let mut broken = piece.clone();
        broken.offsets = vec![3];
        assert_eq!(broken.get_cell(0), None);
    }

    #[test]
    #[should_panic(expected = "cell 1 out of range")]
    fn cell_past_the_end_panics() {
        let piece = parse_vtu(ASCII_PIECE.as_bytes()).unwrap();
        piece.cell(1);
    }

    #[test]
    fn inline_ascii_piece() {
        let piece = parse_vtu(ASCII_PIECE.as_bytes()).unwrap();

        assert_eq!(piece.time, Some(0.5));
        assert_eq!(piece.points, [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(piece.cell(0), [0, 1]);
        assert_eq!(piece.types, [3]);
        assert!(piece.appended.is_none());

        let u = piece.point_array("U").unwrap();
        assert_eq!(u.tuple(0), [0.0]);
        assert!(u.tuple(1)[0].is_nan());
    }

    #[test]
    fn wrong_file_type_is_reported() {
        let text = ASCII_PIECE.replace(r#"type="UnstructuredGrid""#, r#"type="RectilinearGrid""#);
        let err = parse_vtu(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedAttributeValue(_)));
    }

    #[test]
    fn short_arrays_are_reported() {
        let text = ASCII_PIECE.replace("0.0\nNaN", "0.0");
        let err = parse_vtu(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::ArrayLength(_)));
    }

    #[test]
    fn collection_entries() {
        let text = r#"<?xml version="1.0"?>
<VTKFile type="Collection" version="1.0" byte_order="LittleEndian">
  <Collection>
    <DataSet timestep="0.5" group="P" part="0" file="m/ascii/P_0_0.vtu"/>
    <DataSet timestep="1" file="m/ascii/P_0_1.vtu"/>
  </Collection>
</VTKFile>
"#;
        let entries = parse_pvd(text.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].group, "P");
        assert_eq!(entries[1].timestep, 1.0);
        assert_eq!(entries[1].part, 0);
    }
}
