//! # Traits
//!
//! The two seams of the pipeline: how array values are encoded into a piece
//! file, and where models come from.

use crate::array::DataArray;
use crate::model::Model;
use crate::source::Models;
use crate::write_vtk::AppendedSection;
use crate::Error;

use quick_xml::Writer;
use std::io::Write;

/// Encoding strategy for the arrays of a piece file
///
/// The serialization engine walks the geometry and data blocks of a piece and
/// hands every array to the strategy. Inline encodings write the values into
/// the `DataArray` element itself. The appended encoding registers the values
/// with the [`AppendedSection`] and writes only the header with its offset:
///
/// ```ignore
/// <DataArray type="Float64" Name="U" NumberOfComponents="3" NumberOfTuples="2" format="appended" offset="0"/>
/// ...
/// <AppendedData encoding="raw">
///    _<8 byte length><48 bytes of values>...
/// </AppendedData>
/// ```
pub trait Encode {
    /// name of the output subdirectory for files in this encoding
    fn directory(&self) -> &'static str;

    /// write a single `DataArray` element for `array`
    fn write_array<W: Write>(
        &self,
        writer: &mut Writer<W>,
        array: &DataArray,
        section: &mut AppendedSection,
    ) -> Result<(), Error>;
}

/// Producer of models, one per part per result increment
///
/// Sources are pulled once, front to back. A source that has returned
/// `Ok(None)` is exhausted and is not asked again; there is no way to rewind.
pub trait ModelSource {
    fn next_model(&mut self) -> Result<Option<Model>, Error>;

    /// adapt the source into a fused iterator
    fn models(self) -> Models<Self>
    where
        Self: Sized,
    {
        Models::new(self)
    }
}
