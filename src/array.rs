//! Typed data blocks and their encodings
//!
//! Every array of a piece file, geometry included, is a [`DataArray`]: a
//! name, a component count, and a flat buffer of tuples. The buffer is kept
//! typed so that connectivity stays integral and indicator arrays stay one
//! byte wide.

use crate::write_vtk::{HeaderType, SerializationError};

use num_traits::{ToPrimitive, Zero};

use std::fmt::Write as _;

/// Element type of an array buffer
pub trait Numeric: Copy + Zero + ToPrimitive {
    /// value of the `type` attribute
    const TYPE_NAME: &'static str;
    /// width in bytes of one value
    const SIZE: usize;

    fn extend_le_bytes(self, bytes: &mut Vec<u8>);

    fn push_ascii(self, text: &mut String);
}

impl Numeric for f64 {
    const TYPE_NAME: &'static str = "Float64";
    const SIZE: usize = 8;

    fn extend_le_bytes(self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.to_le_bytes())
    }

    fn push_ascii(self, text: &mut String) {
        let mut buffer = ryu::Buffer::new();
        text.push_str(buffer.format(self));
    }
}

impl Numeric for i64 {
    const TYPE_NAME: &'static str = "Int64";
    const SIZE: usize = 8;

    fn extend_le_bytes(self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.to_le_bytes())
    }

    fn push_ascii(self, text: &mut String) {
        // writing into a String cannot fail
        let _ = write!(text, "{self}");
    }
}

impl Numeric for u8 {
    const TYPE_NAME: &'static str = "UInt8";
    const SIZE: usize = 1;

    fn extend_le_bytes(self, bytes: &mut Vec<u8>) {
        bytes.push(self)
    }

    fn push_ascii(self, text: &mut String) {
        let _ = write!(text, "{self}");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
}

macro_rules! dispatch {
    ($data:expr, $values:ident => $body:expr) => {
        match $data {
            ArrayData::Float64($values) => $body,
            ArrayData::Int64($values) => $body,
            ArrayData::UInt8($values) => $body,
        }
    };
}

/// One named array of tuples
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub name: String,
    pub components: usize,
    pub data: ArrayData,
}

impl DataArray {
    pub fn float64<T: Into<String>>(name: T, components: usize, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            components,
            data: ArrayData::Float64(values),
        }
    }

    pub fn int64<T: Into<String>>(name: T, components: usize, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            components,
            data: ArrayData::Int64(values),
        }
    }

    pub fn uint8<T: Into<String>>(name: T, components: usize, values: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            components,
            data: ArrayData::UInt8(values),
        }
    }

    /// value of the `type` attribute
    pub fn type_name(&self) -> &'static str {
        dispatch!(&self.data, values => type_name_of(values))
    }

    /// number of values (not tuples)
    pub fn len(&self) -> usize {
        dispatch!(&self.data, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_tuples(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.len() / self.components
        }
    }

    /// number of bytes the values occupy in binary form, without a length header
    pub fn byte_len(&self) -> usize {
        dispatch!(&self.data, values => values.len() * size_of(values))
    }

    /// little endian bytes of all values
    pub fn to_le_bytes(&self) -> Vec<u8> {
        dispatch!(&self.data, values => le_bytes(values))
    }

    /// whitespace separated decimal text, one tuple per line
    pub fn to_ascii(&self) -> String {
        dispatch!(&self.data, values => ascii(values, self.components))
    }

    /// base64 text of the length header followed by the little endian values
    pub fn to_base64(&self, header: HeaderType) -> Result<String, SerializationError> {
        let payload = self.to_le_bytes();
        let mut bytes = Vec::with_capacity(header.size() + payload.len());
        header.extend_length(&self.name, payload.len(), &mut bytes)?;
        bytes.extend_from_slice(&payload);
        Ok(base64::encode(bytes))
    }

    /// values widened to `f64`
    pub fn to_f64(&self) -> Vec<f64> {
        dispatch!(&self.data, values => values
            .iter()
            .map(|v| v.to_f64().unwrap_or(f64::NAN))
            .collect())
    }
}

fn type_name_of<T: Numeric>(_: &[T]) -> &'static str {
    T::TYPE_NAME
}

fn size_of<T: Numeric>(_: &[T]) -> usize {
    T::SIZE
}

fn le_bytes<T: Numeric>(values: &[T]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * T::SIZE);
    values
        .iter()
        .for_each(|value| value.extend_le_bytes(&mut bytes));
    bytes
}

fn ascii<T: Numeric>(values: &[T], components: usize) -> String {
    let mut text = String::with_capacity(values.len() * 8);

    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            let sep = if index % components.max(1) == 0 { '\n' } else { ' ' };
            text.push(sep);
        }
        value.push_ascii(&mut text);
    }

    text
}

/// an array of `tuples` rows filled with zeros
pub(crate) fn zeros<T: Numeric>(tuples: usize, components: usize) -> Vec<T> {
    vec![T::zero(); tuples * components]
}
